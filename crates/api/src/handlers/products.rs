//! Handlers for the `/products` resource.
//!
//! Thin catalog CRUD: enough surface for stock units to exist and be
//! inspected. Ledger mutations never happen here.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use vitrine_core::error::CoreError;
use vitrine_core::inventory::StockState;
use vitrine_core::types::DbId;
use vitrine_db::models::product::{
    CreateProduct, CreateVariant, Product, ProductListQuery, ProductVariant,
};
use vitrine_db::repositories::ProductRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// A product with its derived stock snapshot.
#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub stock_state: StockState,
    /// Free (unreserved) stock.
    pub available: i32,
}

/// A variant with its derived stock snapshot.
#[derive(Debug, Serialize)]
pub struct VariantDetail {
    #[serde(flatten)]
    pub variant: ProductVariant,
    pub stock_state: StockState,
    pub available: i32,
}

/// POST /api/v1/products
pub async fn create_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(input): Json<CreateProduct>,
) -> AppResult<impl IntoResponse> {
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if input.slug.trim().is_empty() {
        return Err(AppError::BadRequest("slug must not be empty".into()));
    }
    if input.quantity.is_some_and(|q| q < 0) {
        return Err(AppError::BadRequest("quantity must not be negative".into()));
    }

    let product = ProductRepo::create(&state.pool, &input).await?;

    tracing::info!(
        product_id = product.id,
        slug = %product.slug,
        user_id = admin.user_id,
        "Product created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: product })))
}

/// GET /api/v1/products
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ProductListQuery>,
) -> AppResult<impl IntoResponse> {
    let products = ProductRepo::list(&state.pool, &params).await?;
    Ok(Json(DataResponse { data: products }))
}

/// GET /api/v1/products/{id}
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let product = ProductRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id,
        }))?;

    let stock_state = product.stock_state();
    let available = product.quantity - product.locked_quantity;
    Ok(Json(DataResponse {
        data: ProductDetail {
            product,
            stock_state,
            available,
        },
    }))
}

/// POST /api/v1/products/{id}/variants
pub async fn create_variant(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
    Json(input): Json<CreateVariant>,
) -> AppResult<impl IntoResponse> {
    if input.sku.trim().is_empty() {
        return Err(AppError::BadRequest("sku must not be empty".into()));
    }
    if input.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    if input.quantity.is_some_and(|q| q < 0) {
        return Err(AppError::BadRequest("quantity must not be negative".into()));
    }

    ProductRepo::find_by_id(&state.pool, product_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id: product_id,
        }))?;

    let variant = ProductRepo::create_variant(&state.pool, product_id, &input).await?;

    tracing::info!(
        variant_id = variant.id,
        product_id,
        sku = %variant.sku,
        user_id = admin.user_id,
        "Variant created"
    );

    Ok((StatusCode::CREATED, Json(DataResponse { data: variant })))
}

/// GET /api/v1/products/{id}/variants
pub async fn list_variants(
    State(state): State<AppState>,
    Path(product_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    ProductRepo::find_by_id(&state.pool, product_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Product",
            id: product_id,
        }))?;

    let variants = ProductRepo::list_variants(&state.pool, product_id).await?;
    let details: Vec<VariantDetail> = variants
        .into_iter()
        .map(|variant| {
            let stock_state = variant.stock_state();
            let available = variant.quantity - variant.locked_quantity;
            VariantDetail {
                variant,
                stock_state,
                available,
            }
        })
        .collect();

    Ok(Json(DataResponse { data: details }))
}
