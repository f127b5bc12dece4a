//! Route definitions for the `/products` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::products;
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// ```text
/// GET  /                 -> list_products
/// POST /                 -> create_product (admin)
/// GET  /{id}             -> get_product
/// GET  /{id}/variants    -> list_variants
/// POST /{id}/variants    -> create_variant (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(products::list_products).post(products::create_product),
        )
        .route("/{id}", get(products::get_product))
        .route(
            "/{id}/variants",
            get(products::list_variants).post(products::create_variant),
        )
}
