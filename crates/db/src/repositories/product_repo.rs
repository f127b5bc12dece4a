//! Repository for the catalog tables (`products`, `product_variants`).
//!
//! Thin CRUD only -- ledger mutations go through `StockRepo`.

use vitrine_core::types::DbId;

use crate::models::product::{
    CreateProduct, CreateVariant, Product, ProductListQuery, ProductVariant,
};
use crate::DbPool;

/// Column list for `products` queries.
const PRODUCT_COLUMNS: &str = "\
    id, name, slug, description, price_cents, \
    quantity, locked_quantity, is_available, sold_out_at, \
    created_at, updated_at";

/// Column list for `product_variants` queries.
const VARIANT_COLUMNS: &str = "\
    id, product_id, sku, name, price_cents, \
    quantity, locked_quantity, is_available, sold_out_at, \
    created_at, updated_at";

/// Maximum page size for product listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for product listing.
const DEFAULT_LIMIT: i64 = 50;

pub struct ProductRepo;

impl ProductRepo {
    /// Create a product with optional initial stock.
    pub async fn create(pool: &DbPool, input: &CreateProduct) -> Result<Product, sqlx::Error> {
        let query = format!(
            "INSERT INTO products (name, slug, description, price_cents, quantity) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {PRODUCT_COLUMNS}"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .bind(&input.description)
            .bind(input.price_cents)
            .bind(input.quantity.unwrap_or(0))
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &DbPool, id: DbId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List products, newest first, with pagination.
    pub async fn list(
        pool: &DbPool,
        params: &ProductListQuery,
    ) -> Result<Vec<Product>, sqlx::Error> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);

        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             ORDER BY created_at DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Product>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Create a variant under an existing product.
    pub async fn create_variant(
        pool: &DbPool,
        product_id: DbId,
        input: &CreateVariant,
    ) -> Result<ProductVariant, sqlx::Error> {
        let query = format!(
            "INSERT INTO product_variants (product_id, sku, name, price_cents, quantity) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {VARIANT_COLUMNS}"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(product_id)
            .bind(&input.sku)
            .bind(&input.name)
            .bind(input.price_cents)
            .bind(input.quantity.unwrap_or(0))
            .fetch_one(pool)
            .await
    }

    pub async fn find_variant_by_id(
        pool: &DbPool,
        id: DbId,
    ) -> Result<Option<ProductVariant>, sqlx::Error> {
        let query = format!("SELECT {VARIANT_COLUMNS} FROM product_variants WHERE id = $1");
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List a product's variants in creation order.
    pub async fn list_variants(
        pool: &DbPool,
        product_id: DbId,
    ) -> Result<Vec<ProductVariant>, sqlx::Error> {
        let query = format!(
            "SELECT {VARIANT_COLUMNS} FROM product_variants \
             WHERE product_id = $1 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, ProductVariant>(&query)
            .bind(product_id)
            .fetch_all(pool)
            .await
    }
}
