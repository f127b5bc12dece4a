//! Catalog rows and DTOs. The ledger columns (`quantity`,
//! `locked_quantity`, `is_available`, `sold_out_at`) live directly on
//! these rows; mutations go through `StockRepo`, never plain updates.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use vitrine_core::inventory::StockState;
use vitrine_core::types::{DbId, Timestamp};

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub quantity: i32,
    pub locked_quantity: i32,
    pub is_available: bool,
    pub sold_out_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Product {
    pub fn stock_state(&self) -> StockState {
        StockState::derive(self.quantity, self.locked_quantity)
    }
}

/// A row from the `product_variants` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductVariant {
    pub id: DbId,
    pub product_id: DbId,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: i32,
    pub locked_quantity: i32,
    pub is_available: bool,
    pub sold_out_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProductVariant {
    pub fn stock_state(&self) -> StockState {
        StockState::derive(self.quantity, self.locked_quantity)
    }
}

/// DTO for `POST /api/v1/products`.
#[derive(Debug, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub price_cents: i64,
    /// Initial total stock. Defaults to 0.
    pub quantity: Option<i32>,
}

/// DTO for `POST /api/v1/products/{id}/variants`.
#[derive(Debug, Deserialize)]
pub struct CreateVariant {
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    pub quantity: Option<i32>,
}

/// Query parameters for `GET /api/v1/products`.
#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}
