//! Stock reservation rows.

use serde::Serialize;
use sqlx::FromRow;
use vitrine_core::inventory::StockUnitRef;
use vitrine_core::types::{DbId, Timestamp};

use super::status::StatusId;

/// A row from the `stock_reservations` table. Exactly one of
/// `product_id` / `variant_id` is set (enforced by a CHECK constraint).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StockReservation {
    pub id: DbId,
    pub product_id: Option<DbId>,
    pub variant_id: Option<DbId>,
    pub quantity: i32,
    pub status_id: StatusId,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
    pub released_at: Option<Timestamp>,
}

impl StockReservation {
    /// The unit this reservation holds stock against.
    pub fn unit(&self) -> StockUnitRef {
        match (self.product_id, self.variant_id) {
            (Some(id), None) => StockUnitRef::Product(id),
            (None, Some(id)) => StockUnitRef::Variant(id),
            // ck_stock_reservations_unit makes other combinations unrepresentable
            _ => unreachable!("reservation row without a unit"),
        }
    }
}
