//! Result rows returned by the ledger operations in `StockRepo`.

use serde::Serialize;
use vitrine_core::inventory::StockUnitRef;

/// Per-item outcome of a successful lock batch.
#[derive(Debug, Clone, Serialize)]
pub struct LockResult {
    #[serde(flatten)]
    pub unit: StockUnitRef,
    /// Quantity reserved by this request.
    pub locked_quantity: i32,
    /// Free stock remaining after the reservation.
    pub remaining_available: i32,
}

/// Per-item outcome of an unlock batch. Items whose guard failed
/// (nothing left to release) are omitted from the batch result entirely.
#[derive(Debug, Clone, Serialize)]
pub struct UnlockResult {
    #[serde(flatten)]
    pub unit: StockUnitRef,
    /// Quantity released by this request.
    pub released_quantity: i32,
    /// Free stock after the release.
    pub remaining_available: i32,
}

/// Per-item outcome of a successful purchase batch.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseResult {
    #[serde(flatten)]
    pub unit: StockUnitRef,
    pub purchased_quantity: i32,
    /// Total stock left after the sale.
    pub remaining_stock: i32,
    /// True when this sale emptied the unit (`is_available` was flipped
    /// off and the sold-out timestamp stamped).
    pub sold_out: bool,
}

/// Per-item outcome of a compensating restock.
#[derive(Debug, Clone, Serialize)]
pub struct RestockResult {
    #[serde(flatten)]
    pub unit: StockUnitRef,
    pub quantity_added: i32,
    pub total_quantity: i32,
}
