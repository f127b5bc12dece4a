//! Stock ledger domain: unit addressing, line items, the per-unit state
//! machine, and the inventory failure taxonomy.
//!
//! A purchasable stock unit is either a product that has no variants or a
//! single product variant. Units are addressed with a tagged union rather
//! than an id-prefix convention so the two cases cannot be confused.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Reservation window applied to a whole lock batch, in minutes.
pub const DEFAULT_LOCK_WINDOW_MINS: i64 = 10;

/// Reference to a purchasable stock unit.
///
/// Serializes as `{"kind": "product", "id": 42}` or
/// `{"kind": "variant", "id": 42}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum StockUnitRef {
    /// A product sold without variants.
    Product(DbId),
    /// A specific variant of a product.
    Variant(DbId),
}

impl StockUnitRef {
    pub fn id(&self) -> DbId {
        match self {
            StockUnitRef::Product(id) | StockUnitRef::Variant(id) => *id,
        }
    }

    pub fn is_variant(&self) -> bool {
        matches!(self, StockUnitRef::Variant(_))
    }
}

impl fmt::Display for StockUnitRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StockUnitRef::Product(id) => write!(f, "product {id}"),
            StockUnitRef::Variant(id) => write!(f, "variant {id}"),
        }
    }
}

/// One `{unit, quantity}` pair in a lock / unlock / purchase batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(flatten)]
    pub unit: StockUnitRef,
    pub quantity: i32,
}

/// Validate and normalize a request batch before any ledger access.
///
/// Rejects empty batches and non-positive quantities; merges duplicate
/// units by summing their quantities so one cart line cannot race another
/// line of the same request.
pub fn normalize_items(items: &[LineItem]) -> Result<Vec<LineItem>, CoreError> {
    if items.is_empty() {
        return Err(CoreError::Validation(
            "at least one line item is required".into(),
        ));
    }

    let mut merged: Vec<LineItem> = Vec::with_capacity(items.len());
    for item in items {
        if item.quantity < 1 {
            return Err(CoreError::Validation(format!(
                "quantity for {} must be at least 1, got {}",
                item.unit, item.quantity
            )));
        }
        match merged.iter_mut().find(|m| m.unit == item.unit) {
            Some(existing) => existing.quantity += item.quantity,
            None => merged.push(*item),
        }
    }
    Ok(merged)
}

/// Compute the shared expiry for a lock batch acquired at `now`.
pub fn lock_expiry(now: Timestamp, window_mins: i64) -> Timestamp {
    now + chrono::Duration::minutes(window_mins)
}

/// Lifecycle of a stock unit, derived from its ledger columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StockState {
    /// Uncommitted stock exists and none of it is reserved.
    Available,
    /// Some stock is reserved, some still free.
    PartiallyLocked,
    /// Every remaining unit is reserved; nothing free to lock.
    FullyLocked,
    /// No physical stock left. Not terminal: a restock returns the unit
    /// to `Available`.
    SoldOut,
}

impl StockState {
    /// Derive the state from the ledger columns.
    pub fn derive(quantity: i32, locked_quantity: i32) -> Self {
        if quantity == 0 {
            StockState::SoldOut
        } else if locked_quantity == 0 {
            StockState::Available
        } else if locked_quantity < quantity {
            StockState::PartiallyLocked
        } else {
            StockState::FullyLocked
        }
    }
}

/// Which point in checkout commits stock. Exactly one strategy is active
/// per deployment; the two must never be mixed for the same cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStrategy {
    /// Reserve at cart time, convert the hold into a sale at payment
    /// confirmation.
    #[default]
    PreLock,
    /// Skip locking entirely; the conditional decrement at payment
    /// confirmation is the race resolution (first to pay wins).
    PayToCommit,
}

impl FromStr for CheckoutStrategy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pre_lock" => Ok(CheckoutStrategy::PreLock),
            "pay_to_commit" => Ok(CheckoutStrategy::PayToCommit),
            other => Err(CoreError::Validation(format!(
                "unknown checkout strategy '{other}' (expected 'pre_lock' or 'pay_to_commit')"
            ))),
        }
    }
}

/// Inventory operation failures. Each variant names the unit that failed
/// so a multi-item batch can report exactly which product blocked it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StockError {
    #[error("{unit} does not exist")]
    NotFound { unit: StockUnitRef },

    #[error("\"{name}\" is no longer available")]
    Unavailable { unit: StockUnitRef, name: String },

    /// The conditional update matched zero rows: the requested quantity
    /// exceeded what was free at the moment the update ran. This is the
    /// routine outcome of a lost race, not a system failure.
    #[error("\"{name}\" was sold out to another customer: requested {requested}, {available} left")]
    InsufficientStock {
        unit: StockUnitRef,
        name: String,
        requested: i32,
        available: i32,
    },
}

impl StockError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            StockError::NotFound { .. } => "STOCK_UNIT_NOT_FOUND",
            StockError::Unavailable { .. } => "UNAVAILABLE",
            StockError::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(unit: StockUnitRef, quantity: i32) -> LineItem {
        LineItem { unit, quantity }
    }

    #[test]
    fn test_line_item_wire_shape() {
        let li = item(StockUnitRef::Variant(9), 2);
        let json = serde_json::to_value(&li).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "variant", "id": 9, "quantity": 2}));

        let back: LineItem = serde_json::from_value(json).unwrap();
        assert_eq!(back, li);
    }

    #[test]
    fn test_normalize_rejects_empty_batch() {
        let err = normalize_items(&[]).unwrap_err();
        assert!(err.to_string().contains("at least one line item"));
    }

    #[test]
    fn test_normalize_rejects_non_positive_quantity() {
        let err = normalize_items(&[item(StockUnitRef::Product(1), 0)]).unwrap_err();
        assert!(err.to_string().contains("must be at least 1"));

        let err = normalize_items(&[item(StockUnitRef::Product(1), -3)]).unwrap_err();
        assert!(err.to_string().contains("must be at least 1"));
    }

    #[test]
    fn test_normalize_merges_duplicate_units() {
        let merged = normalize_items(&[
            item(StockUnitRef::Product(1), 2),
            item(StockUnitRef::Variant(1), 1),
            item(StockUnitRef::Product(1), 3),
        ])
        .unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0], item(StockUnitRef::Product(1), 5));
        assert_eq!(merged[1], item(StockUnitRef::Variant(1), 1));
    }

    #[test]
    fn test_state_derivation() {
        assert_eq!(StockState::derive(10, 0), StockState::Available);
        assert_eq!(StockState::derive(10, 4), StockState::PartiallyLocked);
        assert_eq!(StockState::derive(10, 10), StockState::FullyLocked);
        assert_eq!(StockState::derive(0, 0), StockState::SoldOut);
    }

    #[test]
    fn test_lock_expiry_window() {
        let now = chrono::Utc::now();
        let expiry = lock_expiry(now, DEFAULT_LOCK_WINDOW_MINS);
        assert_eq!(expiry - now, chrono::Duration::minutes(10));
    }

    #[test]
    fn test_checkout_strategy_parsing() {
        assert_eq!(
            "pre_lock".parse::<CheckoutStrategy>().unwrap(),
            CheckoutStrategy::PreLock
        );
        assert_eq!(
            "pay_to_commit".parse::<CheckoutStrategy>().unwrap(),
            CheckoutStrategy::PayToCommit
        );
        assert!("fifo".parse::<CheckoutStrategy>().is_err());
    }

    #[test]
    fn test_insufficient_stock_names_the_loser() {
        let err = StockError::InsufficientStock {
            unit: StockUnitRef::Variant(7),
            name: "Linen Shirt / M".into(),
            requested: 3,
            available: 1,
        };
        let msg = err.to_string();
        assert!(msg.contains("Linen Shirt / M"));
        assert!(msg.contains("sold out to another customer"));
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");
    }
}
