//! Route definitions for the `/stock` ledger operations.

use axum::routing::post;
use axum::Router;

use crate::handlers::stock;
use crate::state::AppState;

/// Routes mounted at `/stock`.
///
/// ```text
/// POST /lock     -> lock_stock      (checkout: reserve a cart)
/// POST /unlock   -> unlock_stock    (checkout: release a cart)
/// POST /purchase -> purchase_stock  (admin: direct atomic purchase)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/lock", post(stock::lock_stock))
        .route("/unlock", post(stock::unlock_stock))
        .route("/purchase", post(stock::purchase_stock))
}
