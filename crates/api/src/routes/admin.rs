//! Route definitions for `/admin/inventory` (all admin-only).

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{stock, sweeper};
use crate::state::AppState;

/// Routes mounted at `/admin/inventory`.
///
/// ```text
/// POST /sweep         -> trigger_sweep (rate-limited)
/// GET  /sweep/status  -> sweep_status
/// POST /restock       -> restock
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sweep", post(sweeper::trigger_sweep))
        .route("/sweep/status", get(sweeper::sweep_status))
        .route("/restock", post(stock::restock))
}
