//! Admin endpoints for the expiry sweeper: manual trigger and status.
//!
//! The manual trigger runs the exact same pass as the background loop and
//! reports through the same [`SweeperHandle`], so a manual run shows up
//! in `last_run` and two passes never execute concurrently.
//!
//! [`SweeperHandle`]: crate::background::stock_sweeper::SweeperHandle

use std::time::Duration;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use vitrine_core::error::CoreError;

use crate::background::stock_sweeper::sweep_expired_locks;
use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/inventory/sweep
///
/// Run one sweep pass now. Rate-limited; rejects while another pass is
/// executing.
pub async fn trigger_sweep(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    let min_interval =
        Duration::from_secs(state.config.inventory.manual_sweep_min_interval_secs);
    if let Err(retry_in) = state.sweeper.check_manual_interval(min_interval) {
        return Err(AppError::Core(CoreError::Conflict(format!(
            "Sweep was triggered recently; retry in {retry_in}s"
        ))));
    }
    if !state.sweeper.try_acquire() {
        return Err(AppError::Core(CoreError::Conflict(
            "A sweep pass is already running".into(),
        )));
    }

    let report = sweep_expired_locks(&state.pool, chrono::Utc::now()).await;
    state.sweeper.finish(report.clone());

    tracing::info!(
        user_id = admin.user_id,
        unlocked = report.products_unlocked + report.variants_unlocked,
        quantity_released = report.total_quantity_released,
        errors = report.errors.len(),
        "Manual stock sweep completed"
    );

    Ok(Json(DataResponse { data: report }))
}

/// GET /api/v1/admin/inventory/sweep/status
///
/// Report whether the background loop is enabled, whether a pass is
/// running, and the last completed pass's stats.
pub async fn sweep_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    Ok(Json(DataResponse {
        data: state.sweeper.status(),
    }))
}
