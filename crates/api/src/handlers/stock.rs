//! Handlers for the stock ledger operations: lock, unlock, purchase,
//! restock.
//!
//! All four take the same `{items: [{kind, id, quantity}]}` batch shape.
//! Request-shape validation runs before any ledger access; the ledger
//! itself enforces stock invariants through conditional atomic updates in
//! `StockRepo`, so these handlers contain no availability checks of their
//! own.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use validator::Validate;
use vitrine_core::inventory::{self, LineItem};
use vitrine_core::types::Timestamp;
use vitrine_db::models::stock::{LockResult, PurchaseResult, RestockResult, UnlockResult};
use vitrine_db::repositories::StockRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body shared by all batch stock operations.
#[derive(Debug, Deserialize, Validate)]
pub struct StockBatchRequest {
    #[validate(length(min = 1, message = "items must not be empty"))]
    pub items: Vec<LineItem>,
}

/// Response for `POST /stock/lock`.
#[derive(Debug, Serialize)]
pub struct LockResponse {
    pub lock_results: Vec<LockResult>,
    /// Shared deadline for the whole batch; after this the sweeper may
    /// reclaim the reservation.
    pub lock_expires_at: Timestamp,
}

/// Response for `POST /stock/unlock`.
#[derive(Debug, Serialize)]
pub struct UnlockResponse {
    /// Items whose release had no effect (already released or swept) are
    /// omitted rather than reported as errors.
    pub unlock_results: Vec<UnlockResult>,
}

/// Response for `POST /stock/purchase` and the payment webhook.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub purchase_results: Vec<PurchaseResult>,
}

/// Response for `POST /admin/inventory/restock`.
#[derive(Debug, Serialize)]
pub struct RestockResponse {
    pub restock_results: Vec<RestockResult>,
}

/// POST /api/v1/stock/lock
///
/// Reserve stock for a cart, all-or-nothing. On a conflict the response
/// names the product that blocked the batch and nothing is held.
pub async fn lock_stock(
    State(state): State<AppState>,
    Json(body): Json<StockBatchRequest>,
) -> AppResult<impl IntoResponse> {
    let items = validate_batch(&body)?;

    let expires_at = inventory::lock_expiry(
        chrono::Utc::now(),
        state.config.inventory.lock_window_mins,
    );
    let results = StockRepo::lock_items(&state.pool, &items, expires_at).await?;

    tracing::debug!(items = results.len(), %expires_at, "Stock reserved");

    Ok(Json(DataResponse {
        data: LockResponse {
            lock_results: results,
            lock_expires_at: expires_at,
        },
    }))
}

/// POST /api/v1/stock/unlock
///
/// Release previously reserved stock. Safe to repeat: a second identical
/// call has no effect and still succeeds.
pub async fn unlock_stock(
    State(state): State<AppState>,
    Json(body): Json<StockBatchRequest>,
) -> AppResult<impl IntoResponse> {
    let items = validate_batch(&body)?;

    let results = StockRepo::unlock_items(&state.pool, &items).await?;

    tracing::debug!(
        requested = items.len(),
        released = results.len(),
        "Stock released"
    );

    Ok(Json(DataResponse {
        data: UnlockResponse {
            unlock_results: results,
        },
    }))
}

/// POST /api/v1/stock/purchase
///
/// Permanently decrement stock, all-or-nothing, independent of any
/// reservation. Normally driven by the payment webhook; exposed directly
/// for admin tooling and order corrections.
pub async fn purchase_stock(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<StockBatchRequest>,
) -> AppResult<impl IntoResponse> {
    let items = validate_batch(&body)?;

    let results = StockRepo::purchase_items(&state.pool, &items, chrono::Utc::now()).await?;

    tracing::info!(
        user_id = admin.user_id,
        items = results.len(),
        "Stock purchased directly"
    );

    Ok(Json(DataResponse {
        data: PurchaseResponse {
            purchase_results: results,
        },
    }))
}

/// POST /api/v1/admin/inventory/restock
///
/// Compensating increment for cancelled orders; returns sold-out units
/// to availability.
pub async fn restock(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<StockBatchRequest>,
) -> AppResult<impl IntoResponse> {
    let items = validate_batch(&body)?;

    let results = StockRepo::restock_items(&state.pool, &items).await?;

    tracing::info!(
        user_id = admin.user_id,
        items = results.len(),
        "Stock restocked"
    );

    Ok(Json(DataResponse {
        data: RestockResponse {
            restock_results: results,
        },
    }))
}

/// Shape-check the batch, then merge duplicate units so one request
/// cannot race itself.
fn validate_batch(body: &StockBatchRequest) -> Result<Vec<LineItem>, AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    Ok(inventory::normalize_items(&body.items)?)
}
