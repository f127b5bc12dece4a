//! Payment-confirmation webhook.
//!
//! The payment provider calls this with the cart's line items once a
//! charge settles. The request is authenticated by an HMAC-SHA256
//! signature over the raw body (shared secret, hex-encoded in the
//! signature header) -- no JWT, since the caller is a machine.
//!
//! Which ledger operation runs depends on the configured checkout
//! strategy: `pre_lock` converts the cart's existing hold into a sale,
//! `pay_to_commit` performs the atomic purchase directly and the
//! conditional decrement here is the race resolution.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use vitrine_core::error::CoreError;
use vitrine_core::inventory::{self, CheckoutStrategy, LineItem};
use vitrine_db::repositories::StockRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::stock::PurchaseResponse;
use crate::response::DataResponse;
use crate::state::AppState;

/// Header carrying the hex-encoded HMAC-SHA256 of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-vitrine-signature";

type HmacSha256 = Hmac<Sha256>;

/// Payload sent by the payment provider at confirmation time.
#[derive(Debug, Deserialize)]
pub struct PaymentConfirmation {
    /// Provider-side reference for the paid order, used for log
    /// correlation only.
    pub order_reference: String,
    pub items: Vec<LineItem>,
}

/// POST /api/v1/payments/confirm
pub async fn confirm_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    verify_signature(
        &headers,
        &body,
        &state.config.inventory.payment_webhook_secret,
    )?;

    let confirmation: PaymentConfirmation = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Invalid payment payload: {e}")))?;
    let items = inventory::normalize_items(&confirmation.items)?;

    let now = chrono::Utc::now();
    let results = match state.config.inventory.checkout_strategy {
        CheckoutStrategy::PreLock => {
            StockRepo::commit_locked_items(&state.pool, &items, now).await?
        }
        CheckoutStrategy::PayToCommit => {
            StockRepo::purchase_items(&state.pool, &items, now).await?
        }
    };

    tracing::info!(
        order_reference = %confirmation.order_reference,
        strategy = ?state.config.inventory.checkout_strategy,
        items = results.len(),
        "Payment confirmed, stock committed"
    );

    Ok(Json(DataResponse {
        data: PurchaseResponse {
            purchase_results: results,
        },
    }))
}

/// Check the webhook signature before touching the payload.
fn verify_signature(headers: &HeaderMap, body: &[u8], secret: &str) -> Result<(), AppError> {
    let provided = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(format!(
                "Missing {SIGNATURE_HEADER} header"
            )))
        })?;

    let expected = sign_body(body, secret);
    if !constant_time_str_eq(provided, &expected) {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Payment signature mismatch".into(),
        )));
    }
    Ok(())
}

/// Hex-encoded HMAC-SHA256 of `body` under `secret`. Public so tests and
/// provider simulators can produce valid signatures.
pub fn sign_body(body: &[u8], secret: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body);
    format!("{:x}", mac.finalize().into_bytes())
}

/// Length-guarded constant-time string comparison for signatures.
fn constant_time_str_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
