//! Route definitions for the `/payments` webhook surface.

use axum::routing::post;
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payments`.
///
/// ```text
/// POST /confirm -> confirm_payment (HMAC-signed provider callback)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/confirm", post(payments::confirm_payment))
}
