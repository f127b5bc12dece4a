pub mod admin;
pub mod auth;
pub mod health;
pub mod payments;
pub mod products;
pub mod stock;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                    create customer account (public)
/// /auth/login                       login (public)
///
/// /products                         list, create (create: admin)
/// /products/{id}                    get with stock snapshot
/// /products/{id}/variants           list, create (create: admin)
///
/// /stock/lock                       reserve a cart (POST)
/// /stock/unlock                     release a cart (POST)
/// /stock/purchase                   direct atomic purchase (POST, admin)
///
/// /payments/confirm                 payment provider webhook (POST, HMAC)
///
/// /admin/inventory/sweep            trigger expiry sweep (POST)
/// /admin/inventory/sweep/status     sweeper status + last-run stats (GET)
/// /admin/inventory/restock          compensating restock (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Authentication (register, login).
        .nest("/auth", auth::router())
        // Catalog.
        .nest("/products", products::router())
        // Stock ledger operations.
        .nest("/stock", stock::router())
        // Payment confirmation webhook.
        .nest("/payments", payments::router())
        // Admin inventory tooling (sweeper, restock).
        .nest("/admin/inventory", admin::router())
}
