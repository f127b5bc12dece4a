//! Shared helpers for HTTP-level integration tests.
//!
//! Builds the full application router with the production middleware
//! stack and provides request/seeding helpers.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use vitrine_api::auth::jwt::{generate_access_token, JwtConfig};
use vitrine_api::auth::password::hash_password;
use vitrine_api::background::stock_sweeper::SweeperHandle;
use vitrine_api::config::{InventoryConfig, ServerConfig};
use vitrine_api::router::build_app_router;
use vitrine_api::state::AppState;
use vitrine_core::inventory::CheckoutStrategy;
use vitrine_core::roles::{ROLE_ADMIN, ROLE_CUSTOMER};
use vitrine_db::repositories::UserRepo;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const TEST_WEBHOOK_SECRET: &str = "test-payment-webhook-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config(strategy: CheckoutStrategy, manual_sweep_min_interval_secs: u64) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 30,
        },
        inventory: InventoryConfig {
            lock_window_mins: 10,
            // Tests drive sweeps through the admin endpoint, never a
            // background task.
            sweep_enabled: false,
            sweep_interval_secs: 60,
            manual_sweep_min_interval_secs,
            checkout_strategy: strategy,
            payment_webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
        },
    }
}

/// Build the application router with the default (pre-lock) strategy and
/// no manual-sweep rate limit.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, CheckoutStrategy::PreLock, 0)
}

/// Build the application router with explicit inventory settings.
///
/// This mirrors the router construction in `main.rs` so integration
/// tests exercise the same middleware stack (CORS, request ID, timeout,
/// tracing, panic recovery) that production uses.
pub fn build_test_app_with(
    pool: PgPool,
    strategy: CheckoutStrategy,
    manual_sweep_min_interval_secs: u64,
) -> Router {
    let config = test_config(strategy, manual_sweep_min_interval_secs);
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        sweeper: Arc::new(SweeperHandle::new(config.inventory.sweep_enabled)),
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// Users & tokens
// ---------------------------------------------------------------------------

/// Insert an admin account and return a valid access token for it.
pub async fn admin_token(pool: &PgPool) -> String {
    token_for(pool, "admin@example.com", ROLE_ADMIN).await
}

/// Insert a customer account and return a valid access token for it.
pub async fn customer_token(pool: &PgPool) -> String {
    token_for(pool, "customer@example.com", ROLE_CUSTOMER).await
}

async fn token_for(pool: &PgPool, email: &str, role: &str) -> String {
    let hash = hash_password("a-test-password").expect("hashing should succeed");
    let user = UserRepo::create(pool, email, &hash, role)
        .await
        .expect("user insert should succeed");
    let config = test_config(CheckoutStrategy::PreLock, 0);
    generate_access_token(user.id, role, &config.jwt).expect("token generation should succeed")
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Send one request through the router.
pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    body: Option<serde_json::Value>,
    headers: &[(&str, &str)],
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, &[]).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body), &[]).await
}

pub async fn auth_get(app: Router, uri: &str, token: &str) -> Response<Body> {
    let auth = format!("Bearer {token}");
    send(app, Method::GET, uri, None, &[("authorization", &auth)]).await
}

pub async fn auth_post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: serde_json::Value,
) -> Response<Body> {
    let auth = format!("Bearer {token}");
    send(app, Method::POST, uri, Some(body), &[("authorization", &auth)]).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "response body is not JSON: {e}: {}",
            String::from_utf8_lossy(&bytes)
        )
    })
}

// ---------------------------------------------------------------------------
// Catalog seeding (straight through the repository layer)
// ---------------------------------------------------------------------------

/// Insert a product with the given stock and return its id.
pub async fn seed_product(pool: &PgPool, slug: &str, quantity: i32) -> i64 {
    let product = vitrine_db::repositories::ProductRepo::create(
        pool,
        &vitrine_db::models::product::CreateProduct {
            name: format!("Product {slug}"),
            slug: slug.to_string(),
            description: None,
            price_cents: 1990,
            quantity: Some(quantity),
        },
    )
    .await
    .expect("product insert should succeed");
    product.id
}
