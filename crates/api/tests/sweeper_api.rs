//! Integration tests for the expiry sweeper: the pass itself plus the
//! admin trigger and status endpoints.

mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use common::{auth_get, auth_post_json, body_json, seed_product};
use sqlx::PgPool;
use vitrine_api::background::stock_sweeper::sweep_expired_locks;
use vitrine_core::inventory::{LineItem, StockUnitRef};
use vitrine_db::repositories::StockRepo;

/// Lock `quantity` on the product with a deadline already in the past.
async fn lock_expired(pool: &PgPool, product_id: i64, quantity: i32) {
    StockRepo::lock_items(
        pool,
        &[LineItem {
            unit: StockUnitRef::Product(product_id),
            quantity,
        }],
        Utc::now() - Duration::minutes(5),
    )
    .await
    .unwrap();
}

// ---------------------------------------------------------------------------
// The pass itself (injectable clock)
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_releases_expired_reservations(pool: PgPool) {
    let id = seed_product(&pool, "abandoned", 5).await;
    lock_expired(&pool, id, 2).await;

    let report = sweep_expired_locks(&pool, Utc::now()).await;

    assert_eq!(report.products_checked, 1);
    assert_eq!(report.products_unlocked, 1);
    assert_eq!(report.variants_checked, 0);
    assert_eq!(report.total_quantity_released, 2);
    assert!(report.errors.is_empty());

    let (quantity, locked): (i32, i32) =
        sqlx::query_as("SELECT quantity, locked_quantity FROM products WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!((quantity, locked), (5, 0));
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_leaves_live_reservations_alone(pool: PgPool) {
    let id = seed_product(&pool, "active-cart", 5).await;
    StockRepo::lock_items(
        &pool,
        &[LineItem {
            unit: StockUnitRef::Product(id),
            quantity: 2,
        }],
        Utc::now() + Duration::minutes(10),
    )
    .await
    .unwrap();

    let report = sweep_expired_locks(&pool, Utc::now()).await;

    assert_eq!(report.products_checked, 0);
    assert_eq!(report.total_quantity_released, 0);

    let (locked,): (i32,) =
        sqlx::query_as("SELECT locked_quantity FROM products WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(locked, 2, "a live reservation must not be swept");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_is_idempotent(pool: PgPool) {
    let id = seed_product(&pool, "swept-twice", 5).await;
    lock_expired(&pool, id, 3).await;

    let first = sweep_expired_locks(&pool, Utc::now()).await;
    assert_eq!(first.total_quantity_released, 3);

    // A second pass finds nothing: the reservation was already claimed.
    let second = sweep_expired_locks(&pool, Utc::now()).await;
    assert_eq!(second.products_checked, 0);
    assert_eq!(second.total_quantity_released, 0);

    let (locked,): (i32,) =
        sqlx::query_as("SELECT locked_quantity FROM products WHERE id = $1")
            .bind(id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(locked, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_continues_past_a_broken_unit(pool: PgPool) {
    let healthy = seed_product(&pool, "healthy", 5).await;
    let broken = seed_product(&pool, "broken", 5).await;
    lock_expired(&pool, broken, 2).await;
    lock_expired(&pool, healthy, 3).await;

    // Wreck the broken unit's aggregate out-of-band so its guarded
    // decrement cannot hold.
    sqlx::query("UPDATE products SET locked_quantity = 0 WHERE id = $1")
        .bind(broken)
        .execute(&pool)
        .await
        .unwrap();

    let report = sweep_expired_locks(&pool, Utc::now()).await;

    // The broken unit is reported, the healthy one still released.
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.products_unlocked, 1);
    assert_eq!(report.total_quantity_released, 3);
}

// ---------------------------------------------------------------------------
// Admin endpoints
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../db/migrations")]
async fn sweep_endpoints_require_admin(pool: PgPool) {
    let token = common::customer_token(&pool).await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        "/api/v1/admin/inventory/sweep",
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let app = common::build_test_app(pool);
    let response = auth_get(app, "/api/v1/admin/inventory/sweep/status", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn manual_sweep_reports_and_updates_status(pool: PgPool) {
    let id = seed_product(&pool, "stale", 5).await;
    lock_expired(&pool, id, 2).await;
    let token = common::admin_token(&pool).await;

    // Trigger and status share one app so they share one SweeperHandle.
    let app = common::build_test_app(pool.clone());

    let response = auth_post_json(
        app.clone(),
        "/api/v1/admin/inventory/sweep",
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["products_unlocked"], 1);
    assert_eq!(json["data"]["total_quantity_released"], 2);
    assert_eq!(json["data"]["errors"].as_array().unwrap().len(), 0);

    let response = auth_get(app, "/api/v1/admin/inventory/sweep/status", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["enabled"], false);
    assert_eq!(json["data"]["running"], false);
    assert_eq!(json["data"]["last_run"]["total_quantity_released"], 2);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn manual_sweep_is_rate_limited(pool: PgPool) {
    let token = common::admin_token(&pool).await;

    // 60-second minimum gap between manual triggers.
    let app = common::build_test_app_with(
        pool,
        vitrine_core::inventory::CheckoutStrategy::PreLock,
        60,
    );

    let response = auth_post_json(
        app.clone(),
        "/api/v1/admin/inventory/sweep",
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = auth_post_json(
        app,
        "/api/v1/admin/inventory/sweep",
        &token,
        serde_json::json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .contains("triggered recently"));
}
