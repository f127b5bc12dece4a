//! HTTP-level integration tests for the catalog endpoints.

mod common;

use axum::http::StatusCode;
use common::{auth_post_json, body_json, get, post_json};
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn create_product_requires_admin(pool: PgPool) {
    let payload = serde_json::json!({"name": "Mug", "slug": "mug", "price_cents": 900});

    let app = common::build_test_app(pool.clone());
    let response = post_json(app, "/api/v1/products", payload.clone()).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let token = common::customer_token(&pool).await;
    let app = common::build_test_app(pool);
    let response = auth_post_json(app, "/api/v1/products", &token, payload).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_and_fetch_product_with_stock_snapshot(pool: PgPool) {
    let token = common::admin_token(&pool).await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        "/api/v1/products",
        &token,
        serde_json::json!({"name": "Mug", "slug": "mug", "price_cents": 900, "quantity": 7}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_i64().unwrap();

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/products/{id}")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Mug");
    assert_eq!(json["data"]["quantity"], 7);
    assert_eq!(json["data"]["available"], 7);
    assert_eq!(json["data"]["stock_state"], "available");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn get_nonexistent_product_returns_404(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app, "/api/v1/products/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn variants_are_created_and_listed_under_their_product(pool: PgPool) {
    let token = common::admin_token(&pool).await;
    let product_id = common::seed_product(&pool, "shirt", 0).await;

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(
        app,
        &format!("/api/v1/products/{product_id}/variants"),
        &token,
        serde_json::json!({"sku": "shirt-m", "name": "Shirt / M", "price_cents": 2400, "quantity": 3}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool);
    let response = get(app, &format!("/api/v1/products/{product_id}/variants")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let variants = json["data"].as_array().unwrap();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0]["sku"], "shirt-m");
    assert_eq!(variants[0]["available"], 3);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn duplicate_slug_returns_409(pool: PgPool) {
    let token = common::admin_token(&pool).await;
    let payload = serde_json::json!({"name": "Mug", "slug": "mug", "price_cents": 900});

    let app = common::build_test_app(pool.clone());
    let response = auth_post_json(app, "/api/v1/products", &token, payload.clone()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = common::build_test_app(pool);
    let response = auth_post_json(app, "/api/v1/products", &token, payload).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}
