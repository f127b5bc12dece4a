use sqlx::PgPool;

/// Full bootstrap test: connect, migrate, verify schema.
#[sqlx::test]
async fn test_full_bootstrap(pool: PgPool) {
    // Health check
    vitrine_db::health_check(&pool).await.unwrap();

    // The reservation status lookup table must carry its seed data.
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reservation_statuses")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 4, "reservation_statuses should have 4 seed rows");

    // Core tables exist and start empty.
    for table in ["users", "products", "product_variants", "stock_reservations"] {
        let count: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&pool)
            .await
            .unwrap_or_else(|e| panic!("{table} query failed: {e}"));
        assert_eq!(count.0, 0, "{table} should start empty");
    }
}

/// The ledger CHECK constraint rejects rows that would break the
/// locked <= quantity invariant even if repository code were bypassed.
#[sqlx::test]
async fn test_ledger_check_constraint(pool: PgPool) {
    let result = sqlx::query(
        "INSERT INTO products (name, slug, price_cents, quantity, locked_quantity) \
         VALUES ('Broken', 'broken', 100, 1, 2)",
    )
    .execute(&pool)
    .await;

    assert!(result.is_err(), "locked_quantity > quantity must be rejected");
}
