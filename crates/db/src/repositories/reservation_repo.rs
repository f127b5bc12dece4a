//! Repository for the `stock_reservations` table.
//!
//! Reservations are bookkeeping for the aggregate `locked_quantity` on
//! the catalog rows: one row per line item per lock, sharing the batch's
//! expiry. Expired rows are reclaimed through
//! `StockRepo::reclaim_expired`, which closes the row and releases the
//! ledger hold in one transaction.

use sqlx::{Postgres, Transaction};
use vitrine_core::inventory::StockUnitRef;
use vitrine_core::types::{DbId, Timestamp};

use crate::models::reservation::StockReservation;
use crate::models::status::ReservationStatus;
use crate::DbPool;

/// Column list for `stock_reservations` queries.
const COLUMNS: &str = "\
    id, product_id, variant_id, quantity, status_id, \
    expires_at, created_at, released_at";

/// How many expired reservations one sweep pass picks up at most.
pub const SWEEP_BATCH_LIMIT: i64 = 500;

pub struct ReservationRepo;

impl ReservationRepo {
    /// Insert an active reservation for one locked line item.
    pub async fn create(
        tx: &mut Transaction<'_, Postgres>,
        unit: StockUnitRef,
        quantity: i32,
        expires_at: Timestamp,
    ) -> Result<DbId, sqlx::Error> {
        let (product_id, variant_id) = split_unit(unit);
        let (id,): (DbId,) = sqlx::query_as(
            "INSERT INTO stock_reservations \
                 (product_id, variant_id, quantity, status_id, expires_at) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(product_id)
        .bind(variant_id)
        .bind(quantity)
        .bind(ReservationStatus::Active.id())
        .bind(expires_at)
        .fetch_one(&mut **tx)
        .await?;
        Ok(id)
    }

    /// Close active reservations on `unit` covering `quantity`, oldest
    /// first, splitting the newest touched row if it is only partially
    /// consumed. Caller has already adjusted the ledger aggregate under
    /// the same transaction.
    ///
    /// If the active rows cover less than `quantity` (a restock or manual
    /// correction adjusted the aggregate out-of-band) the shortfall is
    /// logged and ignored -- the guarded ledger update remains the source
    /// of truth.
    pub async fn consume_oldest(
        tx: &mut Transaction<'_, Postgres>,
        unit: StockUnitRef,
        quantity: i32,
        to_status: ReservationStatus,
    ) -> Result<(), sqlx::Error> {
        let fk = fk_column(unit);
        let select = format!(
            "SELECT id, quantity FROM stock_reservations \
             WHERE {fk} = $1 AND status_id = $2 \
             ORDER BY created_at ASC, id ASC \
             LIMIT 1 \
             FOR UPDATE"
        );

        let mut remaining = quantity;
        while remaining > 0 {
            let row: Option<(DbId, i32)> = sqlx::query_as(&select)
                .bind(unit.id())
                .bind(ReservationStatus::Active.id())
                .fetch_optional(&mut **tx)
                .await?;

            let Some((id, res_quantity)) = row else {
                tracing::warn!(
                    unit = %unit,
                    shortfall = remaining,
                    "reservation bookkeeping lags the ledger aggregate"
                );
                break;
            };

            if res_quantity <= remaining {
                sqlx::query(
                    "UPDATE stock_reservations \
                     SET status_id = $2, released_at = NOW() \
                     WHERE id = $1",
                )
                .bind(id)
                .bind(to_status.id())
                .execute(&mut **tx)
                .await?;
                remaining -= res_quantity;
            } else {
                sqlx::query(
                    "UPDATE stock_reservations \
                     SET quantity = quantity - $2 \
                     WHERE id = $1",
                )
                .bind(id)
                .bind(remaining)
                .execute(&mut **tx)
                .await?;
                remaining = 0;
            }
        }
        Ok(())
    }

    /// Active reservations whose deadline has passed `now`, oldest first.
    pub async fn find_expired(
        pool: &DbPool,
        now: Timestamp,
        limit: i64,
    ) -> Result<Vec<StockReservation>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM stock_reservations \
             WHERE status_id = $1 AND expires_at < $2 \
             ORDER BY expires_at ASC \
             LIMIT $3"
        );
        sqlx::query_as::<_, StockReservation>(&query)
            .bind(ReservationStatus::Active.id())
            .bind(now)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Total actively reserved quantity for a unit.
    pub async fn active_quantity(
        pool: &DbPool,
        unit: StockUnitRef,
    ) -> Result<i64, sqlx::Error> {
        let fk = fk_column(unit);
        let query = format!(
            "SELECT COALESCE(SUM(quantity), 0) FROM stock_reservations \
             WHERE {fk} = $1 AND status_id = $2"
        );
        let (sum,): (i64,) = sqlx::query_as(&query)
            .bind(unit.id())
            .bind(ReservationStatus::Active.id())
            .fetch_one(pool)
            .await?;
        Ok(sum)
    }
}

fn split_unit(unit: StockUnitRef) -> (Option<DbId>, Option<DbId>) {
    match unit {
        StockUnitRef::Product(id) => (Some(id), None),
        StockUnitRef::Variant(id) => (None, Some(id)),
    }
}

fn fk_column(unit: StockUnitRef) -> &'static str {
    if unit.is_variant() {
        "variant_id"
    } else {
        "product_id"
    }
}
