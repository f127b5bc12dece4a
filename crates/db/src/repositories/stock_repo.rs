//! The stock ledger engine: lock, unlock, purchase, commit, restock.
//!
//! Every mutation is a conditional atomic update -- `UPDATE ... WHERE
//! <precondition>` inspected via the returned row -- never a read followed
//! by a write. Zero rows affected IS the insufficient-stock signal.
//! Multi-item batches run inside one transaction; on a lock or purchase
//! the first failing item aborts and rolls back the whole batch, while an
//! unlock simply omits items whose guard failed.

use sqlx::{Postgres, Transaction};
use vitrine_core::inventory::{LineItem, StockError, StockUnitRef};
use vitrine_core::types::Timestamp;

use crate::models::reservation::StockReservation;
use crate::models::status::ReservationStatus;
use crate::models::stock::{LockResult, PurchaseResult, RestockResult, UnlockResult};
use crate::repositories::ReservationRepo;
use crate::DbPool;

/// Failure of a ledger operation: either a business outcome carrying the
/// offending unit, or an infrastructure error from the database.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Which quantity a failed conditional update was checked against, used
/// to report the right `available` figure to the caller.
#[derive(Clone, Copy)]
enum Checked {
    /// Lock path: free stock (`quantity - locked_quantity`).
    FreeStock,
    /// Direct purchase path: total stock (locks are bypassed).
    TotalStock,
    /// Commit path: the held amount (`locked_quantity`).
    HeldStock,
}

/// Ledger operations over `products` and `product_variants`.
pub struct StockRepo;

impl StockRepo {
    /// Reserve every item in the batch, all-or-nothing.
    ///
    /// Per item: one conditional update that increments `locked_quantity`
    /// only while the unit is available and has enough free stock, then a
    /// reservation row stamped with the batch's shared `expires_at`. The
    /// first item whose update matches zero rows aborts the transaction,
    /// rolling back every earlier item.
    pub async fn lock_items(
        pool: &DbPool,
        items: &[LineItem],
        expires_at: Timestamp,
    ) -> Result<Vec<LockResult>, LedgerError> {
        let mut tx = pool.begin().await?;
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            let table = ledger_table(item.unit);
            let query = format!(
                "UPDATE {table} \
                 SET locked_quantity = locked_quantity + $2, updated_at = NOW() \
                 WHERE id = $1 \
                   AND is_available \
                   AND quantity - locked_quantity >= $2 \
                 RETURNING quantity, locked_quantity"
            );
            let row: Option<(i32, i32)> = sqlx::query_as(&query)
                .bind(item.unit.id())
                .bind(item.quantity)
                .fetch_optional(&mut *tx)
                .await?;

            let (quantity, locked_quantity) = match row {
                Some(r) => r,
                None => {
                    // Dropping the transaction rolls back earlier items.
                    return Err(
                        classify_failure(&mut tx, item.unit, item.quantity, Checked::FreeStock)
                            .await,
                    );
                }
            };

            ReservationRepo::create(&mut tx, item.unit, item.quantity, expires_at).await?;

            results.push(LockResult {
                unit: item.unit,
                locked_quantity: item.quantity,
                remaining_available: quantity - locked_quantity,
            });
        }

        tx.commit().await?;
        Ok(results)
    }

    /// Release previously reserved quantities.
    ///
    /// Per item: one conditional decrement guarded by `locked_quantity >=
    /// quantity`, so a double-unlock (or an unlock after the sweeper beat
    /// the client to it) matches zero rows and is silently omitted from
    /// the result list instead of failing the batch. The batch still runs
    /// in one transaction so the returned snapshot is consistent.
    pub async fn unlock_items(
        pool: &DbPool,
        items: &[LineItem],
    ) -> Result<Vec<UnlockResult>, sqlx::Error> {
        let mut tx = pool.begin().await?;
        let mut results = Vec::new();

        for item in items {
            let table = ledger_table(item.unit);
            let query = format!(
                "UPDATE {table} \
                 SET locked_quantity = locked_quantity - $2, updated_at = NOW() \
                 WHERE id = $1 \
                   AND locked_quantity >= $2 \
                 RETURNING quantity, locked_quantity"
            );
            let row: Option<(i32, i32)> = sqlx::query_as(&query)
                .bind(item.unit.id())
                .bind(item.quantity)
                .fetch_optional(&mut *tx)
                .await?;

            let Some((quantity, locked_quantity)) = row else {
                continue;
            };

            ReservationRepo::consume_oldest(
                &mut tx,
                item.unit,
                item.quantity,
                ReservationStatus::Released,
            )
            .await?;

            results.push(UnlockResult {
                unit: item.unit,
                released_quantity: item.quantity,
                remaining_available: quantity - locked_quantity,
            });
        }

        tx.commit().await?;
        Ok(results)
    }

    /// Permanently decrement total stock, all-or-nothing, bypassing the
    /// reservation lifecycle. This is the first-to-pay-wins path: safe to
    /// call concurrently from multiple payment confirmations because the
    /// decrement is guarded by `quantity >= requested` in the same
    /// statement.
    ///
    /// A sale that empties the unit flips `is_available` off and stamps
    /// `sold_out_at` with `now`.
    pub async fn purchase_items(
        pool: &DbPool,
        items: &[LineItem],
        now: Timestamp,
    ) -> Result<Vec<PurchaseResult>, LedgerError> {
        let mut tx = pool.begin().await?;
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            let table = ledger_table(item.unit);
            let query = format!(
                "UPDATE {table} \
                 SET quantity = quantity - $2, \
                     is_available = CASE WHEN quantity - $2 = 0 THEN FALSE ELSE is_available END, \
                     sold_out_at = CASE WHEN quantity - $2 = 0 THEN $3 ELSE sold_out_at END, \
                     updated_at = NOW() \
                 WHERE id = $1 \
                   AND is_available \
                   AND quantity >= $2 \
                 RETURNING quantity"
            );
            let row: Option<(i32,)> = sqlx::query_as(&query)
                .bind(item.unit.id())
                .bind(item.quantity)
                .bind(now)
                .fetch_optional(&mut *tx)
                .await?;

            let Some((remaining,)) = row else {
                return Err(
                    classify_failure(&mut tx, item.unit, item.quantity, Checked::TotalStock).await,
                );
            };

            results.push(PurchaseResult {
                unit: item.unit,
                purchased_quantity: item.quantity,
                remaining_stock: remaining,
                sold_out: remaining == 0,
            });
        }

        tx.commit().await?;
        Ok(results)
    }

    /// Convert held stock into a sale at payment confirmation (the
    /// pre-lock strategy). Decrements `quantity` and `locked_quantity`
    /// together in one guarded statement and marks the covering
    /// reservations committed. All-or-nothing like a purchase.
    pub async fn commit_locked_items(
        pool: &DbPool,
        items: &[LineItem],
        now: Timestamp,
    ) -> Result<Vec<PurchaseResult>, LedgerError> {
        let mut tx = pool.begin().await?;
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            let table = ledger_table(item.unit);
            let query = format!(
                "UPDATE {table} \
                 SET quantity = quantity - $2, \
                     locked_quantity = locked_quantity - $2, \
                     is_available = CASE WHEN quantity - $2 = 0 THEN FALSE ELSE is_available END, \
                     sold_out_at = CASE WHEN quantity - $2 = 0 THEN $3 ELSE sold_out_at END, \
                     updated_at = NOW() \
                 WHERE id = $1 \
                   AND locked_quantity >= $2 \
                   AND quantity >= $2 \
                 RETURNING quantity"
            );
            let row: Option<(i32,)> = sqlx::query_as(&query)
                .bind(item.unit.id())
                .bind(item.quantity)
                .bind(now)
                .fetch_optional(&mut *tx)
                .await?;

            let Some((remaining,)) = row else {
                return Err(
                    classify_failure(&mut tx, item.unit, item.quantity, Checked::HeldStock).await,
                );
            };

            ReservationRepo::consume_oldest(
                &mut tx,
                item.unit,
                item.quantity,
                ReservationStatus::Committed,
            )
            .await?;

            results.push(PurchaseResult {
                unit: item.unit,
                purchased_quantity: item.quantity,
                remaining_stock: remaining,
                sold_out: remaining == 0,
            });
        }

        tx.commit().await?;
        Ok(results)
    }

    /// Compensating increment used on order cancellation. Restores total
    /// stock and returns a sold-out unit to availability.
    pub async fn restock_items(
        pool: &DbPool,
        items: &[LineItem],
    ) -> Result<Vec<RestockResult>, LedgerError> {
        let mut tx = pool.begin().await?;
        let mut results = Vec::with_capacity(items.len());

        for item in items {
            let table = ledger_table(item.unit);
            let query = format!(
                "UPDATE {table} \
                 SET quantity = quantity + $2, \
                     is_available = TRUE, \
                     sold_out_at = NULL, \
                     updated_at = NOW() \
                 WHERE id = $1 \
                 RETURNING quantity"
            );
            let row: Option<(i32,)> = sqlx::query_as(&query)
                .bind(item.unit.id())
                .bind(item.quantity)
                .fetch_optional(&mut *tx)
                .await?;

            let Some((total,)) = row else {
                return Err(StockError::NotFound { unit: item.unit }.into());
            };

            results.push(RestockResult {
                unit: item.unit,
                quantity_added: item.quantity,
                total_quantity: total,
            });
        }

        tx.commit().await?;
        Ok(results)
    }

    /// Reclaim one expired reservation: release its ledger hold and flip
    /// the row `active -> expired`, both in one transaction so a crash
    /// can never release the hold without closing the reservation (or
    /// vice versa).
    ///
    /// Statement order is ledger row first, reservation row second --
    /// the same order every other operation uses, so this cannot
    /// deadlock against a concurrent unlock.
    pub async fn reclaim_expired(
        pool: &DbPool,
        reservation: &StockReservation,
        now: Timestamp,
    ) -> Result<ReclaimOutcome, sqlx::Error> {
        let unit = reservation.unit();
        let mut tx = pool.begin().await?;

        let table = ledger_table(unit);
        let query = format!(
            "UPDATE {table} \
             SET locked_quantity = locked_quantity - $2, updated_at = NOW() \
             WHERE id = $1 \
               AND locked_quantity >= $2"
        );
        let released = sqlx::query(&query)
            .bind(unit.id())
            .bind(reservation.quantity)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let claimed = sqlx::query(
            "UPDATE stock_reservations \
             SET status_id = $2, released_at = $3 \
             WHERE id = $1 AND status_id = $4",
        )
        .bind(reservation.id)
        .bind(ReservationStatus::Expired.id())
        .bind(now)
        .bind(ReservationStatus::Active.id())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // An unlock (or another sweep pass) got here first: undo the
        // ledger decrement, which belongs to whoever owns the row now.
        if claimed == 0 {
            tx.rollback().await?;
            return Ok(ReclaimOutcome::AlreadyHandled);
        }

        tx.commit().await?;
        if released == 0 {
            // Reservation closed but the aggregate did not cover it;
            // surfacing this beats retrying it forever.
            Ok(ReclaimOutcome::HoldMismatch)
        } else {
            Ok(ReclaimOutcome::Reclaimed)
        }
    }
}

/// Result of [`StockRepo::reclaim_expired`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReclaimOutcome {
    /// Hold released and reservation marked expired.
    Reclaimed,
    /// The reservation was no longer active; nothing changed.
    AlreadyHandled,
    /// The reservation was closed but the ledger hold was smaller than
    /// its quantity -- the aggregate and the bookkeeping disagree.
    HoldMismatch,
}

/// Table holding the ledger columns for this unit.
fn ledger_table(unit: StockUnitRef) -> &'static str {
    if unit.is_variant() {
        "product_variants"
    } else {
        "products"
    }
}

/// Work out why a conditional update matched zero rows: missing unit,
/// discontinued unit, or genuinely not enough stock. Runs inside the
/// aborting transaction so it sees the same snapshot the update did.
async fn classify_failure(
    tx: &mut Transaction<'_, Postgres>,
    unit: StockUnitRef,
    requested: i32,
    checked: Checked,
) -> LedgerError {
    let table = ledger_table(unit);
    let query =
        format!("SELECT name, quantity, locked_quantity, is_available FROM {table} WHERE id = $1");
    let row: Result<Option<(String, i32, i32, bool)>, sqlx::Error> = sqlx::query_as(&query)
        .bind(unit.id())
        .fetch_optional(&mut **tx)
        .await;

    match row {
        Err(e) => e.into(),
        Ok(None) => StockError::NotFound { unit }.into(),
        Ok(Some((name, _, _, false))) => StockError::Unavailable { unit, name }.into(),
        Ok(Some((name, quantity, locked_quantity, true))) => {
            let available = match checked {
                Checked::FreeStock => quantity - locked_quantity,
                Checked::TotalStock => quantity,
                Checked::HeldStock => locked_quantity,
            };
            StockError::InsufficientStock {
                unit,
                name,
                requested,
                available,
            }
            .into()
        }
    }
}
