//! Periodic release of expired stock reservations.
//!
//! Locks acquired at cart time expire after a fixed window; a client that
//! abandons checkout (or crashes) never calls unlock, so this sweep is
//! the backstop that returns held stock to availability. Runs on a fixed
//! interval using `tokio::time::interval` and is also triggerable
//! on demand from the admin API; both paths share one [`SweeperHandle`]
//! so only one pass runs at a time and the last run's stats stay
//! queryable.
//!
//! The pass itself takes `now` as an argument so tests can sweep against
//! an arbitrary clock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use vitrine_core::types::Timestamp;
use vitrine_db::repositories::reservation_repo::SWEEP_BATCH_LIMIT;
use vitrine_db::repositories::{ReclaimOutcome, ReservationRepo, StockRepo};
use vitrine_db::DbPool;

/// Stats from one sweep pass.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    /// The `now` the pass compared deadlines against.
    pub started_at: Timestamp,
    /// Expired product reservations examined.
    pub products_checked: u32,
    /// Expired variant reservations examined.
    pub variants_checked: u32,
    /// Product reservations whose hold was released.
    pub products_unlocked: u32,
    /// Variant reservations whose hold was released.
    pub variants_unlocked: u32,
    /// Total quantity returned to availability.
    pub total_quantity_released: i64,
    /// Per-reservation failures; the pass continues past them.
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Release every reservation whose deadline has passed `now`.
///
/// Each reservation is reclaimed in its own small transaction (guarded
/// ledger decrement + `active -> expired` flip), so a concurrent sweep
/// or unlock cannot release the same hold twice and a pass can stop at
/// any point without leaking. Per-unit failures are recorded and the
/// pass continues.
pub async fn sweep_expired_locks(pool: &DbPool, now: Timestamp) -> SweepReport {
    let clock = Instant::now();
    let mut report = SweepReport {
        started_at: now,
        products_checked: 0,
        variants_checked: 0,
        products_unlocked: 0,
        variants_unlocked: 0,
        total_quantity_released: 0,
        errors: Vec::new(),
        duration_ms: 0,
    };

    let expired = match ReservationRepo::find_expired(pool, now, SWEEP_BATCH_LIMIT).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!(error = %e, "Stock sweep: failed to list expired reservations");
            report.errors.push(format!("listing expired reservations: {e}"));
            report.duration_ms = clock.elapsed().as_millis() as u64;
            return report;
        }
    };

    for reservation in expired {
        let unit = reservation.unit();
        if unit.is_variant() {
            report.variants_checked += 1;
        } else {
            report.products_checked += 1;
        }

        match StockRepo::reclaim_expired(pool, &reservation, now).await {
            Ok(ReclaimOutcome::Reclaimed) => {
                if unit.is_variant() {
                    report.variants_unlocked += 1;
                } else {
                    report.products_unlocked += 1;
                }
                report.total_quantity_released += i64::from(reservation.quantity);
            }
            // Unlock or another pass already owned this reservation.
            Ok(ReclaimOutcome::AlreadyHandled) => {}
            Ok(ReclaimOutcome::HoldMismatch) => {
                report.errors.push(format!(
                    "ledger hold on {unit} smaller than reservation {} ({})",
                    reservation.id, reservation.quantity
                ));
            }
            Err(e) => {
                report
                    .errors
                    .push(format!("reclaiming reservation {} on {unit}: {e}", reservation.id));
            }
        }
    }

    report.duration_ms = clock.elapsed().as_millis() as u64;
    report
}

/// Shared sweeper state: the background loop and the manual admin trigger
/// both run passes through this, so concurrent passes are excluded and
/// the last report is queryable from the status endpoint.
pub struct SweeperHandle {
    enabled: bool,
    running: AtomicBool,
    last_report: Mutex<Option<SweepReport>>,
    last_manual_run: Mutex<Option<Instant>>,
}

/// Snapshot served by `GET /admin/inventory/sweep/status`.
#[derive(Debug, Clone, Serialize)]
pub struct SweeperStatus {
    /// Whether the background loop was spawned for this process.
    pub enabled: bool,
    /// Whether a pass is executing right now.
    pub running: bool,
    /// Stats from the most recent completed pass, if any.
    pub last_run: Option<SweepReport>,
}

impl SweeperHandle {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            running: AtomicBool::new(false),
            last_report: Mutex::new(None),
            last_manual_run: Mutex::new(None),
        }
    }

    /// Try to become the single executing pass. Returns `false` when a
    /// pass is already running.
    pub fn try_acquire(&self) -> bool {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Record a completed pass and release the running flag.
    pub fn finish(&self, report: SweepReport) {
        *self
            .last_report
            .lock()
            .expect("sweeper report mutex poisoned") = Some(report);
        self.running.store(false, Ordering::Release);
    }

    /// Enforce the minimum gap between manual triggers. On success the
    /// trigger time is recorded; on failure returns the seconds left.
    pub fn check_manual_interval(&self, min_interval: Duration) -> Result<(), u64> {
        let mut last = self
            .last_manual_run
            .lock()
            .expect("sweeper trigger mutex poisoned");
        if let Some(at) = *last {
            let since = at.elapsed();
            if since < min_interval {
                return Err((min_interval - since).as_secs().max(1));
            }
        }
        *last = Some(Instant::now());
        Ok(())
    }

    pub fn status(&self) -> SweeperStatus {
        SweeperStatus {
            enabled: self.enabled,
            running: self.running.load(Ordering::Acquire),
            last_run: self
                .last_report
                .lock()
                .expect("sweeper report mutex poisoned")
                .clone(),
        }
    }
}

/// Run the background sweep loop until `cancel` is triggered.
pub async fn run(
    pool: DbPool,
    handle: std::sync::Arc<SweeperHandle>,
    interval: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Stock sweeper started"
    );

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Stock sweeper stopping");
                break;
            }
            _ = ticker.tick() => {
                if !handle.try_acquire() {
                    tracing::debug!("Stock sweep already in progress, skipping tick");
                    continue;
                }
                let report = sweep_expired_locks(&pool, chrono::Utc::now()).await;
                let unlocked = report.products_unlocked + report.variants_unlocked;
                if unlocked > 0 || !report.errors.is_empty() {
                    tracing::info!(
                        unlocked,
                        quantity_released = report.total_quantity_released,
                        errors = report.errors.len(),
                        duration_ms = report.duration_ms,
                        "Stock sweep: released expired reservations"
                    );
                } else {
                    tracing::debug!("Stock sweep: nothing to release");
                }
                handle.finish(report);
            }
        }
    }
}
