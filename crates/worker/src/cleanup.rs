use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;

use vigil_common::error::AppError;
use vigil_engine::store::AlertStore;

/// Queue rows older than this many days are deleted.
const RETENTION_DAYS: i64 = 7;

/// Upper bound on rows deleted per pruning pass.
const CLEANUP_BATCH: i64 = 500;

/// How often the pruning pass runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Periodic pruning of aged notification queue rows.
pub struct QueueCleanup {
    store: Arc<dyn AlertStore>,
}

impl QueueCleanup {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    /// Run the pruning loop. The first pass fires one full interval after
    /// startup, then every interval after that.
    pub async fn run(&self) {
        let mut ticker = tokio::time::interval(CLEANUP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // interval yields immediately on the first tick; consume it so the
        // worker does not prune at startup
        ticker.tick().await;

        tracing::info!(
            retention_days = RETENTION_DAYS,
            batch = CLEANUP_BATCH,
            "Queue cleanup scheduled"
        );

        loop {
            ticker.tick().await;
            match self.run_once().await {
                Ok(0) => {
                    tracing::debug!("Queue cleanup found nothing to delete");
                }
                Ok(deleted) => {
                    tracing::info!(deleted, "Pruned aged queue rows");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Queue cleanup failed");
                }
            }
        }
    }

    /// Delete one batch of rows older than the retention window.
    pub async fn run_once(&self) -> Result<u64, AppError> {
        let cutoff = Utc::now() - chrono::Duration::days(RETENTION_DAYS);
        self.store.purge_queue_before(cutoff, CLEANUP_BATCH).await
    }
}
