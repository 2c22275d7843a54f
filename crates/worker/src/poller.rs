use std::sync::Arc;
use std::time::Duration;

use vigil_engine::queue::QueueProcessor;
use vigil_engine::store::AlertStore;
use vigil_push::PushTransport;

/// Queue worker that continuously claims pending notifications and
/// dispatches them to the push gateway.
pub struct QueueWorker {
    store: Arc<dyn AlertStore>,
    push: Arc<dyn PushTransport>,
    poll_interval: Duration,
    batch_size: i64,
}

impl QueueWorker {
    pub fn new(
        store: Arc<dyn AlertStore>,
        push: Arc<dyn PushTransport>,
        poll_interval_ms: u64,
        batch_size: i64,
    ) -> Self {
        Self {
            store,
            push,
            poll_interval: Duration::from_millis(poll_interval_ms),
            batch_size,
        }
    }

    /// Start the polling loop. Runs indefinitely until the task is cancelled.
    pub async fn run(&self) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.batch_size,
            "Queue worker started"
        );

        loop {
            match self.drain_once().await {
                Ok(0) => {}
                Ok(processed) => {
                    tracing::info!(processed, "Queue sweep complete");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Queue sweep failed");
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Claim one batch of pending rows and settle each in turn.
    ///
    /// A failed row must not stall the rest of the batch, so per-row faults
    /// are logged and skipped; only the batch claim itself can fail here.
    pub async fn drain_once(&self) -> Result<usize, vigil_common::error::AppError> {
        let pending = self.store.pending_notifications(self.batch_size).await?;
        if pending.is_empty() {
            return Ok(0);
        }

        tracing::debug!(claimed = pending.len(), "Claimed pending notifications");

        let mut processed = 0;
        for item in &pending {
            match QueueProcessor::process(self.store.as_ref(), self.push.as_ref(), item).await {
                Ok(_) => processed += 1,
                Err(e) => {
                    tracing::error!(
                        notification_id = %item.id,
                        error = %e,
                        "Queue item left pending for a later sweep"
                    );
                }
            }
        }

        Ok(processed)
    }
}
