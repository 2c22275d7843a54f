//! Retirement of delivery tokens the gateway rejected.

use vigil_common::error::AppError;

use crate::store::{AlertStore, MAX_ID_FILTER};

/// Deletes registry rows for tokens reported as failed.
pub struct TokenReconciler;

impl TokenReconciler {
    /// Retire failed tokens in one atomic batch delete of at most
    /// [`MAX_ID_FILTER`] tokens.
    ///
    /// An oversized failure set is trimmed to its first batch. The remainder
    /// keeps failing on later dispatches and gets retired then, so skipping
    /// it costs wasted attempts, never correctness. Returns the number of
    /// registry rows deleted.
    pub async fn retire(
        store: &dyn AlertStore,
        failed_tokens: &[String],
    ) -> Result<u64, AppError> {
        if failed_tokens.is_empty() {
            return Ok(0);
        }

        let batch = &failed_tokens[..failed_tokens.len().min(MAX_ID_FILTER)];
        let deleted = store.delete_tokens(batch).await?;

        tracing::info!(
            deleted,
            batch = batch.len(),
            reported = failed_tokens.len(),
            "Retired failed delivery tokens"
        );
        Ok(deleted)
    }
}
