//! Token resolution: user ids to live delivery tokens.

use vigil_common::error::AppError;

use crate::store::{AlertStore, MAX_ID_FILTER};

/// Resolves user identifiers to the delivery tokens registered for them.
pub struct TokenResolver;

impl TokenResolver {
    /// Resolve `user_ids` to delivery tokens.
    ///
    /// Lookups run in chunks of [`MAX_ID_FILTER`] to stay inside the
    /// registry's inclusion-filter cap. Users without a usable token are
    /// skipped; duplicate tokens are kept as found, since the transport
    /// treats each entry as an independent attempt.
    pub async fn resolve(
        store: &dyn AlertStore,
        user_ids: &[String],
    ) -> Result<Vec<String>, AppError> {
        let mut tokens = Vec::new();

        for chunk in user_ids.chunks(MAX_ID_FILTER) {
            let records = store.tokens_for_users(chunk).await?;
            tokens.extend(
                records
                    .into_iter()
                    .filter_map(|record| record.token.filter(|token| !token.is_empty())),
            );
        }

        tracing::debug!(
            requested = user_ids.len(),
            resolved = tokens.len(),
            "Resolved delivery tokens"
        );
        Ok(tokens)
    }
}
