//! Multicast dispatch with per-recipient accounting.

use vigil_common::error::AppError;
use vigil_common::types::DeliveryStats;
use vigil_push::PushTransport;
use vigil_push::envelope::MessageEnvelope;

/// Outcome of one dispatch: aggregate counts plus the tokens the gateway
/// rejected, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchReport {
    pub stats: DeliveryStats,
    pub failed_tokens: Vec<String>,
}

/// Sends one envelope to a resolved token set.
pub struct Dispatcher;

impl Dispatcher {
    /// Dispatch `envelope` to `tokens` in a single multicast call.
    ///
    /// An empty token set short-circuits to a zero report without touching
    /// the transport. Per-token outcomes map back to input positions, so the
    /// gateway must return exactly one result per attempted token; anything
    /// else is a transport fault.
    pub async fn send(
        push: &dyn PushTransport,
        tokens: &[String],
        envelope: &MessageEnvelope,
    ) -> Result<DispatchReport, AppError> {
        if tokens.is_empty() {
            return Ok(DispatchReport::default());
        }

        let response = push.send_multicast(tokens, envelope).await?;
        if response.results.len() != tokens.len() {
            return Err(AppError::Transport(format!(
                "Gateway returned {} results for {} tokens",
                response.results.len(),
                tokens.len()
            )));
        }

        let mut failed_tokens = Vec::new();
        let mut success_count = 0u32;
        for (token, result) in tokens.iter().zip(&response.results) {
            if result.is_success() {
                success_count += 1;
            } else {
                tracing::debug!(
                    token = %token,
                    error = result.error.as_deref().unwrap_or("unknown"),
                    "Delivery rejected"
                );
                failed_tokens.push(token.clone());
            }
        }

        let stats = DeliveryStats {
            attempted: tokens.len() as u32,
            success_count,
            failure_count: failed_tokens.len() as u32,
        };

        tracing::info!(
            attempted = stats.attempted,
            delivered = stats.success_count,
            failed = stats.failure_count,
            "Multicast dispatch complete"
        );

        Ok(DispatchReport { stats, failed_tokens })
    }
}
