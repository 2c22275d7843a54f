//! Queued-notification processing.
//!
//! Takes a pending queue row through its whole lifecycle: parse the stored
//! recipients and attributes, build the envelope, dispatch, retire rejected
//! tokens, and record the terminal status. A row reaches exactly one of
//! `sent`, `no_tokens` or `error` and never leaves it.

use std::collections::BTreeMap;

use serde_json::Value;

use vigil_common::error::AppError;
use vigil_common::types::{AlertKind, MessagePriority, QueueOutcome, QueuedNotification};
use vigil_push::PushTransport;
use vigil_push::envelope::MessageBuilder;

use crate::dispatcher::Dispatcher;
use crate::reconciler::TokenReconciler;
use crate::store::AlertStore;

/// Processes queued notifications to their terminal status.
pub struct QueueProcessor;

impl QueueProcessor {
    /// Process one queue row end to end and persist its terminal status.
    ///
    /// Dispatch faults and malformed row content terminate the row as
    /// `error` carrying the fault message; partial delivery failure still
    /// terminates as `sent`. Only the completion write itself can fail this
    /// function, leaving the row pending for a later sweep.
    pub async fn process(
        store: &dyn AlertStore,
        push: &dyn PushTransport,
        item: &QueuedNotification,
    ) -> Result<QueueOutcome, AppError> {
        let outcome = match Self::run(store, push, item).await {
            Ok(outcome) => outcome,
            Err(e) => QueueOutcome::Failed(e.to_string()),
        };

        let applied = store.complete_notification(item.id, &outcome).await?;
        if applied {
            tracing::info!(
                notification_id = %item.id,
                status = %outcome.status(),
                "Notification processed"
            );
        } else {
            tracing::warn!(
                notification_id = %item.id,
                "Queue row already completed; outcome dropped"
            );
        }

        Ok(outcome)
    }

    async fn run(
        store: &dyn AlertStore,
        push: &dyn PushTransport,
        item: &QueuedNotification,
    ) -> Result<QueueOutcome, AppError> {
        let tokens = Self::recipient_tokens(item)?;
        if tokens.is_empty() {
            return Ok(QueueOutcome::NoTokens);
        }

        let data = Self::data_attributes(item)?;
        let kind = data
            .get("type")
            .map(|value| AlertKind::parse(value))
            .unwrap_or(AlertKind::Generic);

        let envelope = MessageBuilder::new(kind)
            .title(&item.title)
            .body(&item.body)
            .data_map(data)
            .priority(MessagePriority::parse(&item.priority))
            .build();

        let report = Dispatcher::send(push, &tokens, &envelope).await?;

        if !report.failed_tokens.is_empty()
            && let Err(e) = TokenReconciler::retire(store, &report.failed_tokens).await
        {
            // Reconciliation is best-effort; it must not downgrade a
            // completed dispatch.
            tracing::warn!(
                notification_id = %item.id,
                error = %e,
                "Token reconciliation failed"
            );
        }

        Ok(QueueOutcome::Sent(report.stats))
    }

    /// Parse the stored recipient token array.
    fn recipient_tokens(item: &QueuedNotification) -> Result<Vec<String>, AppError> {
        let Value::Array(raw) = &item.tokens else {
            return Err(AppError::Validation(
                "Queued notification tokens must be a JSON array".to_string(),
            ));
        };

        raw.iter()
            .map(|value| {
                value.as_str().map(str::to_string).ok_or_else(|| {
                    AppError::Validation(
                        "Queued notification tokens must be strings".to_string(),
                    )
                })
            })
            .collect()
    }

    /// Parse the stored data attributes into a flat string map.
    fn data_attributes(item: &QueuedNotification) -> Result<BTreeMap<String, String>, AppError> {
        match &item.data {
            Value::Null => Ok(BTreeMap::new()),
            Value::Object(map) => map
                .iter()
                .map(|(key, value)| {
                    value
                        .as_str()
                        .map(|s| (key.clone(), s.to_string()))
                        .ok_or_else(|| {
                            AppError::Validation(format!(
                                "Queued notification data attribute '{key}' must be a string"
                            ))
                        })
                })
                .collect(),
            _ => Err(AppError::Validation(
                "Queued notification data must be a JSON object".to_string(),
            )),
        }
    }
}
