//! Verification webhook orchestration.
//!
//! Normalizes an inbound provider callback, applies the status transition to
//! the volunteer profile, and notifies the volunteer's device. Unknown
//! payload shapes and unresolvable subjects are acknowledged upstream and
//! dropped here; store and transport faults propagate to the handler.

use serde_json::Value;

use vigil_common::error::AppError;
use vigil_common::types::{AlertKind, VerificationLevel, VerificationOutcome, VerificationUpdate};
use vigil_providers::{ProviderRegistry, SubjectRef};
use vigil_push::PushTransport;
use vigil_push::envelope::MessageBuilder;

use crate::store::AlertStore;

/// What a webhook delivery amounted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// A volunteer profile was updated (and its device notified, if linked).
    Applied {
        volunteer_id: String,
        outcome: VerificationOutcome,
    },
    /// Unknown shape or unresolved subject; dropped without a write.
    Ignored,
}

/// Applies normalized verification webhooks.
pub struct VerificationService;

impl VerificationService {
    /// Normalize `payload` and apply the resulting status transition.
    pub async fn apply_webhook(
        store: &dyn AlertStore,
        push: &dyn PushTransport,
        payload: &Value,
    ) -> Result<WebhookDisposition, AppError> {
        let registry = ProviderRegistry::new();
        let Some(event) = registry.normalize(payload) else {
            tracing::info!("Verification webhook matched no known provider; dropping");
            return Ok(WebhookDisposition::Ignored);
        };

        let volunteer_id = match &event.subject {
            SubjectRef::Volunteer(id) => Some(id.clone()),
            SubjectRef::Report(report_id) => store
                .volunteer_by_report(report_id)
                .await?
                .map(|volunteer| volunteer.id),
        };
        let Some(volunteer_id) = volunteer_id else {
            tracing::warn!(
                provider = %event.provider,
                "No volunteer matches the webhook subject; dropping"
            );
            return Ok(WebhookDisposition::Ignored);
        };

        let level = match event.outcome {
            VerificationOutcome::Cleared => VerificationLevel::BackgroundChecked,
            VerificationOutcome::ReviewRequired => VerificationLevel::IdVerified,
        };
        store
            .apply_verification(
                &volunteer_id,
                &VerificationUpdate {
                    status: event.outcome,
                    provider: event.provider,
                    result: event.raw.clone(),
                    level,
                },
            )
            .await?;

        tracing::info!(
            volunteer_id = %volunteer_id,
            provider = %event.provider,
            outcome = %event.outcome,
            "Volunteer verification updated"
        );

        Self::notify_volunteer(store, push, &volunteer_id, event.outcome).await?;

        Ok(WebhookDisposition::Applied {
            volunteer_id,
            outcome: event.outcome,
        })
    }

    /// Tell the volunteer's device about the verdict. A profile without a
    /// linked user or registered token is skipped silently; a rejected or
    /// faulted send surfaces as a transport error after the profile update
    /// already landed.
    async fn notify_volunteer(
        store: &dyn AlertStore,
        push: &dyn PushTransport,
        volunteer_id: &str,
        outcome: VerificationOutcome,
    ) -> Result<(), AppError> {
        let Some(volunteer) = store.volunteer(volunteer_id).await? else {
            return Ok(());
        };
        let Some(user_id) = volunteer.user_id else {
            return Ok(());
        };
        let Some(token) = store.token_for_user(&user_id).await? else {
            return Ok(());
        };

        let body = match outcome {
            VerificationOutcome::Cleared => {
                "Your background check is complete! You are now a verified volunteer."
            }
            VerificationOutcome::ReviewRequired => {
                "Your background check requires review. We will contact you shortly."
            }
        };

        let envelope = MessageBuilder::new(AlertKind::BgvUpdate)
            .title("Background Check Update")
            .body(body)
            .data("type", AlertKind::BgvUpdate.to_string())
            .data("status", outcome.to_string())
            .data("volunteer_id", volunteer_id)
            .build();

        let result = push.send_single(&token, &envelope).await?;
        if let Some(error) = result.error {
            return Err(AppError::Transport(format!(
                "Volunteer notification rejected: {error}"
            )));
        }

        tracing::info!(volunteer_id = %volunteer_id, "Volunteer notified of verification verdict");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakePush, RecordingStore};
    use serde_json::json;
    use vigil_common::types::Provider;
    use vigil_push::SendResult;

    fn idfy_cleared(volunteer_id: &str) -> Value {
        json!({
            "profile_id": format!("bgv_{volunteer_id}"),
            "status": "completed",
            "result": "clear",
        })
    }

    #[tokio::test]
    async fn test_cleared_webhook_upgrades_and_notifies() {
        let store = RecordingStore::new();
        store.seed_volunteer("123", Some("user-9"), None);
        store.register_token("user-9", Some("tok-9"));
        let push = FakePush::new();

        let disposition = VerificationService::apply_webhook(&store, &push, &idfy_cleared("123"))
            .await
            .unwrap();

        assert_eq!(
            disposition,
            WebhookDisposition::Applied {
                volunteer_id: "123".to_string(),
                outcome: VerificationOutcome::Cleared,
            }
        );

        let updates = store.verification_updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].0, "123");
        assert_eq!(updates[0].1.status, VerificationOutcome::Cleared);
        assert_eq!(updates[0].1.provider, Provider::Idfy);
        assert_eq!(updates[0].1.level, VerificationLevel::BackgroundChecked);

        let singles = push.single_calls.lock().unwrap();
        assert_eq!(singles.len(), 1);
        assert_eq!(singles[0].0, "tok-9");
        assert!(singles[0].1.notification.body.contains("verified volunteer"));
        assert_eq!(singles[0].1.data["status"], "cleared");
    }

    #[tokio::test]
    async fn test_review_webhook_keeps_id_verified_level() {
        let store = RecordingStore::new();
        store.seed_volunteer("123", Some("user-9"), None);
        store.register_token("user-9", Some("tok-9"));
        let push = FakePush::new();
        let payload = json!({
            "profile_id": "bgv_123",
            "status": "completed",
            "result": "consider",
        });

        VerificationService::apply_webhook(&store, &push, &payload).await.unwrap();

        let updates = store.verification_updates.lock().unwrap();
        assert_eq!(updates[0].1.status, VerificationOutcome::ReviewRequired);
        assert_eq!(updates[0].1.level, VerificationLevel::IdVerified);

        let singles = push.single_calls.lock().unwrap();
        assert!(singles[0].1.notification.body.contains("requires review"));
    }

    #[tokio::test]
    async fn test_unknown_shape_is_ignored_without_writes() {
        let store = RecordingStore::new();
        let push = FakePush::new();
        let payload = json!({ "event": "ping" });

        let disposition = VerificationService::apply_webhook(&store, &push, &payload)
            .await
            .unwrap();

        assert_eq!(disposition, WebhookDisposition::Ignored);
        assert!(store.verification_updates.lock().unwrap().is_empty());
        assert!(push.single_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_report_subject_resolves_through_stored_reference() {
        let store = RecordingStore::new();
        store.seed_volunteer("321", Some("user-3"), Some("rep_77"));
        store.register_token("user-3", Some("tok-3"));
        let push = FakePush::new();
        let payload = json!({
            "data": { "object": { "report_id": "rep_77", "status": "clear" } },
        });

        let disposition = VerificationService::apply_webhook(&store, &push, &payload)
            .await
            .unwrap();

        assert_eq!(
            disposition,
            WebhookDisposition::Applied {
                volunteer_id: "321".to_string(),
                outcome: VerificationOutcome::Cleared,
            }
        );
    }

    #[tokio::test]
    async fn test_unresolvable_report_is_ignored() {
        let store = RecordingStore::new();
        let push = FakePush::new();
        let payload = json!({
            "data": { "object": { "report_id": "rep_unknown", "status": "clear" } },
        });

        let disposition = VerificationService::apply_webhook(&store, &push, &payload)
            .await
            .unwrap();

        assert_eq!(disposition, WebhookDisposition::Ignored);
        assert!(store.verification_updates.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unlinked_profile_updates_without_notifying() {
        let store = RecordingStore::new();
        store.seed_volunteer("123", None, None);
        let push = FakePush::new();

        let disposition = VerificationService::apply_webhook(&store, &push, &idfy_cleared("123"))
            .await
            .unwrap();

        assert!(matches!(disposition, WebhookDisposition::Applied { .. }));
        assert_eq!(store.verification_updates.lock().unwrap().len(), 1);
        assert!(push.single_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_notification_faults_after_update() {
        let store = RecordingStore::new();
        store.seed_volunteer("123", Some("user-9"), None);
        store.register_token("user-9", Some("tok-9"));
        let push = FakePush::new();
        push.script_single(SendResult::rejected("NotRegistered"));

        let err = VerificationService::apply_webhook(&store, &push, &idfy_cleared("123"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Transport(_)));
        // The profile update is not rolled back by a notification failure.
        assert_eq!(store.verification_updates.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_volunteer_row_updates_nothing_but_applies() {
        // Subject decodes to a volunteer id that has no profile row: the
        // update write is a no-op upsert target and notification is skipped.
        let store = RecordingStore::new();
        let push = FakePush::new();

        let disposition = VerificationService::apply_webhook(&store, &push, &idfy_cleared("404"))
            .await
            .unwrap();

        assert!(matches!(disposition, WebhookDisposition::Applied { .. }));
        assert!(push.single_calls.lock().unwrap().is_empty());
    }
}
