//! In-memory fakes shared by the engine unit tests.
//!
//! `RecordingStore` keeps registry, queue and volunteer state in maps and
//! records every mutating call; `FakePush` returns scripted gateway results
//! and captures the envelopes it was asked to send.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

use vigil_common::error::AppError;
use vigil_common::types::{
    DeliveryStats, NewSosAlert, QueueOutcome, QueuedNotification, TokenRecord, VerificationUpdate,
    Volunteer,
};
use vigil_push::envelope::{MessageBuilder, MessageEnvelope};
use vigil_push::{MulticastResponse, PushTransport, SendResult};

use crate::store::{AlertStore, MAX_ID_FILTER};

pub fn tokens(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub fn sample_envelope() -> MessageEnvelope {
    MessageBuilder::new(vigil_common::types::AlertKind::Generic)
        .title("Test title")
        .body("Test body")
        .build()
}

pub fn queued_item(tokens: Value, data: Value) -> QueuedNotification {
    QueuedNotification {
        id: Uuid::new_v4(),
        tokens,
        title: "Test title".to_string(),
        body: "Test body".to_string(),
        data,
        priority: "normal".to_string(),
        status: vigil_common::types::QueueStatus::Pending,
        success_count: None,
        failure_count: None,
        error_detail: None,
        created_at: Utc::now(),
        processed_at: None,
    }
}

/// In-memory `AlertStore` that records every call.
#[derive(Default)]
pub struct RecordingStore {
    pub registry: Mutex<BTreeMap<String, Option<String>>>,
    pub volunteers: Mutex<BTreeMap<String, Volunteer>>,
    pub pending: Mutex<Vec<QueuedNotification>>,
    pub lookup_batches: Mutex<Vec<Vec<String>>>,
    pub deleted_batches: Mutex<Vec<Vec<String>>>,
    pub completed: Mutex<Vec<(Uuid, QueueOutcome)>>,
    pub purges: Mutex<Vec<(DateTime<Utc>, i64)>>,
    pub alerts: Mutex<Vec<NewSosAlert>>,
    pub alert_stats: Mutex<Vec<(Uuid, DeliveryStats)>>,
    pub verification_updates: Mutex<Vec<(String, VerificationUpdate)>>,
    fail_delete: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_token(&self, user_id: &str, token: Option<&str>) {
        self.registry
            .lock()
            .unwrap()
            .insert(user_id.to_string(), token.map(str::to_string));
    }

    pub fn seed_volunteer(
        &self,
        id: &str,
        user_id: Option<&str>,
        background_check_id: Option<&str>,
    ) {
        self.volunteers.lock().unwrap().insert(
            id.to_string(),
            Volunteer {
                id: id.to_string(),
                user_id: user_id.map(str::to_string),
                background_check_id: background_check_id.map(str::to_string),
                background_check_status: None,
                bgv_provider: None,
                bgv_completed_at: None,
                bgv_result: None,
                verification_level: None,
            },
        );
    }

    /// Make every subsequent `delete_tokens` call fail.
    pub fn fail_deletes(&self) {
        self.fail_delete.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl AlertStore for RecordingStore {
    async fn tokens_for_users(&self, user_ids: &[String]) -> Result<Vec<TokenRecord>, AppError> {
        if user_ids.len() > MAX_ID_FILTER {
            return Err(AppError::Validation(format!(
                "Registry lookups accept at most {MAX_ID_FILTER} ids per query"
            )));
        }
        self.lookup_batches.lock().unwrap().push(user_ids.to_vec());

        let registry = self.registry.lock().unwrap();
        Ok(registry
            .iter()
            .filter(|(user_id, _)| user_ids.contains(user_id))
            .map(|(user_id, token)| TokenRecord {
                user_id: user_id.clone(),
                token: token.clone(),
            })
            .collect())
    }

    async fn token_for_user(&self, user_id: &str) -> Result<Option<String>, AppError> {
        Ok(self
            .registry
            .lock()
            .unwrap()
            .get(user_id)
            .cloned()
            .flatten()
            .filter(|token| !token.is_empty()))
    }

    async fn delete_tokens(&self, tokens: &[String]) -> Result<u64, AppError> {
        if self.fail_delete.load(Ordering::SeqCst) {
            return Err(AppError::Internal("injected delete failure".to_string()));
        }
        if tokens.len() > MAX_ID_FILTER {
            return Err(AppError::Validation(format!(
                "Token deletes accept at most {MAX_ID_FILTER} tokens per batch"
            )));
        }
        self.deleted_batches.lock().unwrap().push(tokens.to_vec());

        let mut registry = self.registry.lock().unwrap();
        let before = registry.len();
        registry.retain(|_, token| !matches!(token, Some(t) if tokens.contains(t)));
        Ok((before - registry.len()) as u64)
    }

    async fn pending_notifications(&self, limit: i64) -> Result<Vec<QueuedNotification>, AppError> {
        let pending = self.pending.lock().unwrap();
        Ok(pending.iter().take(limit as usize).cloned().collect())
    }

    async fn complete_notification(
        &self,
        id: Uuid,
        outcome: &QueueOutcome,
    ) -> Result<bool, AppError> {
        let mut completed = self.completed.lock().unwrap();
        if completed.iter().any(|(done, _)| *done == id) {
            return Ok(false);
        }
        completed.push((id, outcome.clone()));
        self.pending.lock().unwrap().retain(|item| item.id != id);
        Ok(true)
    }

    async fn purge_queue_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<u64, AppError> {
        self.purges.lock().unwrap().push((cutoff, limit));

        let mut pending = self.pending.lock().unwrap();
        let mut deleted = 0u64;
        pending.retain(|item| {
            if item.created_at < cutoff && (deleted as i64) < limit {
                deleted += 1;
                false
            } else {
                true
            }
        });
        Ok(deleted)
    }

    async fn insert_sos_alert(&self, alert: &NewSosAlert) -> Result<Uuid, AppError> {
        self.alerts.lock().unwrap().push(alert.clone());
        Ok(Uuid::new_v4())
    }

    async fn record_alert_delivery(
        &self,
        alert_id: Uuid,
        stats: &DeliveryStats,
    ) -> Result<(), AppError> {
        self.alert_stats.lock().unwrap().push((alert_id, *stats));
        Ok(())
    }

    async fn volunteer(&self, volunteer_id: &str) -> Result<Option<Volunteer>, AppError> {
        Ok(self.volunteers.lock().unwrap().get(volunteer_id).cloned())
    }

    async fn volunteer_by_report(&self, report_id: &str) -> Result<Option<Volunteer>, AppError> {
        Ok(self
            .volunteers
            .lock()
            .unwrap()
            .values()
            .find(|volunteer| volunteer.background_check_id.as_deref() == Some(report_id))
            .cloned())
    }

    async fn apply_verification(
        &self,
        volunteer_id: &str,
        update: &VerificationUpdate,
    ) -> Result<(), AppError> {
        self.verification_updates
            .lock()
            .unwrap()
            .push((volunteer_id.to_string(), update.clone()));

        if let Some(volunteer) = self.volunteers.lock().unwrap().get_mut(volunteer_id) {
            volunteer.background_check_status = Some(update.status);
            volunteer.bgv_provider = Some(update.provider);
            volunteer.bgv_completed_at = Some(Utc::now());
            volunteer.bgv_result = Some(update.result.clone());
            volunteer.verification_level = Some(update.level);
        }
        Ok(())
    }
}

/// Scripted `PushTransport` that records every call.
#[derive(Default)]
pub struct FakePush {
    pub multicast_calls: Mutex<Vec<(Vec<String>, MessageEnvelope)>>,
    pub single_calls: Mutex<Vec<(String, MessageEnvelope)>>,
    multicast_script: Mutex<Option<Vec<SendResult>>>,
    multicast_error: Mutex<Option<String>>,
    single_script: Mutex<Option<SendResult>>,
}

impl FakePush {
    pub fn new() -> Self {
        Self::default()
    }

    /// Per-token results returned by the next multicast calls.
    pub fn script_multicast(&self, results: Vec<SendResult>) {
        *self.multicast_script.lock().unwrap() = Some(results);
    }

    /// Make multicast calls fail outright.
    pub fn fail_multicast(&self, message: &str) {
        *self.multicast_error.lock().unwrap() = Some(message.to_string());
    }

    /// Result returned by single sends (default: delivered).
    pub fn script_single(&self, result: SendResult) {
        *self.single_script.lock().unwrap() = Some(result);
    }
}

#[async_trait]
impl PushTransport for FakePush {
    async fn send_multicast(
        &self,
        tokens: &[String],
        envelope: &MessageEnvelope,
    ) -> Result<MulticastResponse, AppError> {
        if let Some(message) = self.multicast_error.lock().unwrap().clone() {
            return Err(AppError::Transport(message));
        }

        self.multicast_calls
            .lock()
            .unwrap()
            .push((tokens.to_vec(), envelope.clone()));

        let results = match self.multicast_script.lock().unwrap().clone() {
            Some(results) => results,
            None => (0..tokens.len())
                .map(|i| SendResult::delivered(format!("m:{i}")))
                .collect(),
        };
        Ok(MulticastResponse { results })
    }

    async fn send_single(
        &self,
        token: &str,
        envelope: &MessageEnvelope,
    ) -> Result<SendResult, AppError> {
        self.single_calls
            .lock()
            .unwrap()
            .push((token.to_string(), envelope.clone()));

        Ok(self
            .single_script
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| SendResult::delivered("m:1")))
    }
}
