//! Persistence seam for the dispatch engine.
//!
//! [`AlertStore`] abstracts the backing database so orchestrators can run
//! against in-memory fakes; [`PgStore`] is the PostgreSQL implementation the
//! binaries use. Registry lookups and batch deletes are capped at
//! [`MAX_ID_FILTER`] ids per call, mirroring the inclusion-filter limit of
//! the underlying query API.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use vigil_common::error::AppError;
use vigil_common::types::{
    DeliveryStats, NewSosAlert, QueueOutcome, QueueStatus, QueuedNotification, TokenRecord,
    VerificationUpdate, Volunteer,
};

/// Maximum identifiers accepted by one inclusion-filter query or batch
/// delete. Callers must chunk larger sets (see `TokenResolver`).
pub const MAX_ID_FILTER: usize = 10;

/// Durable state the engine reads and writes.
#[async_trait]
pub trait AlertStore: Send + Sync {
    /// Fetch registry rows for up to [`MAX_ID_FILTER`] user ids. Rows whose
    /// token column is NULL are returned as-is; filtering is the resolver's
    /// job.
    async fn tokens_for_users(&self, user_ids: &[String]) -> Result<Vec<TokenRecord>, AppError>;

    /// Fetch the live delivery token for one user. Empty tokens count as
    /// absent.
    async fn token_for_user(&self, user_id: &str) -> Result<Option<String>, AppError>;

    /// Delete every registry row whose token is in `tokens`, as one atomic
    /// batch of at most [`MAX_ID_FILTER`]. Returns the number of rows
    /// deleted.
    async fn delete_tokens(&self, tokens: &[String]) -> Result<u64, AppError>;

    /// Fetch up to `limit` pending queue rows, oldest first.
    async fn pending_notifications(&self, limit: i64) -> Result<Vec<QueuedNotification>, AppError>;

    /// Terminally complete a queue row. The write applies only while the row
    /// is still pending; returns `false` if some other sweep got there first.
    async fn complete_notification(&self, id: Uuid, outcome: &QueueOutcome)
    -> Result<bool, AppError>;

    /// Delete up to `limit` queue rows created before `cutoff`, oldest
    /// first. Returns the number of rows deleted.
    async fn purge_queue_before(&self, cutoff: DateTime<Utc>, limit: i64)
    -> Result<u64, AppError>;

    /// Persist a new SOS alert record in `active` status, returning its id.
    async fn insert_sos_alert(&self, alert: &NewSosAlert) -> Result<Uuid, AppError>;

    /// Record post-dispatch delivery accounting on an SOS alert.
    async fn record_alert_delivery(
        &self,
        alert_id: Uuid,
        stats: &DeliveryStats,
    ) -> Result<(), AppError>;

    /// Fetch a volunteer profile by id.
    async fn volunteer(&self, volunteer_id: &str) -> Result<Option<Volunteer>, AppError>;

    /// Fetch the volunteer holding an external background-check reference.
    async fn volunteer_by_report(&self, report_id: &str) -> Result<Option<Volunteer>, AppError>;

    /// Apply a normalized verification verdict to a volunteer profile.
    async fn apply_verification(
        &self,
        volunteer_id: &str,
        update: &VerificationUpdate,
    ) -> Result<(), AppError>;
}

/// PostgreSQL-backed store used by the API server and the worker.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlertStore for PgStore {
    async fn tokens_for_users(&self, user_ids: &[String]) -> Result<Vec<TokenRecord>, AppError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        if user_ids.len() > MAX_ID_FILTER {
            return Err(AppError::Validation(format!(
                "Registry lookups accept at most {MAX_ID_FILTER} ids per query"
            )));
        }

        let records = sqlx::query_as::<_, TokenRecord>(
            "SELECT user_id, token FROM device_tokens WHERE user_id = ANY($1)",
        )
        .bind(user_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    async fn token_for_user(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let row: Option<(Option<String>,)> =
            sqlx::query_as("SELECT token FROM device_tokens WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row
            .and_then(|(token,)| token)
            .filter(|token| !token.is_empty()))
    }

    async fn delete_tokens(&self, tokens: &[String]) -> Result<u64, AppError> {
        if tokens.is_empty() {
            return Ok(0);
        }
        if tokens.len() > MAX_ID_FILTER {
            return Err(AppError::Validation(format!(
                "Token deletes accept at most {MAX_ID_FILTER} tokens per batch"
            )));
        }

        let result = sqlx::query("DELETE FROM device_tokens WHERE token = ANY($1)")
            .bind(tokens)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn pending_notifications(&self, limit: i64) -> Result<Vec<QueuedNotification>, AppError> {
        let rows = sqlx::query_as::<_, QueuedNotification>(
            r#"
            SELECT id, tokens, title, body, data, priority, status,
                   success_count, failure_count, error_detail, created_at, processed_at
            FROM notification_queue
            WHERE status = $1
            ORDER BY created_at
            LIMIT $2
            "#,
        )
        .bind(QueueStatus::Pending)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn complete_notification(
        &self,
        id: Uuid,
        outcome: &QueueOutcome,
    ) -> Result<bool, AppError> {
        let (stats, error_detail) = match outcome {
            QueueOutcome::Sent(stats) => (Some(stats), None),
            QueueOutcome::NoTokens => (None, None),
            QueueOutcome::Failed(message) => (None, Some(message.as_str())),
        };

        let result = sqlx::query(
            r#"
            UPDATE notification_queue
            SET status = $1,
                success_count = $2,
                failure_count = $3,
                error_detail = $4,
                processed_at = NOW()
            WHERE id = $5 AND status = $6
            "#,
        )
        .bind(outcome.status())
        .bind(stats.map(|s| s.success_count as i32))
        .bind(stats.map(|s| s.failure_count as i32))
        .bind(error_detail)
        .bind(id)
        .bind(QueueStatus::Pending)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn purge_queue_before(
        &self,
        cutoff: DateTime<Utc>,
        limit: i64,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM notification_queue
            WHERE id IN (
                SELECT id FROM notification_queue
                WHERE created_at < $1
                ORDER BY created_at
                LIMIT $2
            )
            "#,
        )
        .bind(cutoff)
        .bind(limit)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn insert_sos_alert(&self, alert: &NewSosAlert) -> Result<Uuid, AppError> {
        let alert_id = Uuid::new_v4();

        sqlx::query(
            r#"
            INSERT INTO sos_alerts (
                id, sender_id, sender_name, sender_phone, latitude, longitude,
                address, message, contact_ids, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'active', NOW())
            "#,
        )
        .bind(alert_id)
        .bind(&alert.sender_id)
        .bind(&alert.sender_name)
        .bind(&alert.sender_phone)
        .bind(alert.latitude)
        .bind(alert.longitude)
        .bind(&alert.address)
        .bind(&alert.message)
        .bind(serde_json::json!(alert.contact_ids))
        .execute(&self.pool)
        .await?;

        Ok(alert_id)
    }

    async fn record_alert_delivery(
        &self,
        alert_id: Uuid,
        stats: &DeliveryStats,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE sos_alerts
            SET sent_count = $1, total_recipients = $2, notified_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(stats.success_count as i32)
        .bind(stats.attempted as i32)
        .bind(alert_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn volunteer(&self, volunteer_id: &str) -> Result<Option<Volunteer>, AppError> {
        let volunteer = sqlx::query_as::<_, Volunteer>(
            r#"
            SELECT id, user_id, background_check_id, background_check_status,
                   bgv_provider, bgv_completed_at, bgv_result, verification_level
            FROM volunteers
            WHERE id = $1
            "#,
        )
        .bind(volunteer_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(volunteer)
    }

    async fn volunteer_by_report(&self, report_id: &str) -> Result<Option<Volunteer>, AppError> {
        let volunteer = sqlx::query_as::<_, Volunteer>(
            r#"
            SELECT id, user_id, background_check_id, background_check_status,
                   bgv_provider, bgv_completed_at, bgv_result, verification_level
            FROM volunteers
            WHERE background_check_id = $1
            LIMIT 1
            "#,
        )
        .bind(report_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(volunteer)
    }

    async fn apply_verification(
        &self,
        volunteer_id: &str,
        update: &VerificationUpdate,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE volunteers
            SET background_check_status = $1,
                bgv_provider = $2,
                bgv_completed_at = NOW(),
                bgv_result = $3,
                verification_level = $4
            WHERE id = $5
            "#,
        )
        .bind(update.status)
        .bind(update.provider)
        .bind(&update.result)
        .bind(update.level)
        .bind(volunteer_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
