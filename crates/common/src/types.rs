use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Classes of alert traffic, each mapped to its own device channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    SosAlert,
    EscortRequest,
    BgvUpdate,
    Generic,
}

impl AlertKind {
    /// Classify the `type` data attribute of a queued notification.
    /// Unknown or missing values fall back to `Generic`.
    pub fn parse(value: &str) -> Self {
        match value {
            "sos_alert" => AlertKind::SosAlert,
            "escort_request" => AlertKind::EscortRequest,
            "bgv_update" => AlertKind::BgvUpdate,
            _ => AlertKind::Generic,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertKind::SosAlert => write!(f, "sos_alert"),
            AlertKind::EscortRequest => write!(f, "escort_request"),
            AlertKind::BgvUpdate => write!(f, "bgv_update"),
            AlertKind::Generic => write!(f, "generic"),
        }
    }
}

/// Delivery urgency for a push message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessagePriority {
    Normal,
    High,
}

impl MessagePriority {
    /// Parse the stored priority string; anything but "high" is normal.
    pub fn parse(value: &str) -> Self {
        if value == "high" {
            MessagePriority::High
        } else {
            MessagePriority::Normal
        }
    }

    pub fn is_high(self) -> bool {
        matches!(self, MessagePriority::High)
    }
}

/// Lifecycle of a queued notification. `Pending` is the only non-terminal
/// state; a row never leaves a terminal state again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Sent,
    NoTokens,
    Error,
}

/// Normalized verdict of a background-check provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Cleared,
    ReviewRequired,
}

/// How far a volunteer has progressed through identity verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VerificationLevel {
    IdVerified,
    BackgroundChecked,
}

/// Supported background-check providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Idfy,
    Ongrid,
    Checkr,
}

/// A notification row awaiting (or finished with) dispatch.
///
/// Tokens are resolved by the producer at enqueue time; `tokens` is a JSON
/// array of delivery tokens and `data` a flat string-to-string object.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct QueuedNotification {
    pub id: Uuid,
    pub tokens: serde_json::Value,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
    pub priority: String,
    pub status: QueueStatus,
    pub success_count: Option<i32>,
    pub failure_count: Option<i32>,
    pub error_detail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// A persisted SOS alert with its delivery accounting.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SosAlert {
    pub id: Uuid,
    pub sender_id: String,
    pub sender_name: String,
    pub sender_phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub message: Option<String>,
    pub contact_ids: serde_json::Value,
    pub status: String,
    pub sent_count: Option<i32>,
    pub total_recipients: Option<i32>,
    pub notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insert parameters for a new SOS alert record.
#[derive(Debug, Clone)]
pub struct NewSosAlert {
    pub sender_id: String,
    pub sender_name: String,
    pub sender_phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub message: Option<String>,
    pub contact_ids: Vec<String>,
}

/// A volunteer profile tracked through background verification.
///
/// `user_id` links the profile to the account holding the device token;
/// unlinked profiles exist while onboarding is incomplete.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Volunteer {
    pub id: String,
    pub user_id: Option<String>,
    pub background_check_id: Option<String>,
    pub background_check_status: Option<VerificationOutcome>,
    pub bgv_provider: Option<Provider>,
    pub bgv_completed_at: Option<DateTime<Utc>>,
    pub bgv_result: Option<serde_json::Value>,
    pub verification_level: Option<VerificationLevel>,
}

/// One row of the device-token registry.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TokenRecord {
    pub user_id: String,
    pub token: Option<String>,
}

/// Aggregate accounting for one multicast dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    pub attempted: u32,
    pub success_count: u32,
    pub failure_count: u32,
}

/// Status transition applied to a volunteer after a verification webhook.
#[derive(Debug, Clone)]
pub struct VerificationUpdate {
    pub status: VerificationOutcome,
    pub provider: Provider,
    pub result: serde_json::Value,
    pub level: VerificationLevel,
}

/// Terminal outcome of processing one queued notification.
#[derive(Debug, Clone, PartialEq)]
pub enum QueueOutcome {
    /// At least one token was attempted; delivery may be partial.
    Sent(DeliveryStats),
    /// The stored token array was empty.
    NoTokens,
    /// Dispatch faulted or the row content was malformed.
    Failed(String),
}

impl QueueOutcome {
    pub fn status(&self) -> QueueStatus {
        match self {
            QueueOutcome::Sent(_) => QueueStatus::Sent,
            QueueOutcome::NoTokens => QueueStatus::NoTokens,
            QueueOutcome::Failed(_) => QueueStatus::Error,
        }
    }
}

impl std::fmt::Display for MessagePriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessagePriority::Normal => write!(f, "normal"),
            MessagePriority::High => write!(f, "high"),
        }
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueStatus::Pending => write!(f, "pending"),
            QueueStatus::Sent => write!(f, "sent"),
            QueueStatus::NoTokens => write!(f, "no_tokens"),
            QueueStatus::Error => write!(f, "error"),
        }
    }
}

impl std::fmt::Display for VerificationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationOutcome::Cleared => write!(f, "cleared"),
            VerificationOutcome::ReviewRequired => write!(f, "review_required"),
        }
    }
}

impl std::fmt::Display for VerificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationLevel::IdVerified => write!(f, "id_verified"),
            VerificationLevel::BackgroundChecked => write!(f, "background_checked"),
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provider::Idfy => write!(f, "idfy"),
            Provider::Ongrid => write!(f, "ongrid"),
            Provider::Checkr => write!(f, "checkr"),
        }
    }
}
