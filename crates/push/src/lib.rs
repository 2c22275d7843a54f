//! Push delivery: the cross-platform message envelope and the gateway
//! transport used to send it.
//!
//! `PushTransport` is the seam between orchestration and the wire; the
//! production implementation is [`fcm::FcmClient`], and tests substitute
//! scripted fakes.

pub mod envelope;
pub mod fcm;

use async_trait::async_trait;
use serde::Deserialize;

use vigil_common::error::AppError;

use crate::envelope::MessageEnvelope;

/// Outcome of one delivery attempt within a multicast batch.
///
/// Exactly one of `message_id` / `error` is set by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SendResult {
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl SendResult {
    pub fn delivered(message_id: impl Into<String>) -> Self {
        Self {
            message_id: Some(message_id.into()),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            message_id: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Gateway response to a multicast send.
///
/// `results[i]` reports the outcome for the i-th token of the request;
/// callers rely on that index correspondence for accounting.
#[derive(Debug, Clone, Deserialize)]
pub struct MulticastResponse {
    pub results: Vec<SendResult>,
}

/// Transport seam for delivering envelopes to devices.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Send one envelope to many tokens in a single gateway call.
    async fn send_multicast(
        &self,
        tokens: &[String],
        envelope: &MessageEnvelope,
    ) -> Result<MulticastResponse, AppError>;

    /// Send one envelope to a single token.
    async fn send_single(
        &self,
        token: &str,
        envelope: &MessageEnvelope,
    ) -> Result<SendResult, AppError>;
}
