//! FCM legacy HTTP transport.
//!
//! Speaks the multicast wire format: the envelope plus a `registration_ids`
//! array (or `to` for a single device), authorized with the server key. The
//! gateway answers with per-token results in request order.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use vigil_common::error::AppError;

use crate::envelope::MessageEnvelope;
use crate::{MulticastResponse, PushTransport, SendResult};

/// Upper bound on one gateway round trip.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client for the push gateway.
pub struct FcmClient {
    http: Client,
    gateway_url: String,
    server_key: String,
}

impl FcmClient {
    pub fn new(gateway_url: impl Into<String>, server_key: impl Into<String>) -> Result<Self, AppError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            gateway_url: gateway_url.into(),
            server_key: server_key.into(),
        })
    }

    /// Serialize the envelope and graft the addressing field onto it.
    fn request_body(
        envelope: &MessageEnvelope,
        target_key: &str,
        target: Value,
    ) -> Result<Value, AppError> {
        let mut body = serde_json::to_value(envelope)
            .map_err(|e| AppError::Internal(format!("Failed to serialize envelope: {e}")))?;

        let Some(fields) = body.as_object_mut() else {
            return Err(AppError::Internal(
                "Envelope did not serialize to a JSON object".to_string(),
            ));
        };
        fields.insert(target_key.to_string(), target);

        Ok(body)
    }

    async fn post(&self, body: &Value) -> Result<MulticastResponse, AppError> {
        let response = self
            .http
            .post(&self.gateway_url)
            .header("Authorization", format!("key={}", self.server_key))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("Push gateway request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Transport(format!(
                "Push gateway returned {status}: {detail}"
            )));
        }

        response
            .json::<MulticastResponse>()
            .await
            .map_err(|e| AppError::Transport(format!("Malformed push gateway response: {e}")))
    }
}

#[async_trait]
impl PushTransport for FcmClient {
    async fn send_multicast(
        &self,
        tokens: &[String],
        envelope: &MessageEnvelope,
    ) -> Result<MulticastResponse, AppError> {
        let body = Self::request_body(envelope, "registration_ids", serde_json::json!(tokens))?;
        let parsed = self.post(&body).await?;

        tracing::debug!(
            tokens = tokens.len(),
            results = parsed.results.len(),
            "Multicast accepted by push gateway"
        );
        Ok(parsed)
    }

    async fn send_single(
        &self,
        token: &str,
        envelope: &MessageEnvelope,
    ) -> Result<SendResult, AppError> {
        let body = Self::request_body(envelope, "to", Value::String(token.to_string()))?;
        let parsed = self.post(&body).await?;

        parsed.results.into_iter().next().ok_or_else(|| {
            AppError::Transport("Push gateway returned no result for single send".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::MessageBuilder;
    use vigil_common::types::{AlertKind, MessagePriority};

    fn envelope() -> MessageEnvelope {
        MessageBuilder::new(AlertKind::SosAlert)
            .title("SOS ALERT from Maya")
            .body("Maya needs help!")
            .data("type", "sos_alert")
            .priority(MessagePriority::High)
            .build()
    }

    #[test]
    fn multicast_body_carries_registration_ids_and_envelope() {
        let tokens = vec!["tok-a".to_string(), "tok-b".to_string()];
        let body =
            FcmClient::request_body(&envelope(), "registration_ids", serde_json::json!(tokens))
                .unwrap();

        assert_eq!(body["registration_ids"], serde_json::json!(["tok-a", "tok-b"]));
        assert_eq!(body["notification"]["title"], "SOS ALERT from Maya");
        assert_eq!(body["android"]["priority"], "high");
        assert_eq!(body["apns"]["payload"]["aps"]["interruption-level"], "critical");
        assert_eq!(body["data"]["type"], "sos_alert");
    }

    #[test]
    fn single_body_addresses_one_token() {
        let body =
            FcmClient::request_body(&envelope(), "to", Value::String("tok-a".into())).unwrap();

        assert_eq!(body["to"], "tok-a");
        assert!(body.get("registration_ids").is_none());
    }

    #[test]
    fn gateway_response_parses_mixed_results() {
        let raw = serde_json::json!({
            "multicast_id": 216,
            "success": 1,
            "failure": 1,
            "canonical_ids": 0,
            "results": [
                { "message_id": "0:1500415314455276%31bd1c96f9fd7ecd" },
                { "error": "NotRegistered" }
            ]
        });

        let parsed: MulticastResponse = serde_json::from_value(raw).unwrap();

        assert_eq!(parsed.results.len(), 2);
        assert!(parsed.results[0].is_success());
        assert!(!parsed.results[1].is_success());
        assert_eq!(parsed.results[1].error.as_deref(), Some("NotRegistered"));
    }
}
