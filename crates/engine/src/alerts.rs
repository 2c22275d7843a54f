//! Synchronous alert flows: SOS fan-out and escort requests.
//!
//! Both flows resolve recipients, dispatch one multicast, and retire
//! rejected tokens. SOS additionally persists an alert record before
//! dispatch so its id can ride in the envelope, and writes delivery
//! accounting afterwards.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vigil_common::error::AppError;
use vigil_common::types::{AlertKind, MessagePriority, NewSosAlert};
use vigil_push::PushTransport;
use vigil_push::envelope::MessageBuilder;

use crate::dispatcher::Dispatcher;
use crate::reconciler::TokenReconciler;
use crate::resolver::TokenResolver;
use crate::store::AlertStore;

/// Map link prefix embedded in SOS payloads for one-tap navigation.
const MAPS_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";

/// Request body for a synchronous SOS send.
#[derive(Debug, Clone, Deserialize)]
pub struct SosRequest {
    pub sender_name: String,
    pub sender_phone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub contact_user_ids: Vec<String>,
    pub message: Option<String>,
}

/// Caller-visible result of an SOS send.
#[derive(Debug, Clone, Serialize)]
pub struct SosAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_contacts: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Request body for an escort-request fan-out.
#[derive(Debug, Clone, Deserialize)]
pub struct EscortRequest {
    pub request_id: String,
    pub user_name: String,
    pub event_name: String,
    pub address: String,
    pub volunteer_ids: Vec<String>,
}

/// Caller-visible result of an escort fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct EscortAck {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_volunteers: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Orchestrates the synchronous alert flows.
pub struct AlertDirector;

impl AlertDirector {
    /// Fan an SOS alert out to the sender's chosen contacts.
    ///
    /// An empty contact list is a validation error; contacts that resolve to
    /// zero tokens are a normal `success = false` outcome and leave no alert
    /// record behind.
    pub async fn send_sos(
        store: &dyn AlertStore,
        push: &dyn PushTransport,
        sender_id: &str,
        request: &SosRequest,
    ) -> Result<SosAck, AppError> {
        if request.contact_user_ids.is_empty() {
            return Err(AppError::Validation("No contacts specified".to_string()));
        }

        let tokens = TokenResolver::resolve(store, &request.contact_user_ids).await?;
        if tokens.is_empty() {
            tracing::warn!(sender_id = %sender_id, "SOS send found no registered contacts");
            return Ok(SosAck {
                success: false,
                alert_id: None,
                sent_count: None,
                total_contacts: None,
                message: Some("No registered contacts found".to_string()),
            });
        }

        let alert_id = store
            .insert_sos_alert(&NewSosAlert {
                sender_id: sender_id.to_string(),
                sender_name: request.sender_name.clone(),
                sender_phone: request.sender_phone.clone(),
                latitude: request.latitude,
                longitude: request.longitude,
                address: request.address.clone(),
                message: request.message.clone(),
                contact_ids: request.contact_user_ids.clone(),
            })
            .await?;

        let body = request.message.clone().unwrap_or_else(|| {
            format!("{} needs help! Location: {}", request.sender_name, request.address)
        });
        let envelope = MessageBuilder::new(AlertKind::SosAlert)
            .title(format!("SOS ALERT from {}", request.sender_name))
            .body(body)
            .data("type", AlertKind::SosAlert.to_string())
            .data("alert_id", alert_id.to_string())
            .data("sender_id", sender_id)
            .data("sender_name", &request.sender_name)
            .data("sender_phone", &request.sender_phone)
            .data("latitude", request.latitude.to_string())
            .data("longitude", request.longitude.to_string())
            .data("address", &request.address)
            .data(
                "maps_url",
                format!("{MAPS_SEARCH_URL}{},{}", request.latitude, request.longitude),
            )
            .priority(MessagePriority::High)
            .build();

        let report = Dispatcher::send(push, &tokens, &envelope).await?;

        if !report.failed_tokens.is_empty()
            && let Err(e) = TokenReconciler::retire(store, &report.failed_tokens).await
        {
            tracing::warn!(alert_id = %alert_id, error = %e, "Token reconciliation failed");
        }

        store.record_alert_delivery(alert_id, &report.stats).await?;

        tracing::info!(
            alert_id = %alert_id,
            delivered = report.stats.success_count,
            attempted = report.stats.attempted,
            "SOS alert dispatched"
        );

        Ok(SosAck {
            success: true,
            alert_id: Some(alert_id),
            sent_count: Some(report.stats.success_count),
            total_contacts: Some(report.stats.attempted),
            message: None,
        })
    }

    /// Fan an escort request out to candidate volunteers.
    ///
    /// Nothing is persisted here; the request record already lives upstream
    /// and the ack carries the delivery accounting.
    pub async fn send_escort(
        store: &dyn AlertStore,
        push: &dyn PushTransport,
        request: &EscortRequest,
    ) -> Result<EscortAck, AppError> {
        if request.volunteer_ids.is_empty() {
            return Err(AppError::Validation("No volunteers specified".to_string()));
        }

        let tokens = TokenResolver::resolve(store, &request.volunteer_ids).await?;
        if tokens.is_empty() {
            tracing::warn!(
                request_id = %request.request_id,
                "Escort request found no registered volunteers"
            );
            return Ok(EscortAck {
                success: false,
                sent_count: None,
                total_volunteers: None,
                message: Some("No volunteers available".to_string()),
            });
        }

        let envelope = MessageBuilder::new(AlertKind::EscortRequest)
            .title("New Escort Request")
            .body(format!(
                "{} needs an escort to {}",
                request.user_name, request.event_name
            ))
            .data("type", AlertKind::EscortRequest.to_string())
            .data("request_id", &request.request_id)
            .data("user_name", &request.user_name)
            .data("event_name", &request.event_name)
            .data("address", &request.address)
            .priority(MessagePriority::High)
            .build();

        let report = Dispatcher::send(push, &tokens, &envelope).await?;

        if !report.failed_tokens.is_empty()
            && let Err(e) = TokenReconciler::retire(store, &report.failed_tokens).await
        {
            tracing::warn!(
                request_id = %request.request_id,
                error = %e,
                "Token reconciliation failed"
            );
        }

        tracing::info!(
            request_id = %request.request_id,
            delivered = report.stats.success_count,
            attempted = report.stats.attempted,
            "Escort request dispatched"
        );

        Ok(EscortAck {
            success: true,
            sent_count: Some(report.stats.success_count),
            total_volunteers: Some(report.stats.attempted),
            message: None,
        })
    }
}
