//! Inbound webhook routes for background-verification providers.
//!
//! Providers retry aggressively on non-2xx responses, so unknown payload
//! shapes and unmatched subjects are acknowledged with 200 and dropped.
//! Only store and transport faults surface as errors.

use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;

use vigil_common::error::AppError;
use vigil_engine::verification::{VerificationService, WebhookDisposition};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/webhooks/verification", post(verification_webhook))
}

/// POST /api/webhooks/verification — Apply a provider status callback.
async fn verification_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(&body) else {
        tracing::warn!("Verification webhook body is not JSON; acknowledging and dropping");
        return Ok(Json(json!({"received": true})));
    };

    let disposition =
        VerificationService::apply_webhook(state.store.as_ref(), state.push.as_ref(), &payload)
            .await?;

    match disposition {
        WebhookDisposition::Applied {
            volunteer_id,
            outcome,
        } => {
            tracing::info!(
                volunteer_id = %volunteer_id,
                outcome = %outcome,
                "Verification webhook applied"
            );
        }
        WebhookDisposition::Ignored => {
            tracing::info!("Verification webhook ignored");
        }
    }

    Ok(Json(json!({"received": true})))
}
