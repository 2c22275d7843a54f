//! Synchronous alert routes: SOS and escort fan-out.

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};

use vigil_common::error::AppError;
use vigil_engine::alerts::{AlertDirector, EscortAck, EscortRequest, SosAck, SosRequest};

use crate::middleware::auth::AuthUser;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/alerts/sos", post(send_sos))
        .route("/api/alerts/escort", post(send_escort))
}

/// POST /api/alerts/sos — Fan an SOS alert out to the sender's contacts.
///
/// The sender is taken from the JWT, never from the body.
async fn send_sos(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<SosRequest>,
) -> Result<Json<SosAck>, AppError> {
    let ack = AlertDirector::send_sos(
        state.store.as_ref(),
        state.push.as_ref(),
        &auth.user_id,
        &request,
    )
    .await?;
    Ok(Json(ack))
}

/// POST /api/alerts/escort — Fan an escort request out to candidate volunteers.
async fn send_escort(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(request): Json<EscortRequest>,
) -> Result<Json<EscortAck>, AppError> {
    let ack = AlertDirector::send_escort(state.store.as_ref(), state.push.as_ref(), &request).await?;
    Ok(Json(ack))
}
