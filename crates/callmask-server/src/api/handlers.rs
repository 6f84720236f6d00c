//! HTTP request handlers.

use super::types::{
    AnswerParams, CarrierWebhookBody, HealthResponse, SessionStatusResponse, StartBridgeRequest,
    StartBridgeResponse, WelcomeResponse,
};
use super::AppState;
use crate::error::BridgeError;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Form, Json};
use bridge_store::LegRole;
use tracing::{info, warn};

/// Service identification.
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        service: "callmask".to_string(),
        status: "ready".to_string(),
    })
}

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let carrier_healthy = state.gateway.health_check().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        active_sessions: state.store.count().await,
        carrier_api_healthy: carrier_healthy,
    })
}

/// Start a masked bridge between two numbers.
pub async fn start_bridge(
    State(state): State<AppState>,
    Json(request): Json<StartBridgeRequest>,
) -> Result<(StatusCode, Json<StartBridgeResponse>), BridgeError> {
    let session = state
        .orchestrator
        .start_bridge(&request.caller_number, &request.callee_number)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(StartBridgeResponse {
            session_id: session.id,
            state: session.state,
            caller_leg_id: session.caller_leg_id,
            callee_leg_id: session.callee_leg_id,
            message: "Both legs placed. Parties are bridged once both answer.".to_string(),
        }),
    ))
}

/// Get the state of a bridge session.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionStatusResponse>, BridgeError> {
    let session = state
        .store
        .get(&id)
        .await
        .ok_or(BridgeError::UnknownSession(id))?;

    Ok(Json(session.into()))
}

/// Answer callback for one leg of a bridge.
///
/// The carrier always gets HTTP 200 with a voice document. Errors become
/// the apology document: the person on the line hears a spoken message
/// instead of carrier error tones.
pub async fn leg_answered(
    State(state): State<AppState>,
    params: Option<Query<AnswerParams>>,
    body: Option<Form<CarrierWebhookBody>>,
) -> Response {
    let params = params.map(|Query(p)| p).unwrap_or_default();
    let webhook = body.map(|Form(b)| b).unwrap_or_default();
    let role = params
        .leg
        .as_deref()
        .and_then(|leg| leg.parse::<LegRole>().ok());

    match (params.session.as_deref(), role) {
        (Some(session_id), Some(role)) => {
            // Only the URL parameters drive the transition. The body's
            // CallSid is checked against the stored leg id and logged on
            // mismatch, nothing more.
            if let Some(reported) = webhook.call_sid.as_deref() {
                let session = state.store.get(session_id).await;
                if session
                    .as_ref()
                    .and_then(|s| s.leg_id(role))
                    .is_some_and(|stored| stored != reported)
                {
                    warn!(
                        session_id = %session_id,
                        leg = %role,
                        call_sid = %reported,
                        "CallSid in callback body does not match the stored leg id"
                    );
                }
            }
            match state.orchestrator.leg_answered(session_id, role).await {
                Ok(document) => xml_response(document),
                Err(e) => {
                    warn!(
                        session_id = %session_id,
                        leg = %role,
                        call_sid = ?webhook.call_sid,
                        error = %e,
                        "Answer callback could not be honored"
                    );
                    xml_response(state.orchestrator.apology_document())
                }
            }
        }
        _ => {
            warn!(
                session = ?params.session,
                leg = ?params.leg,
                call_sid = ?webhook.call_sid,
                call_status = ?webhook.call_status,
                "Malformed answer callback"
            );
            xml_response(state.orchestrator.apology_document())
        }
    }
}

/// Direct inbound call to the masking number.
///
/// The masking number only ever originates. Whoever calls it back hears
/// a notice and is hung up on.
pub async fn incoming_call(
    State(state): State<AppState>,
    body: Option<Form<CarrierWebhookBody>>,
) -> Response {
    let webhook = body.map(|Form(b)| b).unwrap_or_default();
    info!(call_sid = ?webhook.call_sid, "Inbound call to the masking number");
    xml_response(state.orchestrator.incoming_document())
}

fn xml_response(document: String) -> Response {
    ([(header::CONTENT_TYPE, "text/xml")], document).into_response()
}
