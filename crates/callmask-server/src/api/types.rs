//! API request and response types.

use bridge_store::{BridgeSession, BridgeState};
use serde::{Deserialize, Serialize};

/// Request to start a masked bridge between two numbers.
#[derive(Debug, Deserialize)]
pub struct StartBridgeRequest {
    /// Number of the party initiating the call
    pub caller_number: String,

    /// Number of the party being called
    pub callee_number: String,
}

/// Response after starting a bridge.
#[derive(Debug, Serialize)]
pub struct StartBridgeResponse {
    pub session_id: String,
    pub state: BridgeState,
    pub caller_leg_id: Option<String>,
    pub callee_leg_id: Option<String>,
    pub message: String,
}

/// Session status response.
///
/// The parties' numbers are deliberately absent. Status polling should
/// not become a way to read them back out of the store.
#[derive(Debug, Serialize)]
pub struct SessionStatusResponse {
    pub session_id: String,
    pub state: BridgeState,
    pub caller_leg_id: Option<String>,
    pub callee_leg_id: Option<String>,
    pub created_at: String,
}

impl From<BridgeSession> for SessionStatusResponse {
    fn from(session: BridgeSession) -> Self {
        Self {
            session_id: session.id,
            state: session.state,
            caller_leg_id: session.caller_leg_id,
            callee_leg_id: session.callee_leg_id,
            created_at: session.created_at.to_rfc3339(),
        }
    }
}

/// Query parameters on the answer webhook URL.
///
/// Both are optional so a mangled callback still reaches the handler,
/// which answers with the apology document instead of a rejection.
#[derive(Debug, Default, Deserialize)]
pub struct AnswerParams {
    pub session: Option<String>,
    pub leg: Option<String>,
}

/// Form body the carrier posts with status callbacks.
#[derive(Debug, Default, Deserialize)]
pub struct CarrierWebhookBody {
    /// Carrier-side id of the leg this callback is about
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,

    /// Carrier-side call status
    #[serde(rename = "CallStatus")]
    pub call_status: Option<String>,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub active_sessions: usize,
    pub carrier_api_healthy: bool,
}

/// Service identification served at the root.
#[derive(Debug, Serialize)]
pub struct WelcomeResponse {
    pub service: String,
    pub status: String,
}
