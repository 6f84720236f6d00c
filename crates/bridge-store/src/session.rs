//! Bridging session model.

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Random bytes per session id; hex-encoded to 32 characters.
const SESSION_ID_BYTES: usize = 16;

/// Lifecycle state of a bridging session.
///
/// States only move forward. `CallerAnswered` and `CalleeAnswered` both
/// mean "one leg up, waiting for the other" and record which leg
/// answered first, since answer order is not guaranteed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BridgeState {
    /// Session created, no legs placed yet
    Initiated,
    /// Caller leg accepted by the carrier
    CallerRinging,
    /// Both legs accepted, neither answered
    Ringing,
    /// Caller answered first, waiting on the callee
    CallerAnswered,
    /// Callee answered first, waiting on the caller
    CalleeAnswered,
    /// Both legs joined the conference
    Bridged,
    /// Bridge ended normally
    Completed,
    /// Origination failed or the session timed out
    Failed,
}

impl BridgeState {
    /// Position in the forward-only lifecycle. The two one-leg-answered
    /// states share a rank because either leg may answer first.
    pub fn rank(self) -> u8 {
        match self {
            BridgeState::Initiated => 0,
            BridgeState::CallerRinging => 1,
            BridgeState::Ringing => 2,
            BridgeState::CallerAnswered | BridgeState::CalleeAnswered => 3,
            BridgeState::Bridged => 4,
            BridgeState::Completed | BridgeState::Failed => 5,
        }
    }

    /// Whether the session has reached a final state.
    pub fn is_terminal(self) -> bool {
        matches!(self, BridgeState::Completed | BridgeState::Failed)
    }
}

/// Which of the two call legs an event belongs to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LegRole {
    Caller,
    Callee,
}

impl LegRole {
    pub fn as_str(self) -> &'static str {
        match self {
            LegRole::Caller => "caller",
            LegRole::Callee => "callee",
        }
    }
}

impl std::fmt::Display for LegRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for LegRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "caller" => Ok(LegRole::Caller),
            "callee" => Ok(LegRole::Callee),
            other => Err(format!("unknown leg role: {}", other)),
        }
    }
}

/// Result of recording an answer event against a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// This leg answered first; it will open the conference and wait.
    First,
    /// This leg answered second and completes the bridge.
    Bridged,
    /// Duplicate callback for a leg that already answered.
    Replay,
}

/// A single masked bridging session between two phone numbers.
///
/// The `id` doubles as the carrier-side conference room name, so it
/// must be unguessable and never reused across sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSession {
    /// Opaque session identifier, also the conference room name
    pub id: String,

    /// Real number of the initiating party, E.164
    pub caller_number: String,

    /// Real number of the party being reached, E.164
    pub callee_number: String,

    /// Carrier call id for the caller leg, set once originated
    pub caller_leg_id: Option<String>,

    /// Carrier call id for the callee leg, set once originated
    pub callee_leg_id: Option<String>,

    /// Current lifecycle state
    pub state: BridgeState,

    /// When the session was created
    pub created_at: DateTime<Utc>,
}

impl BridgeSession {
    /// Create a fresh session in the `Initiated` state.
    pub fn new(id: String, caller_number: String, callee_number: String) -> Self {
        Self {
            id,
            caller_number,
            callee_number,
            caller_leg_id: None,
            callee_leg_id: None,
            state: BridgeState::Initiated,
            created_at: Utc::now(),
        }
    }

    /// Carrier leg id for the given role, if that leg was originated.
    pub fn leg_id(&self, role: LegRole) -> Option<&str> {
        match role {
            LegRole::Caller => self.caller_leg_id.as_deref(),
            LegRole::Callee => self.callee_leg_id.as_deref(),
        }
    }

    /// Leg ids that have been originated, for cleanup.
    pub fn placed_legs(&self) -> Vec<(LegRole, String)> {
        let mut legs = Vec::new();
        if let Some(sid) = &self.caller_leg_id {
            legs.push((LegRole::Caller, sid.clone()));
        }
        if let Some(sid) = &self.callee_leg_id {
            legs.push((LegRole::Callee, sid.clone()));
        }
        legs
    }
}

/// Generate an unguessable session identifier.
pub fn new_session_id() -> String {
    let mut bytes = [0u8; SESSION_ID_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Normalize a phone number to E.164 format.
pub fn normalize_phone_number(number: &str) -> Result<String, String> {
    // Remove all non-digit characters except leading +
    let has_plus = number.starts_with('+');
    let digits: String = number.chars().filter(|c| c.is_ascii_digit()).collect();

    if digits.is_empty() {
        return Err("Phone number must contain at least one digit".into());
    }

    if digits.len() < 7 {
        return Err("Phone number too short".into());
    }

    if digits.len() > 15 {
        return Err("Phone number too long".into());
    }

    // Ensure E.164 format starts with +
    if has_plus || digits.len() >= 10 {
        Ok(format!("+{}", digits))
    } else {
        Err("Phone number must include country code".into())
    }
}

/// Redact a phone number for logging, keeping the last four digits.
pub fn mask_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() <= 4 {
        return "***".into();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("***{}", tail)
}
