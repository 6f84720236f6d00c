//! In-memory session store with atomic state transitions.

use crate::error::StoreError;
use crate::session::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

/// Entry in the session store with monotonic-clock age tracking.
struct SessionEntry {
    session: BridgeSession,
    created: Instant,
}

/// In-memory store of active bridging sessions.
///
/// The store is the only cross-request state in the system. All
/// read-check-write transitions happen under the write lock, so two
/// near-simultaneous answer callbacks for the same session can never
/// both observe themselves as first. The lock is never held across
/// network calls; callers hang up legs after the store has spoken.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl SessionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Create a new session for the given pair of numbers.
    ///
    /// Generates the session id under the write lock so an id can never
    /// be reused while a session with that id is still live.
    #[instrument(skip(self, caller_number, callee_number))]
    pub async fn create(&self, caller_number: String, callee_number: String) -> BridgeSession {
        let mut sessions = self.sessions.write().await;

        let mut id = new_session_id();
        while sessions.contains_key(&id) {
            id = new_session_id();
        }

        let session = BridgeSession::new(id.clone(), caller_number, callee_number);
        sessions.insert(
            id,
            SessionEntry {
                session: session.clone(),
                created: Instant::now(),
            },
        );

        debug!(session_id = %session.id, "Created session");
        session
    }

    /// Snapshot a session by id.
    pub async fn get(&self, id: &str) -> Option<BridgeSession> {
        let sessions = self.sessions.read().await;
        sessions.get(id).map(|entry| entry.session.clone())
    }

    /// Record that a leg was accepted by the carrier.
    ///
    /// Stores the carrier call id and advances the state to
    /// `CallerRinging` or `Ringing` by role. The state advance is
    /// monotonic: if an answer callback already moved the session
    /// further, the later rank wins and nothing regresses.
    #[instrument(skip(self, leg_id))]
    pub async fn record_leg(
        &self,
        id: &str,
        role: LegRole,
        leg_id: String,
    ) -> Result<BridgeSession, StoreError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownSession(id.to_string()))?;

        match role {
            LegRole::Caller => entry.session.caller_leg_id = Some(leg_id),
            LegRole::Callee => entry.session.callee_leg_id = Some(leg_id),
        }

        let placed = match role {
            LegRole::Caller => BridgeState::CallerRinging,
            LegRole::Callee => BridgeState::Ringing,
        };
        if placed.rank() > entry.session.state.rank() {
            entry.session.state = placed;
        }

        Ok(entry.session.clone())
    }

    /// Record an answer event for one leg, atomically.
    ///
    /// Returns which side of the race this leg landed on. A session in
    /// a terminal state is reported as unknown, matching what the
    /// webhook caller needs to tell the carrier.
    #[instrument(skip(self))]
    pub async fn record_answer(
        &self,
        id: &str,
        role: LegRole,
    ) -> Result<AnswerOutcome, StoreError> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions
            .get_mut(id)
            .ok_or_else(|| StoreError::UnknownSession(id.to_string()))?;

        let state = entry.session.state;
        let (next, outcome) = match (state, role) {
            // First leg to answer; legs may answer before both
            // originations have been acknowledged.
            (
                BridgeState::Initiated | BridgeState::CallerRinging | BridgeState::Ringing,
                LegRole::Caller,
            ) => (BridgeState::CallerAnswered, AnswerOutcome::First),
            (
                BridgeState::Initiated | BridgeState::CallerRinging | BridgeState::Ringing,
                LegRole::Callee,
            ) => (BridgeState::CalleeAnswered, AnswerOutcome::First),

            // Second leg completes the bridge.
            (BridgeState::CallerAnswered, LegRole::Callee) => {
                (BridgeState::Bridged, AnswerOutcome::Bridged)
            }
            (BridgeState::CalleeAnswered, LegRole::Caller) => {
                (BridgeState::Bridged, AnswerOutcome::Bridged)
            }

            // Duplicate callback for an already-answered leg.
            (BridgeState::CallerAnswered, LegRole::Caller)
            | (BridgeState::CalleeAnswered, LegRole::Callee)
            | (BridgeState::Bridged, _) => (state, AnswerOutcome::Replay),

            // Terminal sessions look no different from evicted ones to
            // the carrier-facing caller.
            (BridgeState::Completed | BridgeState::Failed, _) => {
                return Err(StoreError::UnknownSession(id.to_string()));
            }
        };

        entry.session.state = next;
        debug!(session_id = %id, role = %role, state = ?next, "Recorded answer");
        Ok(outcome)
    }

    /// Remove a session, returning its final snapshot.
    #[instrument(skip(self))]
    pub async fn remove(&self, id: &str) -> Option<BridgeSession> {
        let mut sessions = self.sessions.write().await;
        let removed = sessions.remove(id).map(|entry| entry.session);
        if removed.is_some() {
            debug!(session_id = %id, "Removed session");
        }
        removed
    }

    /// Drain sessions that never reached `Bridged` within `timeout`.
    ///
    /// Each drained session is marked `Failed` in the returned
    /// snapshot. Removal and marking happen under one write lock, so a
    /// racing answer callback either wins first (and the session is
    /// not drained) or finds the session gone.
    pub async fn take_unanswered(&self, timeout: Duration) -> Vec<BridgeSession> {
        let mut sessions = self.sessions.write().await;

        let expired: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| {
                entry.session.state.rank() < BridgeState::Bridged.rank()
                    && entry.created.elapsed() >= timeout
            })
            .map(|(id, _)| id.clone())
            .collect();

        let mut taken = Vec::with_capacity(expired.len());
        for id in expired {
            if let Some(mut entry) = sessions.remove(&id) {
                entry.session.state = BridgeState::Failed;
                taken.push(entry.session);
            }
        }
        taken
    }

    /// Drain `Bridged` sessions older than `ttl`.
    ///
    /// The carrier does not call back when a conference ends, so
    /// bridged sessions are reclaimed on age alone. Snapshots come
    /// back marked `Completed`.
    pub async fn take_stale_bridged(&self, ttl: Duration) -> Vec<BridgeSession> {
        let mut sessions = self.sessions.write().await;

        let stale: Vec<String> = sessions
            .iter()
            .filter(|(_, entry)| {
                entry.session.state == BridgeState::Bridged && entry.created.elapsed() >= ttl
            })
            .map(|(id, _)| id.clone())
            .collect();

        let mut taken = Vec::with_capacity(stale.len());
        for id in stale {
            if let Some(mut entry) = sessions.remove(&id) {
                entry.session.state = BridgeState::Completed;
                taken.push(entry.session);
            }
        }
        taken
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }
}
