//! Bridge orchestration: places both call legs and answers carrier callbacks.

use crate::config::BridgeConfig;
use crate::error::BridgeError;
use bridge_store::{
    mask_number, normalize_phone_number, AnswerOutcome, BridgeSession, LegRole, SessionStore,
};
use carrier_client::{CarrierGateway, VoiceResponse};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Orchestrates masked call bridges.
///
/// Each bridge is two outbound legs placed under the masking caller-ID.
/// The answer callback URL for a leg carries the session id and leg role,
/// so answer events resolve without any carrier round trip.
#[derive(Clone)]
pub struct BridgeOrchestrator {
    store: SessionStore,
    gateway: Arc<dyn CarrierGateway>,
    masking_number: String,
    public_base_url: String,
    bridge: BridgeConfig,
}

impl BridgeOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        store: SessionStore,
        gateway: Arc<dyn CarrierGateway>,
        masking_number: String,
        public_base_url: String,
        bridge: BridgeConfig,
    ) -> Self {
        Self {
            store,
            gateway,
            masking_number,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            bridge,
        }
    }

    /// Start a masked bridge between two numbers.
    ///
    /// Originates the caller leg first, then the callee leg. Neither party
    /// ever sees the other's number: both legs present the masking number.
    /// If the callee origination fails, the caller leg is hung up and the
    /// session removed before the error is returned.
    #[instrument(skip(self, caller_number, callee_number))]
    pub async fn start_bridge(
        &self,
        caller_number: &str,
        callee_number: &str,
    ) -> Result<BridgeSession, BridgeError> {
        let caller = normalize_phone_number(caller_number).map_err(BridgeError::InvalidArgument)?;
        let callee = normalize_phone_number(callee_number).map_err(BridgeError::InvalidArgument)?;
        if caller == callee {
            return Err(BridgeError::InvalidArgument(
                "Caller and callee must be different numbers".to_string(),
            ));
        }

        let session = self.store.create(caller.clone(), callee.clone()).await;
        let session_id = session.id.clone();
        info!(
            session_id = %session_id,
            caller = %mask_number(&caller),
            callee = %mask_number(&callee),
            "Starting bridge"
        );

        // Caller leg
        let caller_call = match self
            .gateway
            .originate(
                &caller,
                &self.masking_number,
                &self.callback_url(&session_id, LegRole::Caller),
            )
            .await
        {
            Ok(call) => call,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Caller leg origination failed");
                self.store.remove(&session_id).await;
                return Err(e.into());
            }
        };
        self.store
            .record_leg(&session_id, LegRole::Caller, caller_call.sid.clone())
            .await?;

        // Callee leg
        let callee_call = match self
            .gateway
            .originate(
                &callee,
                &self.masking_number,
                &self.callback_url(&session_id, LegRole::Callee),
            )
            .await
        {
            Ok(call) => call,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "Callee leg origination failed");
                self.abort_session(&session_id).await;
                return Err(e.into());
            }
        };
        let session = self
            .store
            .record_leg(&session_id, LegRole::Callee, callee_call.sid.clone())
            .await?;

        info!(
            session_id = %session_id,
            caller_leg = %caller_call.sid,
            callee_leg = %callee_call.sid,
            "Both legs placed"
        );

        Ok(session)
    }

    /// Handle an answer callback for one leg.
    ///
    /// Returns the voice document the carrier should execute on that leg.
    /// Answering legs always join the conference named after the session,
    /// so whichever leg answers first waits there for the other.
    #[instrument(skip(self))]
    pub async fn leg_answered(
        &self,
        session_id: &str,
        role: LegRole,
    ) -> Result<String, BridgeError> {
        let outcome = self.store.record_answer(session_id, role).await?;
        match outcome {
            AnswerOutcome::First => {
                info!(session_id = %session_id, leg = %role, "First leg answered, parking in conference");
            }
            AnswerOutcome::Bridged => {
                info!(session_id = %session_id, leg = %role, "Second leg answered, parties bridged");
            }
            AnswerOutcome::Replay => {
                info!(session_id = %session_id, leg = %role, "Replayed answer callback");
            }
        }
        Ok(self.join_document(session_id, role))
    }

    /// Voice document that apologizes and hangs up.
    ///
    /// Served for unknown sessions and malformed callbacks. The person on
    /// the line hears a spoken message rather than carrier error tones.
    pub fn apology_document(&self) -> String {
        VoiceResponse::new()
            .say(&self.bridge.apology, &self.bridge.language)
            .hangup()
            .to_xml()
    }

    /// Voice document for direct inbound calls to the masking number.
    pub fn incoming_document(&self) -> String {
        VoiceResponse::new()
            .say(&self.bridge.incoming_notice, &self.bridge.language)
            .hangup()
            .to_xml()
    }

    fn join_document(&self, session_id: &str, role: LegRole) -> String {
        let mut response = VoiceResponse::new();
        if self.bridge.announce_to.includes(role) {
            response = response.say(&self.bridge.announcement, &self.bridge.language);
        }
        response.dial_conference(session_id).to_xml()
    }

    fn callback_url(&self, session_id: &str, role: LegRole) -> String {
        format!(
            "{}/v1/webhooks/answered?session={}&leg={}",
            self.public_base_url, session_id, role
        )
    }

    /// Evict a partially placed session and hang up any legs it reached.
    async fn abort_session(&self, session_id: &str) {
        let session = match self.store.remove(session_id).await {
            Some(session) => session,
            None => return,
        };
        for (role, leg_id) in session.placed_legs() {
            if let Err(e) = self.gateway.hangup(&leg_id).await {
                warn!(session_id = %session_id, leg = %role, error = %e, "Failed to hang up leg");
            }
        }
    }
}
