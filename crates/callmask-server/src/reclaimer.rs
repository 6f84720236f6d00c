//! Background reclamation of sessions that never bridged.
//!
//! Periodically sweeps the session store: sessions still ringing past the
//! answer timeout are failed and their carrier legs hung up, and bridged
//! sessions past their TTL are evicted.

use bridge_store::{BridgeSession, SessionStore};
use carrier_client::CarrierGateway;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Reclaims sessions whose legs never all answered.
pub struct Reclaimer {
    /// Session store to sweep.
    store: SessionStore,
    /// Carrier gateway for hanging up abandoned legs.
    gateway: Arc<dyn CarrierGateway>,
    /// How long a session may ring before it is failed.
    answer_timeout: Duration,
    /// How long bridged sessions are retained.
    session_ttl: Duration,
}

impl Reclaimer {
    /// Create a new reclaimer.
    pub fn new(
        store: SessionStore,
        gateway: Arc<dyn CarrierGateway>,
        answer_timeout: Duration,
        session_ttl: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            answer_timeout,
            session_ttl,
        }
    }

    /// Run a single reclamation cycle.
    ///
    /// Returns the sessions evicted this cycle.
    pub async fn sweep_once(&self) -> Vec<BridgeSession> {
        let mut evicted = self.store.take_unanswered(self.answer_timeout).await;

        for session in &evicted {
            info!(
                session_id = %session.id,
                state = ?session.state,
                "Reclaiming session that never bridged"
            );
            // Hangups happen after eviction, outside any store lock. A leg
            // answering now is told the session is unknown.
            for (role, leg_id) in session.placed_legs() {
                if let Err(e) = self.gateway.hangup(&leg_id).await {
                    warn!(
                        session_id = %session.id,
                        leg = %role,
                        error = %e,
                        "Failed to hang up leg"
                    );
                }
            }
        }

        let stale = self.store.take_stale_bridged(self.session_ttl).await;
        if !stale.is_empty() {
            debug!("Evicted {} bridged sessions past their TTL", stale.len());
        }
        evicted.extend(stale);

        evicted
    }

    /// Run the reclaimer as a background task.
    ///
    /// This will run indefinitely, sleeping between cycles.
    pub async fn run(&self) {
        let interval = sweep_interval(self.answer_timeout);
        info!(
            "Starting session reclaimer, interval: {:?}, answer timeout: {:?}",
            interval, self.answer_timeout
        );

        loop {
            tokio::time::sleep(interval).await;

            let evicted = self.sweep_once().await;
            if !evicted.is_empty() {
                info!(
                    "Reclamation cycle complete: {} sessions evicted",
                    evicted.len()
                );
            }
        }
    }
}

/// How often to sweep for a given answer timeout.
///
/// Half the answer timeout, clamped to the range of one second to one
/// minute.
fn sweep_interval(answer_timeout: Duration) -> Duration {
    Duration::from_secs((answer_timeout.as_secs() / 2).clamp(1, 60))
}

/// Spawn the reclaimer as a background task.
///
/// Returns a JoinHandle for the reclaimer task.
pub fn spawn_reclaimer(
    store: SessionStore,
    gateway: Arc<dyn CarrierGateway>,
    answer_timeout: Duration,
    session_ttl: Duration,
) -> tokio::task::JoinHandle<()> {
    let reclaimer = Reclaimer::new(store, gateway, answer_timeout, session_ttl);

    tokio::spawn(async move {
        reclaimer.run().await;
    })
}
