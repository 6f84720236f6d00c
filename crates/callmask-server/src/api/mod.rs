//! HTTP API for the call bridge.

mod handlers;
mod types;

pub use handlers::*;
pub use types::*;

use crate::orchestrator::BridgeOrchestrator;
use axum::{
    routing::{get, post},
    Router,
};
use bridge_store::SessionStore;
use carrier_client::CarrierGateway;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Bridge orchestrator
    pub orchestrator: Arc<BridgeOrchestrator>,
    /// In-memory session store
    pub store: SessionStore,
    /// Carrier gateway
    pub gateway: Arc<dyn CarrierGateway>,
}

impl AppState {
    /// Create new application state.
    pub fn new(
        orchestrator: BridgeOrchestrator,
        store: SessionStore,
        gateway: Arc<dyn CarrierGateway>,
    ) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            store,
            gateway,
        }
    }
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Service identification and health
        .route("/", get(handlers::welcome))
        .route("/health", get(handlers::health))
        // Bridge management
        .route("/v1/bridges", post(handlers::start_bridge))
        .route("/v1/bridges/:id", get(handlers::get_session))
        // Carrier webhooks
        .route("/v1/webhooks/answered", post(handlers::leg_answered))
        .route(
            "/v1/webhooks/incoming",
            get(handlers::incoming_call).post(handlers::incoming_call),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
