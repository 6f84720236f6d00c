//! Callmask server - Entry point.

use bridge_store::{normalize_phone_number, SessionStore};
use callmask_server::{
    api::{create_router, AppState},
    config::Config,
    orchestrator::BridgeOrchestrator,
    reclaimer::spawn_reclaimer,
};
use carrier_client::{CarrierClient, CarrierGateway};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log.level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Callmask server");

    // The masking number must be dialable as configured
    let masking_number = match normalize_phone_number(&config.carrier.masking_number) {
        Ok(n) => n,
        Err(e) => {
            error!("Invalid masking number: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize carrier client
    let carrier = match CarrierClient::new(
        &config.carrier.api_url,
        &config.carrier.account_sid,
        &config.carrier.auth_token,
        config.carrier.timeout,
    ) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create carrier client: {}", e);
            std::process::exit(1);
        }
    };

    // Verify carrier credentials before taking traffic
    if !carrier.health_check().await {
        error!("Carrier API unreachable or credentials rejected");
        std::process::exit(1);
    }
    info!("Carrier API healthy");

    let store = SessionStore::new();
    let gateway: Arc<dyn CarrierGateway> = Arc::new(carrier);

    let orchestrator = BridgeOrchestrator::new(
        store.clone(),
        gateway.clone(),
        masking_number,
        config.server.public_base_url.clone(),
        config.bridge.clone(),
    );

    // Reclaim sessions whose legs never all answer
    spawn_reclaimer(
        store.clone(),
        gateway.clone(),
        config.bridge.answer_timeout,
        config.bridge.session_ttl,
    );

    // Create application state and router
    let state = AppState::new(orchestrator, store, gateway);
    let app = create_router(state);

    // Bind to address
    let addr = SocketAddr::new(
        config.server.listen_addr.parse().unwrap_or([0, 0, 0, 0].into()),
        config.server.port,
    );

    info!("Listening on {}", addr);

    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    // Run server
    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }
}
