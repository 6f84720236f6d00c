//! Common test utilities for integration tests.

use bridge_store::SessionStore;
use callmask_server::api::AppState;
use callmask_server::config::BridgeConfig;
use callmask_server::orchestrator::BridgeOrchestrator;
use carrier_client::{CarrierClient, CarrierGateway};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCOUNT_SID: &str = "AC123";
pub const MASKING_NUMBER: &str = "+15550001111";

/// The masking number as it appears URL-encoded in origination bodies.
pub const MASKING_NUMBER_ENCODED: &str = "%2B15550001111";

/// Create app state wired to a mock carrier.
pub fn test_state(carrier: &MockServer) -> AppState {
    let store = SessionStore::new();
    let client = CarrierClient::new(
        carrier.uri(),
        ACCOUNT_SID,
        "token123",
        Duration::from_secs(5),
    )
    .unwrap();
    let gateway: Arc<dyn CarrierGateway> = Arc::new(client);
    let orchestrator = BridgeOrchestrator::new(
        store.clone(),
        gateway.clone(),
        MASKING_NUMBER.to_string(),
        "https://bridge.example.com".to_string(),
        BridgeConfig::default(),
    );
    AppState::new(orchestrator, store, gateway)
}

/// Mount an origination mock for one destination number.
///
/// The matcher also requires the masking caller-ID in the form body, so
/// an origination presenting any other From never matches and the test
/// fails loudly.
pub async fn mock_origination(carrier: &MockServer, to_encoded: &str, sid: &str) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/2010-04-01/Accounts/{}/Calls.json",
            ACCOUNT_SID
        )))
        .and(body_string_contains(format!("To={}", to_encoded)))
        .and(body_string_contains(format!(
            "From={}",
            MASKING_NUMBER_ENCODED
        )))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": sid,
            "status": "queued",
        })))
        .expect(1)
        .mount(carrier)
        .await;
}

/// Mount a hangup mock for one call sid, expected exactly once.
pub async fn mock_hangup(carrier: &MockServer, sid: &str) {
    Mock::given(method("POST"))
        .and(path(format!(
            "/2010-04-01/Accounts/{}/Calls/{}.json",
            ACCOUNT_SID, sid
        )))
        .and(body_string_contains("Status=completed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sid": sid,
            "status": "completed",
        })))
        .expect(1)
        .mount(carrier)
        .await;
}
