//! Gateway abstraction over the carrier voice API.

use crate::client::CarrierClient;
use crate::error::CarrierError;
use crate::types::CallResource;
use async_trait::async_trait;

/// Carrier-side operations the bridging orchestrator depends on.
///
/// `CarrierClient` is the production implementation; tests stand in
/// doubles to exercise origination failures without a live carrier.
#[async_trait]
pub trait CarrierGateway: Send + Sync {
    /// Originate a call leg to `to`, presenting `from` as caller-ID,
    /// with answer instructions served from `callback_url`.
    async fn originate(
        &self,
        to: &str,
        from: &str,
        callback_url: &str,
    ) -> Result<CallResource, CarrierError>;

    /// Hang up a placed leg.
    async fn hangup(&self, call_sid: &str) -> Result<(), CarrierError>;

    /// Whether the carrier API is reachable with working credentials.
    async fn health_check(&self) -> bool;
}

#[async_trait]
impl CarrierGateway for CarrierClient {
    async fn originate(
        &self,
        to: &str,
        from: &str,
        callback_url: &str,
    ) -> Result<CallResource, CarrierError> {
        self.originate_call(to, from, callback_url).await
    }

    async fn hangup(&self, call_sid: &str) -> Result<(), CarrierError> {
        self.complete_call(call_sid).await
    }

    async fn health_check(&self) -> bool {
        CarrierClient::health_check(self).await
    }
}
