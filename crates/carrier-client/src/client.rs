//! Carrier voice API HTTP client.

use crate::error::CarrierError;
use crate::types::*;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument};
use urlencoding::encode;

/// REST client for the carrier's voice API.
///
/// The auth token is held in a `SecretString` to prevent accidental
/// exposure in logs or debug output.
#[derive(Clone)]
pub struct CarrierClient {
    client: Client,
    base_url: String,
    account_sid: String,
    auth_token: SecretString,
}

impl CarrierClient {
    /// Create a new carrier client.
    pub fn new(
        base_url: impl Into<String>,
        account_sid: impl Into<String>,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CarrierError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            account_sid: account_sid.into(),
            auth_token: SecretString::new(auth_token.into()),
        })
    }

    /// Get the configured account sid.
    pub fn account_sid(&self) -> &str {
        &self.account_sid
    }

    /// Check that the carrier API is reachable and the credentials work.
    pub async fn health_check(&self) -> bool {
        self.client
            .get(format!(
                "{}/2010-04-01/Accounts/{}.json",
                self.base_url,
                encode(&self.account_sid)
            ))
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    /// Originate an outbound call leg.
    ///
    /// The carrier dials `to` presenting `from` as caller-ID and, once
    /// the leg is answered, POSTs to `callback_url` to fetch the
    /// voice-control document for it.
    #[instrument(skip(self, to, from, callback_url))]
    pub async fn originate_call(
        &self,
        to: &str,
        from: &str,
        callback_url: &str,
    ) -> Result<CallResource, CarrierError> {
        let params = [
            ("To", to),
            ("From", from),
            ("Url", callback_url),
            ("Method", "POST"),
        ];

        let response = self
            .client
            .post(format!(
                "{}/2010-04-01/Accounts/{}/Calls.json",
                self.base_url,
                encode(&self.account_sid)
            ))
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let call: CallResource = response.json().await?;
        debug!(call_sid = %call.sid, status = %call.status, "Originated call");
        Ok(call)
    }

    /// Hang up a placed call leg.
    #[instrument(skip(self))]
    pub async fn complete_call(&self, call_sid: &str) -> Result<(), CarrierError> {
        let params = [("Status", "completed")];

        let response = self
            .client
            .post(format!(
                "{}/2010-04-01/Accounts/{}/Calls/{}.json",
                self.base_url,
                encode(&self.account_sid),
                encode(call_sid)
            ))
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        debug!(call_sid = %call_sid, "Completed call");
        Ok(())
    }
}

/// Map a non-2xx carrier response to an API error, preferring the
/// message field of the JSON error body over the raw text.
async fn api_error(response: reqwest::Response) -> CarrierError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiErrorBody>(&body)
        .ok()
        .and_then(|e| e.message)
        .unwrap_or(body);

    CarrierError::Api { status, message }
}
