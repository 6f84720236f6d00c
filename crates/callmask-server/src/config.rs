//! Configuration for the call bridge server.

use anyhow::{Context, Result};
use bridge_store::LegRole;
use serde::Deserialize;
use std::time::Duration;

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Carrier API configuration
    pub carrier: CarrierConfig,

    /// Bridge behavior configuration
    #[serde(default)]
    pub bridge: BridgeConfig,

    /// Logging configuration
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Server listen address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL the carrier can reach for webhook callbacks
    pub public_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CarrierConfig {
    /// Carrier REST API base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Carrier account sid
    pub account_sid: String,

    /// Carrier auth token
    pub auth_token: String,

    /// Caller-ID presented to both legs
    pub masking_number: String,

    /// Per-request HTTP timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    /// How long a session may ring before it is reclaimed
    #[serde(default = "default_answer_timeout", with = "humantime_serde")]
    pub answer_timeout: Duration,

    /// How long bridged sessions are retained before eviction
    #[serde(default = "default_session_ttl", with = "humantime_serde")]
    pub session_ttl: Duration,

    /// Which leg hears the announcement before joining
    #[serde(default)]
    pub announce_to: AnnounceTarget,

    /// Announcement spoken before joining the conference
    #[serde(default = "default_announcement")]
    pub announcement: String,

    /// Apology spoken when a call cannot be completed
    #[serde(default = "default_apology")]
    pub apology: String,

    /// Notice spoken to direct inbound calls on the masking number
    #[serde(default = "default_incoming_notice")]
    pub incoming_notice: String,

    /// Language for spoken prompts
    #[serde(default = "default_language")]
    pub language: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Which leg hears the pre-join announcement.
///
/// The default announces to the caller only. The callee just finds
/// themselves in the call, with no hint of an intermediary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnounceTarget {
    Caller,
    Callee,
    Both,
    None,
}

impl AnnounceTarget {
    /// Whether the given leg should hear the announcement.
    pub fn includes(self, role: LegRole) -> bool {
        match self {
            AnnounceTarget::Caller => role == LegRole::Caller,
            AnnounceTarget::Callee => role == LegRole::Callee,
            AnnounceTarget::Both => true,
            AnnounceTarget::None => false,
        }
    }
}

// Default implementations
impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            answer_timeout: default_answer_timeout(),
            session_ttl: default_session_ttl(),
            announce_to: AnnounceTarget::default(),
            announcement: default_announcement(),
            apology: default_apology(),
            incoming_notice: default_incoming_notice(),
            language: default_language(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AnnounceTarget {
    fn default() -> Self {
        AnnounceTarget::Caller
    }
}

// Default value functions
fn default_listen_addr() -> String {
    "0.0.0.0".into()
}

fn default_port() -> u16 {
    8080
}

fn default_api_url() -> String {
    "https://api.twilio.com".into()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_answer_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_session_ttl() -> Duration {
    Duration::from_secs(4 * 60 * 60) // 4 hours
}

fn default_announcement() -> String {
    "Connecting you now.".into()
}

fn default_apology() -> String {
    "We are sorry, your call cannot be completed at this time. Please try again later. Goodbye."
        .into()
}

fn default_incoming_notice() -> String {
    "This number cannot accept incoming calls. Goodbye.".into()
}

fn default_language() -> String {
    "en".into()
}

fn default_log_level() -> String {
    "info".into()
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Note: try_parsing(true) would parse +15550001111 as a positive number
                    // stripping the + prefix. Keep strings as strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_announce_target_includes() {
        assert!(AnnounceTarget::Caller.includes(LegRole::Caller));
        assert!(!AnnounceTarget::Caller.includes(LegRole::Callee));
        assert!(!AnnounceTarget::Callee.includes(LegRole::Caller));
        assert!(AnnounceTarget::Callee.includes(LegRole::Callee));
        assert!(AnnounceTarget::Both.includes(LegRole::Caller));
        assert!(AnnounceTarget::Both.includes(LegRole::Callee));
        assert!(!AnnounceTarget::None.includes(LegRole::Caller));
        assert!(!AnnounceTarget::None.includes(LegRole::Callee));
    }

    #[test]
    fn test_announce_target_parses_lowercase() {
        let target: AnnounceTarget = serde_json::from_str("\"callee\"").unwrap();
        assert_eq!(target, AnnounceTarget::Callee);
        let target: AnnounceTarget = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(target, AnnounceTarget::None);
    }

    #[test]
    fn test_bridge_defaults() {
        let bridge = BridgeConfig::default();
        assert_eq!(bridge.answer_timeout, Duration::from_secs(60));
        assert_eq!(bridge.announce_to, AnnounceTarget::Caller);
        assert_eq!(bridge.language, "en");
    }
}
