//! Callmask - masked call bridging service.
//!
//! Bridges two phone numbers through a carrier conference under a masking
//! caller-ID, so neither party learns the other's real number:
//! - Originates both call legs through the carrier REST API
//! - Serves per-leg voice documents as the carrier reports answers
//! - Reclaims sessions whose legs never all answered

pub mod api;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod reclaimer;

pub use config::Config;
pub use error::BridgeError;
pub use orchestrator::BridgeOrchestrator;
pub use reclaimer::Reclaimer;
