//! Carrier API wire types.

use serde::{Deserialize, Serialize};

/// An outbound call attempt as the carrier reports it.
///
/// "queued" on creation only means the attempt was accepted; the
/// answer event arrives later on the callback URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallResource {
    /// Carrier-assigned call identifier
    pub sid: String,

    /// Carrier-side call status at the time of the response
    pub status: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
}

/// Error body the carrier attaches to non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub code: Option<u32>,

    #[serde(default)]
    pub message: Option<String>,
}
