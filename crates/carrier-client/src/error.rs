//! Carrier client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CarrierError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Carrier API error: {status} - {message}")]
    Api { status: u16, message: String },
}
