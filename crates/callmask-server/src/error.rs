//! Error types for the call bridge.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use bridge_store::StoreError;
use carrier_client::CarrierError;
use serde::Serialize;
use thiserror::Error;

/// Bridge error types.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unknown session: {0}")]
    UnknownSession(String),

    #[error("Call origination failed: {0}")]
    OriginationFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for BridgeError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            BridgeError::InvalidArgument(_) => (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT"),
            BridgeError::UnknownSession(_) => (StatusCode::NOT_FOUND, "UNKNOWN_SESSION"),
            BridgeError::OriginationFailed(_) => (StatusCode::BAD_GATEWAY, "ORIGINATION_FAILED"),
            BridgeError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            error: self.to_string(),
            code: code.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for BridgeError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UnknownSession(id) => BridgeError::UnknownSession(id),
        }
    }
}

impl From<CarrierError> for BridgeError {
    fn from(e: CarrierError) -> Self {
        BridgeError::OriginationFailed(e.to_string())
    }
}
