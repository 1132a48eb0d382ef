//! Error types for uhcsdb-explorer
//!
//! Explorer routes answer JSON; errors use the shared
//! `{"error": {"code", "message"}}` envelope, except rejected control
//! changes, which name the control so the page can flag it.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};
use uhcsdb_common::api::ErrorBody;

use crate::controls::Control;
use crate::projection::ControlError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown session or view (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Control change could not be applied; previous state kept (422)
    #[error("Control {control} rejected: {message}")]
    ControlRejected { control: Control, message: String },

    /// Cached embeddings needed for a new session are absent (503)
    #[error("Missing data: {0}")]
    MissingData(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        ApiError::ControlRejected {
            control: err.control,
            message: err.message,
        }
    }
}

impl From<uhcsdb_common::Error> for ApiError {
    fn from(err: uhcsdb_common::Error) -> Self {
        match err {
            uhcsdb_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            uhcsdb_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            uhcsdb_common::Error::MissingData(msg) => ApiError::MissingData(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::ControlRejected { control, message } => {
                warn!("Rejected {} change: {}", control, message);
                let body = Json(json!({
                    "control": control,
                    "error": message,
                }));
                return (StatusCode::UNPROCESSABLE_ENTITY, body).into_response();
            }
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::MissingData(msg) => {
                error!("Missing data: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, "MISSING_DATA", msg)
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
