//! Error types for uhcsdb-catalog
//!
//! Catalog routes serve HTML, so errors render as a small HTML page carrying
//! the status code rather than a JSON envelope.

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use crate::bridge::BridgeError;
use crate::pages;

/// Result type for catalog handlers
pub type ApiResult<T> = Result<T, ApiError>;

/// Catalog error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Requested entry does not exist (404)
    #[error("{0}")]
    NotFound(String),

    /// Explorer process unreachable or missing the requested view (502)
    #[error("{0}")]
    UpstreamUnavailable(String),

    /// A precomputed file needed to answer is absent (503)
    #[error("{0}")]
    MissingData(String),

    /// Internal server error (500)
    #[error("{0}")]
    Internal(String),
}

impl From<uhcsdb_common::Error> for ApiError {
    fn from(err: uhcsdb_common::Error) -> Self {
        match err {
            uhcsdb_common::Error::NotFound(msg) => ApiError::NotFound(msg),
            uhcsdb_common::Error::MissingData(msg) => ApiError::MissingData(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        ApiError::UpstreamUnavailable(err.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            ApiError::MissingData(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            ApiError::NotFound(msg) => warn!("404: {}", msg),
            ApiError::UpstreamUnavailable(msg) => error!("Explorer unavailable: {}", msg),
            ApiError::MissingData(msg) => error!("Missing data: {}", msg),
            ApiError::Internal(msg) => error!("Internal error: {}", msg),
        }

        (status, Html(pages::error_page(status, &self.to_string()))).into_response()
    }
}
