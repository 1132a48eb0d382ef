//! Shared API request/response types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Named view served by the explorer and embedded by the catalog
pub const VISUALIZE_APP_PATH: &str = "/visualize";

/// Request a new live session of a named view
///
/// ```
/// use uhcsdb_common::api::types::CreateSessionRequest;
///
/// let req = CreateSessionRequest::new("/visualize");
/// assert_eq!(serde_json::to_string(&req).unwrap(), r#"{"app_path":"/visualize"}"#);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    pub app_path: String,
}

impl CreateSessionRequest {
    pub fn new(app_path: impl Into<String>) -> Self {
        Self {
            app_path: app_path.into(),
        }
    }
}

/// Handle to a freshly created session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub app_path: String,
}

/// Health check response, shape shared by both services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub module: String,
    pub version: String,
    pub uptime_seconds: u64,
}

/// JSON error envelope: `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}
