//! Session bridge to the explorer process
//!
//! The catalog never proxies plot traffic. It asks the explorer for a fresh
//! session of a named view and embeds a loader script pointing at the
//! explorer, so the browser talks to the explorer directly from then on.

use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;
use uhcsdb_common::api::{CreateSessionRequest, CreateSessionResponse, HealthResponse};

/// Failures reaching or using the explorer
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Connection refused, timed out, or the process could not be started
    #[error("Explorer unreachable at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    /// The explorer is running but does not serve the requested view
    #[error("Explorer has no view named {0}")]
    ViewNotFound(String),

    /// The explorer answered with something other than the expected payload
    #[error("Explorer protocol error: {0}")]
    Protocol(String),
}

/// HTTP client for the explorer's session endpoints
#[derive(Debug, Clone)]
pub struct ExplorerClient {
    http: reqwest::Client,
    base_url: String,
}

impl ExplorerClient {
    /// Create a client with a hard per-request timeout
    ///
    /// Every call is bounded so a wedged explorer surfaces as an error instead
    /// of a page that never finishes loading.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BridgeError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| BridgeError::Protocol(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn unreachable(&self, e: reqwest::Error) -> BridgeError {
        BridgeError::Unreachable {
            url: self.base_url.clone(),
            reason: e.to_string(),
        }
    }

    /// GET /health on the explorer
    pub async fn health(&self) -> Result<HealthResponse, BridgeError> {
        let response = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        if !response.status().is_success() {
            return Err(BridgeError::Protocol(format!(
                "health check returned {}",
                response.status()
            )));
        }

        response
            .json::<HealthResponse>()
            .await
            .map_err(|e| BridgeError::Protocol(format!("bad health response: {}", e)))
    }

    /// Create a live session of the view served at `app_path`
    pub async fn pull_session(&self, app_path: &str) -> Result<CreateSessionResponse, BridgeError> {
        let response = self
            .http
            .post(format!("{}/sessions", self.base_url))
            .json(&CreateSessionRequest::new(app_path))
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(BridgeError::ViewNotFound(app_path.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                return Err(BridgeError::Protocol(format!(
                    "session request returned {}: {}",
                    status, body
                )));
            }
        }

        let session = response
            .json::<CreateSessionResponse>()
            .await
            .map_err(|e| BridgeError::Protocol(format!("bad session response: {}", e)))?;

        debug!("Pulled explorer session {} for {}", session.session_id, app_path);
        Ok(session)
    }

    /// HTML fragment that loads `session` into the page
    ///
    /// The browser fetches the loader straight from the explorer, which then
    /// mounts the plot into the generated container element.
    pub fn autoload_fragment(&self, session: &CreateSessionResponse) -> String {
        let element = format!("explorer-{}", session.session_id.simple());
        format!(
            r#"<div id="{element}" class="explorer-root"></div>
<script src="{base}{path}/autoload.js?session_id={session}&amp;element={element}" async></script>"#,
            element = element,
            base = self.base_url,
            path = session.app_path,
            session = session.session_id,
        )
    }
}
