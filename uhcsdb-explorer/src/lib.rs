//! uhcsdb-explorer library - interactive microstructure explorer
//!
//! Serves per-session scatterplots of precomputed 2-D embeddings, colored and
//! sized by micrograph metadata. Control changes are applied server-side and
//! pushed to the page over server-sent events.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use chrono::{DateTime, Utc};
use uhcsdb_common::Settings;
use uuid::Uuid;

pub mod api;
pub mod controls;
pub mod dataset;
pub mod embedding;
pub mod error;
pub mod palette;
pub mod projection;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use crate::controls::ControlState;
use crate::dataset::Dataset;
use crate::embedding::CoordinateSource;
use crate::projection::Projection;
use crate::session::{Session, SessionRegistry};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    /// Classified micrographs, loaded once at startup
    pub dataset: Arc<Dataset>,
    pub coordinates: Arc<dyn CoordinateSource>,
    /// Representation files offered by the representation control
    pub representations: Arc<Vec<String>>,
    pub sessions: Arc<SessionRegistry>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        dataset: Dataset,
        coordinates: Arc<dyn CoordinateSource>,
        representations: Vec<String>,
    ) -> Self {
        let ttl = Duration::from_secs(settings.explorer.session_ttl_secs);
        Self {
            settings: Arc::new(settings),
            dataset: Arc::new(dataset),
            coordinates,
            representations: Arc::new(representations),
            sessions: Arc::new(SessionRegistry::new(ttl)),
            startup_time: Utc::now(),
        }
    }

    /// Start a session at the initial control values
    pub async fn new_session(&self) -> ApiResult<Arc<Session>> {
        let initial = ControlState::initial(&self.representations).ok_or_else(|| {
            ApiError::MissingData(format!(
                "no representation files in {}",
                self.settings.tsne_dir().display()
            ))
        })?;

        let dataset = self.dataset.clone();
        let coordinates = self.coordinates.clone();
        let representations = self.representations.clone();
        let projection = tokio::task::spawn_blocking(move || {
            Projection::new(dataset, coordinates, representations, initial)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("session setup task failed: {}", e)))??;

        Ok(self.sessions.create(projection).await)
    }

    /// Look up a live session, 404 when unknown or expired
    pub async fn session(&self, id: &Uuid) -> ApiResult<Arc<Session>> {
        self.sessions
            .get(id)
            .await
            .ok_or_else(|| ApiError::NotFound(format!("no session {}", id)))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::{get, post};
    use tower_http::trace::TraceLayer;

    let cors = api::cors_layer(&state.settings.explorer.allowed_origin);

    Router::new()
        .route("/sessions", post(api::create_session))
        .route("/sessions/:session_id/data", get(api::session_data))
        .route("/sessions/:session_id/controls", post(api::apply_control))
        .route("/sessions/:session_id/events", get(api::session_events))
        .route("/visualize", get(api::standalone_page))
        .route("/visualize/autoload.js", get(api::autoload_js))
        .merge(api::health_routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
