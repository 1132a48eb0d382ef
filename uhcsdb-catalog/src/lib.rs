//! uhcsdb-catalog library - micrograph catalog web service
//!
//! Serves paginated listings, detail pages and visual similarity queries over
//! the micrograph store, and embeds live sessions from the explorer process.

use std::sync::Arc;

use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uhcsdb_common::Settings;

pub mod api;
pub mod bridge;
pub mod error;
pub mod pages;
pub mod pagination;
pub mod similarity;
pub mod supervisor;

pub use crate::error::{ApiError, ApiResult};

use crate::similarity::NeighborIndex;
use crate::supervisor::ExplorerSupervisor;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Read-only connection pool for the micrograph store
    pub db: SqlitePool,
    pub settings: Arc<Settings>,
    /// Feature index for visual queries; `None` when the feature file is absent
    pub index: Option<Arc<dyn NeighborIndex>>,
    pub explorer: Arc<ExplorerSupervisor>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        settings: Settings,
        index: Option<Arc<dyn NeighborIndex>>,
        explorer: ExplorerSupervisor,
    ) -> Self {
        Self {
            db,
            settings: Arc::new(settings),
            index,
            explorer: Arc::new(explorer),
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;
    use tower_http::trace::TraceLayer;

    let pages = Router::new()
        .route("/", get(api::index))
        .route("/index", get(api::index))
        .route("/entries/", get(api::index))
        .route("/entries/:page", get(api::entries))
        .route("/all/", get(api::all_entries))
        .route("/favorites/", get(api::favorites))
        .route("/micrograph/:entry_id", get(api::show_entry))
        .route("/visual_query/:entry_id", get(api::visual_query))
        .route("/visualize", get(api::visualize));

    Router::new()
        .merge(pages)
        .merge(api::static_routes(&state))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
