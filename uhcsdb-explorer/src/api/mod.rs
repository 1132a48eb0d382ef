//! HTTP handlers for uhcsdb-explorer

pub mod events;
pub mod health;
pub mod page;
pub mod sessions;

pub use events::session_events;
pub use health::health_routes;
pub use page::{autoload_js, standalone_page};
pub use sessions::{apply_control, create_session, session_data};

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tracing::warn;

/// Allow the catalog's origin to call session endpoints from embedded pages
pub fn cors_layer(allowed_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    match HeaderValue::from_str(allowed_origin) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            warn!("Ignoring allowed origin {:?}: {}", allowed_origin, e);
            layer
        }
    }
}
