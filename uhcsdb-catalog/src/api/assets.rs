//! Static images and thumbnails
//!
//! Files under `<data_dir>/static` are served as-is, but only when their
//! extension is in the allowed set; everything else is a 404.

use axum::{
    extract::{Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Router,
};
use tower_http::services::ServeDir;

use crate::{ApiError, AppState};

async fn allowed_extension_guard(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path();
    let file_name = path.rsplit('/').next().unwrap_or_default();

    if !state.settings.allowed_file(file_name) {
        return ApiError::NotFound(format!("{} is not a servable file", path)).into_response();
    }

    next.run(request).await
}

/// Build /static routes rooted at the configured data folder
pub fn static_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest_service("/static", ServeDir::new(state.settings.static_dir()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            allowed_extension_guard,
        ))
}
