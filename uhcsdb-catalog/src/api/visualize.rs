//! Page embedding a live explorer session

use axum::{extract::State, response::Html};
use tracing::info;
use uhcsdb_common::api::VISUALIZE_APP_PATH;

use crate::{pages, ApiResult, AppState};

/// GET /visualize
///
/// Fails with 502 when the explorer cannot be reached or does not serve the
/// view; the page is never rendered without a session.
pub async fn visualize(State(state): State<AppState>) -> ApiResult<Html<String>> {
    state.explorer.ensure_running().await?;

    let client = state.explorer.client();
    let session = client.pull_session(VISUALIZE_APP_PATH).await?;
    info!("Embedding explorer session {}", session.session_id);

    Ok(Html(pages::visualize_page(&client.autoload_fragment(&session))))
}
