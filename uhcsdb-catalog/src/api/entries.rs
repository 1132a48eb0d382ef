//! Listing pages: paginated, complete, and curated favorites

use axum::{
    extract::{Path, State},
    response::Html,
};
use tracing::debug;
use uhcsdb_common::db::queries;

use crate::pagination::{page_count, paginate};
use crate::{pages, ApiResult, AppState};

/// GET / , /index , /entries/
pub async fn index(State(state): State<AppState>) -> ApiResult<Html<String>> {
    render_listing(&state, 1).await
}

/// GET /entries/:page
///
/// Out-of-range pages render an empty listing rather than an error.
pub async fn entries(
    State(state): State<AppState>,
    Path(page): Path<i64>,
) -> ApiResult<Html<String>> {
    render_listing(&state, page).await
}

async fn render_listing(state: &AppState, page: i64) -> ApiResult<Html<String>> {
    let all = queries::all_micrographs(&state.db).await?;
    let per_page = state.settings.per_page;
    let current = paginate(&all, page, per_page);
    debug!(
        "Listing page {}: {} of {} micrographs",
        page,
        current.items.len(),
        all.len()
    );

    Ok(Html(pages::entries_page(
        "Micrographs",
        current.items,
        Some((&current.nav, page_count(all.len(), per_page))),
    )))
}

/// GET /all/
pub async fn all_entries(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let all = queries::all_micrographs(&state.db).await?;
    Ok(Html(pages::entries_page("All micrographs", &all, None)))
}

/// GET /favorites/
pub async fn favorites(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let favs = queries::micrographs_by_ids(&state.db, &state.settings.favorites).await?;
    Ok(Html(pages::entries_page("Favorites", &favs, None)))
}
