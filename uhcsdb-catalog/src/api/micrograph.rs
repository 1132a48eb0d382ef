//! Single micrograph detail page

use axum::{
    extract::{Path, State},
    response::Html,
};
use uhcsdb_common::db::{queries, MicrographInfo, User};

use crate::{pages, ApiError, ApiResult, AppState};

/// Fetch a micrograph and its contributor, 404 when the id is unknown
pub(crate) async fn load_entry(
    state: &AppState,
    entry_id: i64,
) -> ApiResult<(MicrographInfo, Option<User>)> {
    let entry = queries::micrograph_by_id(&state.db, entry_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No micrograph with id {}", entry_id)))?;

    let author = match entry.user_id {
        Some(user_id) => queries::user_by_id(&state.db, user_id).await?,
        None => None,
    };

    Ok((entry, author))
}

/// URL of the full-size image, if its file type may be served
fn image_url(state: &AppState, entry: &MicrographInfo) -> Option<String> {
    let path = entry.path.as_deref()?;
    if !state.settings.allowed_file(path) {
        return None;
    }
    let folder = state.settings.micrograph_path.to_string_lossy();
    Some(format!("/{}/{}", folder.trim_matches('/'), path))
}

/// GET /micrograph/:entry_id
pub async fn show_entry(
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
) -> ApiResult<Html<String>> {
    let (entry, author) = load_entry(&state, entry_id).await?;
    let image = image_url(&state, &entry);
    Ok(Html(pages::entry_page(&entry, author.as_ref(), image.as_deref())))
}
