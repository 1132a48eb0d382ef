//! Visually similar micrographs

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    response::Html,
};
use tracing::{debug, warn};
use uhcsdb_common::db::queries;

use crate::api::micrograph::load_entry;
use crate::{pages, ApiError, ApiResult, AppState};

/// GET /visual_query/:entry_id
///
/// Neighbors come back from the index nearest first; they are joined to their
/// records in one query that keeps that order.
pub async fn visual_query(
    State(state): State<AppState>,
    Path(entry_id): Path<i64>,
) -> ApiResult<Html<String>> {
    let (query, author) = load_entry(&state, entry_id).await?;

    let index = state
        .index
        .as_ref()
        .ok_or_else(|| ApiError::MissingData("Visual search index is not loaded".to_string()))?;

    let neighbors = index.query(entry_id, state.settings.neighbors)?;
    let scores: HashMap<i64, f64> = neighbors
        .ids
        .iter()
        .copied()
        .zip(neighbors.scores.iter().copied())
        .collect();

    let entries = queries::micrographs_in_order(&state.db, &neighbors.ids).await?;
    if entries.len() < neighbors.len() {
        warn!(
            "{} of {} neighbors of micrograph {} are not in the store",
            neighbors.len() - entries.len(),
            neighbors.len(),
            entry_id
        );
    }

    let results: Vec<_> = entries
        .into_iter()
        .filter_map(|entry| scores.get(&entry.id).map(|score| (entry, *score)))
        .collect();
    debug!("Visual query {} -> {} results", entry_id, results.len());

    Ok(Html(pages::query_results_page(
        &query,
        author.as_ref(),
        &results,
    )))
}
