//! Loader script and standalone page for the `/visualize` view

use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{ApiError, ApiResult, AppState};

const EXPLORER_JS: &str = include_str!("../../ui/explorer.js");

#[derive(Debug, Deserialize)]
pub struct AutoloadParams {
    pub session_id: Uuid,
    /// Id of the element the plot is mounted into
    pub element: String,
}

/// GET /visualize/autoload.js
///
/// Returns the explorer client followed by a call mounting `session_id`
/// into `element`. Point clicks open detail pages on the catalog origin.
pub async fn autoload_js(
    State(state): State<AppState>,
    Query(params): Query<AutoloadParams>,
) -> ApiResult<Response> {
    if params.element.is_empty() {
        return Err(ApiError::BadRequest("element must not be empty".to_string()));
    }
    state.session(&params.session_id).await?;

    let config = json!({
        "base": state.settings.explorer.public_url.trim_end_matches('/'),
        "catalog": state.settings.explorer.allowed_origin.trim_end_matches('/'),
        "sessionId": params.session_id,
        "element": params.element,
    });
    let script = format!("{}\nUhcsdbExplorer.mount({});\n", EXPLORER_JS, config);

    Ok((
        [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
        script,
    )
        .into_response())
}

/// GET /visualize
///
/// The explorer on its own page, outside the catalog.
pub async fn standalone_page(State(state): State<AppState>) -> ApiResult<Html<String>> {
    let session = state.new_session().await?;
    let element = format!("explorer-{}", session.id().simple());

    Ok(Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>UHCSDB: a microstructure explorer</title>
</head>
<body style="font-family: system-ui, sans-serif; margin: 24px;">
    <div id="{element}"></div>
    <script src="/visualize/autoload.js?session_id={session}&amp;element={element}" async></script>
</body>
</html>"#,
        element = element,
        session = session.id(),
    )))
}
