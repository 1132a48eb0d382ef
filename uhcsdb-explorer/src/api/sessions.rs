//! Session creation, data and control endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use uhcsdb_common::api::{CreateSessionRequest, CreateSessionResponse, VISUALIZE_APP_PATH};
use uuid::Uuid;

use crate::controls::{Control, ControlOptions, ControlState};
use crate::projection::PlotSource;
use crate::{ApiError, ApiResult, AppState};

/// Views this process can create sessions for
const VIEWS: [&str; 1] = [VISUALIZE_APP_PATH];

/// POST /sessions
pub async fn create_session(
    State(state): State<AppState>,
    Json(req): Json<CreateSessionRequest>,
) -> ApiResult<(StatusCode, Json<CreateSessionResponse>)> {
    if !VIEWS.contains(&req.app_path.as_str()) {
        return Err(ApiError::NotFound(format!("no view named {}", req.app_path)));
    }

    let session = state.new_session().await?;
    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id: session.id(),
            app_path: req.app_path,
        }),
    ))
}

/// Everything a page needs to draw the controls and the plot
#[derive(Debug, Serialize)]
pub struct SessionData {
    pub session_id: Uuid,
    pub options: ControlOptions,
    pub controls: ControlState,
    pub source: PlotSource,
}

/// GET /sessions/:session_id/data
pub async fn session_data(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Json<SessionData>> {
    let session = state.session(&session_id).await?;
    let view = session.view().await;

    Ok(Json(SessionData {
        session_id,
        options: ControlOptions::new(&state.representations),
        controls: view.controls,
        source: view.source,
    }))
}

/// Control change request body
#[derive(Debug, Deserialize)]
pub struct ControlChange {
    pub control: Control,
    pub value: String,
}

/// POST /sessions/:session_id/controls
///
/// Responds with the new control values; the new plot data goes out on the
/// session's event stream.
pub async fn apply_control(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(change): Json<ControlChange>,
) -> ApiResult<Json<ControlState>> {
    let session = state.session(&session_id).await?;
    let controls = session.apply_control(change.control, change.value).await?;
    Ok(Json(controls))
}
