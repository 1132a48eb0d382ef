//! Server-sent events for session updates
//!
//! Each stream opens with a `snapshot` event carrying the full view, then an
//! `update` event per applied control change.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::session::SessionView;
use crate::{ApiResult, AppState};

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

fn view_event(name: &'static str, view: &SessionView) -> Option<Event> {
    match Event::default().event(name).json_data(view) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Failed to serialize {} event: {}", name, e);
            None
        }
    }
}

/// GET /sessions/:session_id/events
pub async fn session_events(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    let session = state.session(&session_id).await?;
    let (initial, rx) = session.subscribe().await;
    // Weak, so dropping the session still closes its channel and ends the stream
    let alive = Arc::downgrade(&session);
    drop(session);
    debug!("Event stream opened for session {}", session_id);

    let stream = async_stream::stream! {
        if let Some(event) = view_event("snapshot", &initial) {
            yield Ok(event);
        }

        // Ends when the session is dropped
        let mut updates = BroadcastStream::new(rx);
        let mut ticks = tokio::time::interval(KEEP_ALIVE_INTERVAL);
        ticks.tick().await;
        loop {
            let item = tokio::select! {
                item = updates.next() => item,
                _ = ticks.tick() => match alive.upgrade() {
                    Some(session) => {
                        session.keep_alive();
                        continue;
                    }
                    None => break,
                },
            };
            match item {
                Some(Ok(view)) => {
                    if let Some(event) = view_event("update", &view) {
                        yield Ok(event);
                    }
                }
                Some(Err(e)) => {
                    // Updates carry the full view; the next one supersedes any skipped
                    warn!("Session {} event stream lagged: {}", session_id, e);
                }
                None => break,
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}
