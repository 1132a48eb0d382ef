//! Live explorer sessions
//!
//! Each page render gets its own session: a [`Projection`] behind an async
//! mutex plus a broadcast channel feeding that session's event streams.
//! Sessions not touched for the configured TTL are dropped by the reaper.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

use crate::controls::{Control, ControlState};
use crate::error::ApiError;
use crate::projection::{ControlError, PlotSource, Projection};

/// Buffered updates per session before slow subscribers start lagging
const UPDATE_CAPACITY: usize = 16;

/// Plot data and control values at one point in time
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub controls: ControlState,
    pub source: PlotSource,
}

pub struct Session {
    id: Uuid,
    projection: Arc<Mutex<Projection>>,
    updates: broadcast::Sender<Arc<SessionView>>,
    created: Instant,
    /// Milliseconds after `created` of the last access
    last_access_ms: AtomicU64,
}

impl Session {
    fn new(projection: Projection) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            id: Uuid::new_v4(),
            projection: Arc::new(Mutex::new(projection)),
            updates,
            created: Instant::now(),
            last_access_ms: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    fn touch(&self) {
        let ms = self.created.elapsed().as_millis() as u64;
        self.last_access_ms.fetch_max(ms, Ordering::Relaxed);
    }

    fn idle_for(&self, now: Instant) -> Duration {
        let last = self.created + Duration::from_millis(self.last_access_ms.load(Ordering::Relaxed));
        now.saturating_duration_since(last)
    }

    /// Current plot data and controls
    pub async fn view(&self) -> SessionView {
        self.touch();
        let projection = self.projection.lock().await;
        SessionView {
            controls: projection.state().clone(),
            source: projection.plot().clone(),
        }
    }

    /// Subscribe to updates, paired with the view they start after
    ///
    /// The subscription is taken under the projection lock, so no update can
    /// fall between the returned view and the first received update.
    pub async fn subscribe(&self) -> (SessionView, broadcast::Receiver<Arc<SessionView>>) {
        self.touch();
        let projection = self.projection.lock().await;
        let rx = self.updates.subscribe();
        let view = SessionView {
            controls: projection.state().clone(),
            source: projection.plot().clone(),
        };
        (view, rx)
    }

    /// Apply a control change and push the new view to every subscriber
    ///
    /// Changes to one session run one at a time; the recompute and the
    /// broadcast both happen on the blocking pool while the lock is held, so
    /// subscribers receive updates in the order they were applied.
    pub async fn apply_control(&self, control: Control, value: String) -> Result<ControlState, ApiError> {
        self.touch();
        let mut projection = self.projection.clone().lock_owned().await;
        let updates = self.updates.clone();
        let id = self.id;

        let applied = tokio::task::spawn_blocking(move || -> Result<ControlState, ControlError> {
            projection.apply(control, &value)?;
            let controls = projection.state().clone();
            let view = SessionView {
                controls: controls.clone(),
                source: projection.plot().clone(),
            };
            match updates.send(Arc::new(view)) {
                Ok(n) => debug!("Session {} update sent to {} subscribers", id, n),
                Err(_) => debug!("Session {} updated with no subscribers", id),
            }
            Ok(controls)
        })
        .await
        .map_err(|e| ApiError::Internal(format!("control update task failed: {}", e)))?;

        applied.map_err(ApiError::from)
    }

    /// Mark the session as in use without reading it
    ///
    /// An open event stream calls this on every keep-alive, so the TTL only
    /// runs once the page is gone.
    pub fn keep_alive(&self) {
        self.touch();
    }
}

/// All live sessions, keyed by id
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn create(&self, projection: Projection) -> Arc<Session> {
        let session = Arc::new(Session::new(projection));
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        info!("Created session {}", session.id);
        session
    }

    pub async fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        let session = self.sessions.read().await.get(id).cloned()?;
        session.touch();
        Some(session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop every session
    pub async fn clear(&self) {
        let mut sessions = self.sessions.write().await;
        info!("Closing {} sessions", sessions.len());
        sessions.clear();
    }

    /// Drop sessions idle longer than the TTL; returns how many were dropped
    pub async fn reap_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.idle_for(now) <= self.ttl);
        let reaped = before - sessions.len();
        if reaped > 0 {
            info!("Reaped {} idle sessions, {} remain", reaped, sessions.len());
        }
        reaped
    }

    /// Run [`reap_expired`](Self::reap_expired) periodically until the task is aborted
    pub fn spawn_reaper(self: Arc<Self>) -> JoinHandle<()> {
        let period = (self.ttl / 4).max(Duration::from_secs(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                self.reap_expired().await;
            }
        })
    }
}
