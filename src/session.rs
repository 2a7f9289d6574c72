//! One isolated set of controllers per page view.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::assistant::{AiResponder, AssistantController, AssistantView, WeatherResponder};
use crate::error::SessionError;
use crate::journey::{JourneyView, ProfileSink, StyleJourney};
use crate::showcase::{OutfitBoard, OutfitView};

/// State owned by a single page view. Nothing is shared between sessions.
pub struct Session {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub assistant: Arc<AssistantController>,
    journey: Mutex<Option<StyleJourney>>,
    outfits: Mutex<OutfitBoard>,
    sink: Arc<dyn ProfileSink>,
    last_active: Mutex<Instant>,
    connections: AtomicUsize,
    closed: watch::Sender<bool>,
}

/// Full render-ready snapshot of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub assistant: AssistantView,
    pub outfits: Vec<OutfitView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub journey: Option<JourneyView>,
}

/// Held by an open socket. The session is not pruned while any exist.
pub struct ConnectionGuard {
    session: Arc<Session>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.session.connections.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Session {
    pub fn new(
        ai: Arc<dyn AiResponder>,
        weather: Arc<dyn WeatherResponder>,
        sink: Arc<dyn ProfileSink>,
    ) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            assistant: Arc::new(AssistantController::new(ai, weather)),
            journey: Mutex::new(None),
            outfits: Mutex::new(OutfitBoard::new()),
            sink,
            last_active: Mutex::new(Instant::now()),
            connections: AtomicUsize::new(0),
            closed,
        }
    }

    /// Record activity now.
    pub async fn touch(&self) {
        *self.last_active.lock().await = Instant::now();
    }

    /// Time since the last activity.
    pub async fn idle_for(&self) -> Duration {
        self.last_active.lock().await.elapsed()
    }

    /// Register an open socket.
    pub fn connect(self: &Arc<Self>) -> ConnectionGuard {
        self.connections.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard {
            session: Arc::clone(self),
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Watch for the session being dropped from its registry.
    pub fn closed(&self) -> watch::Receiver<bool> {
        self.closed.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    fn close(&self) {
        self.closed.send_replace(true);
    }

    pub async fn toggle_like(&self, index: usize) -> Result<bool, SessionError> {
        self.outfits.lock().await.toggle_like(index)
    }

    /// Open the Style Journey overlay. Re-opening keeps an in-progress journey.
    pub async fn open_journey(&self) -> JourneyView {
        let mut journey = self.journey.lock().await;
        journey.get_or_insert_with(StyleJourney::new).view()
    }

    /// Run `f` against the open journey.
    pub async fn with_journey<T>(
        &self,
        f: impl FnOnce(&mut StyleJourney) -> T,
    ) -> Result<T, SessionError> {
        let mut journey = self.journey.lock().await;
        journey.as_mut().map(f).ok_or(SessionError::JourneyNotOpen)
    }

    /// Submit the open journey to the profile sink and close it.
    pub async fn submit_journey(&self) -> Result<(), SessionError> {
        let journey = self
            .journey
            .lock()
            .await
            .take()
            .ok_or(SessionError::JourneyNotOpen)?;
        journey.submit(self.sink.as_ref());
        Ok(())
    }

    /// Discard the open journey.
    pub async fn cancel_journey(&self) -> Result<(), SessionError> {
        let journey = self
            .journey
            .lock()
            .await
            .take()
            .ok_or(SessionError::JourneyNotOpen)?;
        journey.cancel();
        Ok(())
    }

    pub async fn view(&self) -> SessionView {
        let journey = self.journey.lock().await.as_ref().map(StyleJourney::view);
        SessionView {
            id: self.id,
            created_at: self.created_at,
            assistant: self.assistant.view().await,
            outfits: self.outfits.lock().await.view(),
            journey,
        }
    }
}

/// Live sessions, keyed by id, plus the collaborators every session uses.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    ai: Arc<dyn AiResponder>,
    weather: Arc<dyn WeatherResponder>,
    sink: Arc<dyn ProfileSink>,
}

impl SessionRegistry {
    pub fn new(
        ai: Arc<dyn AiResponder>,
        weather: Arc<dyn WeatherResponder>,
        sink: Arc<dyn ProfileSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            ai,
            weather,
            sink,
        })
    }

    pub async fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session::new(
            Arc::clone(&self.ai),
            Arc::clone(&self.weather),
            Arc::clone(&self.sink),
        ));
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        info!(session_id = %session.id, "Session created");
        session
    }

    /// Look up a session and mark it active.
    pub async fn get(&self, id: Uuid) -> Result<Arc<Session>, SessionError> {
        let session = self
            .sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or(SessionError::NotFound { id })?;
        session.touch().await;
        Ok(session)
    }

    /// Drop a session and close its sockets. Pending requests finish
    /// against the detached state.
    pub async fn remove(&self, id: Uuid) -> Result<(), SessionError> {
        let session = self
            .sessions
            .write()
            .await
            .remove(&id)
            .ok_or(SessionError::NotFound { id })?;
        session.close();
        info!(session_id = %id, "Session closed");
        Ok(())
    }

    /// Drop sessions with no open socket and no activity for `idle`.
    /// Returns how many were removed.
    pub async fn prune_stale(&self, idle: Duration) -> usize {
        let mut stale = Vec::new();
        for (id, session) in self.sessions.read().await.iter() {
            if session.connection_count() == 0 && session.idle_for().await >= idle {
                stale.push(*id);
            }
        }
        if stale.is_empty() {
            return 0;
        }

        let mut sessions = self.sessions.write().await;
        let mut pruned = 0;
        for id in stale {
            // activity may have landed since the scan
            let Some(session) = sessions.get(&id) else {
                continue;
            };
            if session.connection_count() > 0 || session.idle_for().await < idle {
                continue;
            }
            if let Some(session) = sessions.remove(&id) {
                session.close();
                debug!(session_id = %id, "Pruned idle session");
                pruned += 1;
            }
        }
        info!(pruned, remaining = sessions.len(), "Pruned stale sessions");
        pruned
    }

    /// Prune idle sessions every `every` until the task is aborted.
    pub fn spawn_pruner(self: &Arc<Self>, idle: Duration, every: Duration) -> JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            interval.tick().await; // first tick is immediate
            loop {
                interval.tick().await;
                registry.prune_stale(idle).await;
            }
        })
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}
