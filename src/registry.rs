//! Per-session scheduler registry
//!
//! Explicit map from session id to its scheduler, owned by the lifecycle
//! host. Sessions are created on first use and removed on teardown; there
//! is no ambient global state.

use crate::scheduler::PlaybackScheduler;
use crate::types::SessionId;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Registry of live playback schedulers, one per session
#[derive(Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionId, Arc<PlaybackScheduler>>>,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live sessions
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Check if no sessions are live
    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.is_empty()
    }

    /// Look up the scheduler for a session
    pub async fn get(&self, session: SessionId) -> Option<Arc<PlaybackScheduler>> {
        self.sessions.lock().await.get(&session).cloned()
    }

    /// Get the scheduler for a session, creating it on first use
    ///
    /// The factory runs under the registry lock so two callers cannot race
    /// a second scheduler into existence for the same session.
    pub async fn get_or_create<F, Fut>(&self, session: SessionId, create: F) -> Arc<PlaybackScheduler>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Arc<PlaybackScheduler>>,
    {
        let mut sessions = self.sessions.lock().await;
        if let Some(existing) = sessions.get(&session) {
            return Arc::clone(existing);
        }

        info!(%session, "creating playback session");
        let scheduler = create().await;
        sessions.insert(session, Arc::clone(&scheduler));
        scheduler
    }

    /// Remove a session's scheduler without stopping it
    ///
    /// Callers stop the scheduler themselves (or already have, in the
    /// idle-timeout path).
    pub async fn remove(&self, session: SessionId) -> Option<Arc<PlaybackScheduler>> {
        let removed = self.sessions.lock().await.remove(&session);
        if removed.is_some() {
            info!(%session, "removed playback session");
        }
        removed
    }

    /// Stop every scheduler and empty the registry (host shutdown)
    pub async fn shutdown_all(&self) {
        let drained: Vec<_> = {
            let mut sessions = self.sessions.lock().await;
            sessions.drain().collect()
        };

        info!(count = drained.len(), "shutting down all playback sessions");
        for (_, scheduler) in drained {
            scheduler.stop().await;
        }
    }
}
