//! Session store
//!
//! Volatile, cleared on restart. [`MemorySessionStore`] uses Moka so
//! entries expire on their own after the configured session max age.

use axum::async_trait;
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use super::session::Session;

/// Server-side session storage keyed by session ID
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Store a session under its ID
    async fn insert(&self, session: Session);

    /// Look up a live session
    ///
    /// Expired sessions are evicted and reported as absent.
    async fn get(&self, id: &str) -> Option<Session>;

    /// Invalidate a session, returning it if it existed
    async fn remove(&self, id: &str) -> Option<Session>;
}

/// In-process session store
pub struct MemorySessionStore {
    /// Session ID -> Session
    sessions: Cache<String, Arc<Session>>,
}

impl MemorySessionStore {
    /// Create new session store
    ///
    /// # Arguments
    /// * `ttl_secs` - Time-to-live for each entry
    pub fn new(ttl_secs: u64) -> Self {
        let sessions = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { sessions }
    }

    /// Number of stored sessions, after pending inserts and removals settle
    pub async fn session_count(&self) -> u64 {
        self.sessions.run_pending_tasks().await;
        self.sessions.entry_count()
    }

    async fn record_size(&self) {
        use crate::metrics::ACTIVE_SESSIONS;
        ACTIVE_SESSIONS.set(self.session_count().await as i64);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: Session) {
        let id = session.id.clone();
        self.sessions.insert(id, Arc::new(session)).await;
        self.record_size().await;
    }

    async fn get(&self, id: &str) -> Option<Session> {
        use crate::metrics::SESSION_LOOKUPS_TOTAL;

        let result = match self.sessions.get(id).await {
            Some(session) if session.is_expired() => {
                self.sessions.invalidate(id).await;
                self.record_size().await;
                None
            }
            other => other,
        };

        if result.is_some() {
            SESSION_LOOKUPS_TOTAL.with_label_values(&["hit"]).inc();
        } else {
            SESSION_LOOKUPS_TOTAL.with_label_values(&["miss"]).inc();
        }

        result.map(|session| session.as_ref().clone())
    }

    async fn remove(&self, id: &str) -> Option<Session> {
        let removed = self.sessions.remove(id).await;
        self.record_size().await;
        removed.map(|session| session.as_ref().clone())
    }
}
