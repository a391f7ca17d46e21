use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dishpatch_application::{AdminQueryService, QuerySession};
use dishpatch_domain::PermissionTable;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub query_service: Arc<AdminQueryService>,
    pub permissions: Arc<PermissionTable>,
    pub sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
    pub session_idle_timeout: Duration,
    pub frontend_url: String,
}

/// Query session of one subject and when it was last used.
pub struct SessionEntry {
    session: Arc<QuerySession>,
    last_touched: Instant,
}

impl AppState {
    pub fn new(
        query_service: Arc<AdminQueryService>,
        permissions: Arc<PermissionTable>,
        session_idle_timeout: Duration,
        frontend_url: String,
    ) -> Self {
        Self {
            query_service,
            permissions,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_idle_timeout,
            frontend_url,
        }
    }

    /// Returns the query session of `subject`, creating it on first use.
    ///
    /// Sessions untouched for longer than the idle timeout are evicted first.
    pub async fn session_for(&self, subject: &str) -> Arc<QuerySession> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.evict_idle(&mut sessions, now);

        let entry = sessions
            .entry(subject.to_owned())
            .or_insert_with(|| SessionEntry {
                session: Arc::new(QuerySession::new(self.query_service.clone())),
                last_touched: now,
            });
        entry.last_touched = now;
        entry.session.clone()
    }

    /// Clears and forgets the query session of `subject`.
    pub async fn remove_session(&self, subject: &str) {
        let removed = self.sessions.write().await.remove(subject);
        if let Some(entry) = removed {
            entry.session.clear().await;
        }
    }

    fn evict_idle(&self, sessions: &mut HashMap<String, SessionEntry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| {
            now.saturating_duration_since(entry.last_touched) <= self.session_idle_timeout
        });

        let evicted = before - sessions.len();
        if evicted > 0 {
            debug!(evicted, remaining = sessions.len(), "evicted idle query sessions");
        }
    }
}
