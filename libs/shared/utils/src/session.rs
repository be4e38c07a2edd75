use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::auth::Session;

/// Live sessions keyed by session id. A token is only honoured while its
/// session is registered here, so logout takes effect immediately.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, session: &Session, now: DateTime<Utc>) {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, expires_at| *expires_at > now);
        if sessions.len() != before {
            debug!("Purged {} expired sessions", before - sessions.len());
        }
        sessions.insert(session.id, session.expires_at);
    }

    pub async fn is_active(&self, session_id: Uuid, now: DateTime<Utc>) -> bool {
        self.sessions
            .read()
            .await
            .get(&session_id)
            .is_some_and(|expires_at| *expires_at > now)
    }

    /// Returns whether the session was still registered.
    pub async fn revoke(&self, session_id: Uuid) -> bool {
        self.sessions.write().await.remove(&session_id).is_some()
    }

    pub async fn active_count(&self, now: DateTime<Utc>) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|expires_at| **expires_at > now)
            .count()
    }
}
