//! Server-side login sessions.
//!
//! Sessions never authenticate API calls; access tokens do. They record that a
//! browser completed the OAuth flow so logout and diagnostics can see it.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::oauth::random_token;
use crate::cache::TtlCache;

/// Default session lifetime, matching the longest token lifetime.
pub const SESSION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// A live server-side session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// Session records keyed by opaque session id.
pub struct SessionStore {
    sessions: Arc<TtlCache<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::with_ttl(SESSION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(TtlCache::new(ttl)),
        }
    }

    /// Open a session for a user, returning its id.
    pub fn create(&self, user_id: &str, email: &str, ttl: Duration) -> String {
        let id = random_token(32);
        self.sessions.insert_with_ttl(
            id.clone(),
            Session {
                user_id: user_id.to_string(),
                email: email.to_string(),
                created_at: Utc::now(),
            },
            ttl,
        );
        id
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(&session_id.to_string())
    }

    /// Terminate a session. Returns whether a live session existed.
    pub fn end(&self, session_id: &str) -> bool {
        self.sessions.remove(&session_id.to_string())
    }

    /// Purge expired sessions every `period` in the background.
    pub fn spawn_cleanup_task(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        self.sessions.spawn_cleanup_task(period)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
