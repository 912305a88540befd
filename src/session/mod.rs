//! Sessions: the per-browser record that remembers who logged in.

pub mod document;
pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::SessionError;

pub use document::DocumentSessionStore;
pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

const SESSION_ID_LEN: usize = 64;

/// 9999-12-31T23:59:59Z: the last instant with a four-digit RFC3339 year.
const LATEST_EXPIRY_SECS: i64 = 253_402_300_799;

fn latest_expiry() -> DateTime<Utc> {
    DateTime::from_timestamp(LATEST_EXPIRY_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// The authenticated identity stored in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub user: Option<SessionUser>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A fresh anonymous session with a random id. Expiry is capped at the
    /// end of year 9999.
    pub fn new(ttl: Duration) -> Self {
        let latest = latest_expiry();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .map_or(latest, |at| at.min(latest));
        Self {
            id: generate_session_id(),
            user: None,
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn username(&self) -> Option<&str> {
        self.user.as_ref().map(|u| u.username.as_str())
    }
}

/// Generate a cryptographically secure session id.
fn generate_session_id() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Persistence for sessions. Loading an expired session yields `None`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError>;

    /// Insert or replace the session under its id.
    async fn save(&self, session: &Session) -> Result<(), SessionError>;

    /// Remove the session. Destroying an unknown id succeeds.
    async fn destroy(&self, id: &str) -> Result<(), SessionError>;

    /// Delete every expired session; returns how many were removed.
    async fn purge_expired(&self) -> Result<u64, SessionError>;
}
