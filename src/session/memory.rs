use async_trait::async_trait;
use dashmap::DashMap;

use super::{Session, SessionStore};
use crate::error::SessionError;

/// Sessions held in process memory. Everything is lost on restart.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: DashMap<String, Session>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError> {
        let Some(session) = self.sessions.get(id).map(|s| s.clone()) else {
            return Ok(None);
        };
        if session.is_expired() {
            self.sessions.remove(id);
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        self.sessions.remove(id);
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired());
        Ok(before.saturating_sub(self.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionUser;
    use std::time::Duration;

    #[tokio::test]
    async fn save_load_destroy() {
        let store = MemorySessionStore::new();
        let mut session = Session::new(Duration::from_secs(60));
        session.user = Some(SessionUser {
            username: "admin".to_string(),
        });

        store.save(&session).await.unwrap();
        assert_eq!(store.load(&session.id).await.unwrap(), Some(session.clone()));

        store.destroy(&session.id).await.unwrap();
        assert_eq!(store.load(&session.id).await.unwrap(), None);
        store.destroy(&session.id).await.unwrap();
    }

    #[tokio::test]
    async fn expired_sessions_are_dropped_on_load() {
        let store = MemorySessionStore::new();
        let session = Session::new(Duration::ZERO);
        store.save(&session).await.unwrap();

        assert_eq!(store.load(&session.id).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn purge_keeps_live_sessions() {
        let store = MemorySessionStore::new();
        let live = Session::new(Duration::from_secs(60));
        store.save(&Session::new(Duration::ZERO)).await.unwrap();
        store.save(&Session::new(Duration::ZERO)).await.unwrap();
        store.save(&live).await.unwrap();

        assert_eq!(store.purge_expired().await.unwrap(), 2);
        assert_eq!(store.len(), 1);
        assert!(store.load(&live.id).await.unwrap().is_some());
    }
}
