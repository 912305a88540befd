use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use super::{Session, SessionStore, SessionUser};
use crate::db::SqlitePool;
use crate::error::SessionError;

/// Sessions in the `sessions` table of the quotes database.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    /// The pool must already carry the schema from [`crate::db::SQLITE_INIT`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_session(row: SqliteRow) -> Result<Session, SessionError> {
        let id: String = row.try_get("id")?;
        let username: Option<String> = row.try_get("username")?;
        let expires_secs: i64 = row.try_get("expires_at")?;
        let expires_at = DateTime::from_timestamp(expires_secs, 0)
            .ok_or(SessionError::Timestamp(expires_secs))?;

        Ok(Session {
            id,
            user: username.map(|username| SessionUser { username }),
            expires_at,
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError> {
        let row = sqlx::query("SELECT id, username, expires_at FROM sessions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let session = Self::row_to_session(row)?;
        if session.is_expired() {
            self.destroy(id).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        sqlx::query(
            r#"
            INSERT INTO sessions (id, username, expires_at) VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                username=excluded.username,
                expires_at=excluded.expires_at
            "#,
        )
        .bind(&session.id)
        .bind(session.username())
        .bind(session.expires_at.timestamp())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        sqlx::query("DELETE FROM sessions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().timestamp())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
