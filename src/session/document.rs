use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::sync::Arc;

use super::{Session, SessionStore};
use crate::error::SessionError;

const SESSIONS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Sessions as JSON documents in the redb file that holds the quotes.
#[derive(Clone)]
pub struct DocumentSessionStore {
    db: Arc<Database>,
}

impl DocumentSessionStore {
    pub fn new(db: Arc<Database>) -> Result<Self, SessionError> {
        let write_txn = db.begin_write().map_err(redb::Error::from)?;
        write_txn
            .open_table(SESSIONS_TABLE)
            .map_err(redb::Error::from)?;
        write_txn.commit().map_err(redb::Error::from)?;
        Ok(Self { db })
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, SessionError>
    where
        F: FnOnce(&Database) -> Result<T, redb::Error> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| SessionError::Task(e.to_string()))?
            .map_err(SessionError::from)
    }
}

#[async_trait]
impl SessionStore for DocumentSessionStore {
    async fn load(&self, id: &str) -> Result<Option<Session>, SessionError> {
        let key = id.to_owned();
        let document = self
            .blocking(move |db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(SESSIONS_TABLE)?;
                Ok(table.get(key.as_str())?.map(|v| v.value().to_vec()))
            })
            .await?;
        let Some(document) = document else {
            return Ok(None);
        };

        let session: Session = serde_json::from_slice(&document)?;
        if session.is_expired() {
            self.destroy(id).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    async fn save(&self, session: &Session) -> Result<(), SessionError> {
        let key = session.id.clone();
        let value = serde_json::to_vec(session)?;
        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(SESSIONS_TABLE)?;
                table.insert(key.as_str(), value.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn destroy(&self, id: &str) -> Result<(), SessionError> {
        let key = id.to_owned();
        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(SESSIONS_TABLE)?;
                table.remove(key.as_str())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }

    async fn purge_expired(&self) -> Result<u64, SessionError> {
        let documents = self
            .blocking(|db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(SESSIONS_TABLE)?;
                let mut documents = Vec::new();
                for item in table.iter()? {
                    let (k, v) = item?;
                    documents.push((k.value().to_owned(), v.value().to_vec()));
                }
                Ok(documents)
            })
            .await?;

        // Undecodable records are dropped along with expired ones.
        let stale: Vec<String> = documents
            .into_iter()
            .filter(|(_, doc)| {
                serde_json::from_slice::<Session>(doc)
                    .map(|s| s.is_expired())
                    .unwrap_or(true)
            })
            .map(|(key, _)| key)
            .collect();
        let count = stale.len() as u64;
        if stale.is_empty() {
            return Ok(0);
        }

        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(SESSIONS_TABLE)?;
                for key in &stale {
                    table.remove(key.as_str())?;
                }
            }
            write_txn.commit()?;
            Ok(())
        })
        .await?;
        Ok(count)
    }
}
