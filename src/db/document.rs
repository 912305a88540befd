//! Document backend: each quote is a JSON document in a redb table, keyed by a
//! generated UUID.

use crate::db::QuoteStore;
use crate::db::models::{NewQuote, Quote, QuoteId};
use crate::error::StorageError;
use async_trait::async_trait;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

const QUOTES_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("quotes");

#[derive(Clone)]
pub struct DocumentQuoteStore {
    db: Arc<Database>,
}

impl DocumentQuoteStore {
    /// Open (creating if missing) the redb file at `path`.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let db = Database::create(path).map_err(redb::Error::from)?;
        let store = Self { db: Arc::new(db) };
        store.ensure_table()?;
        info!(backend = "document", path = %path.display(), "quote store opened");
        Ok(store)
    }

    /// Shared handle, for stores that keep their own tables in the same file.
    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }

    // Read transactions fail on tables that were never created.
    fn ensure_table(&self) -> Result<(), StorageError> {
        let write_txn = self.db.begin_write().map_err(redb::Error::from)?;
        write_txn
            .open_table(QUOTES_TABLE)
            .map_err(redb::Error::from)?;
        write_txn.commit().map_err(redb::Error::from)?;
        Ok(())
    }

    async fn blocking<T, F>(&self, op: F) -> Result<T, StorageError>
    where
        F: FnOnce(&Database) -> Result<T, redb::Error> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(&db))
            .await
            .map_err(|e| StorageError::Task(e.to_string()))?
            .map_err(StorageError::from)
    }
}

#[async_trait]
impl QuoteStore for DocumentQuoteStore {
    async fn list_all(&self) -> Result<Vec<Quote>, StorageError> {
        let documents = self
            .blocking(|db| {
                let read_txn = db.begin_read()?;
                let table = read_txn.open_table(QUOTES_TABLE)?;
                let mut documents = Vec::new();
                for item in table.iter()? {
                    let (_k, v) = item?;
                    documents.push(v.value().to_vec());
                }
                Ok(documents)
            })
            .await?;

        documents
            .iter()
            .map(|doc| serde_json::from_slice::<Quote>(doc).map_err(StorageError::from))
            .collect()
    }

    async fn insert(&self, quote: NewQuote) -> Result<Quote, StorageError> {
        let quote = quote.into_quote(QuoteId::new(Uuid::new_v4().to_string()));
        let key = quote.id.as_str().to_owned();
        let value = serde_json::to_vec(&quote)?;

        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(QUOTES_TABLE)?;
                table.insert(key.as_str(), value.as_slice())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await?;

        Ok(quote)
    }

    async fn delete_by_id(&self, id: &QuoteId) -> Result<(), StorageError> {
        let key = id.as_str().to_owned();
        self.blocking(move |db| {
            let write_txn = db.begin_write()?;
            {
                let mut table = write_txn.open_table(QUOTES_TABLE)?;
                table.remove(key.as_str())?;
            }
            write_txn.commit()?;
            Ok(())
        })
        .await
    }
}
