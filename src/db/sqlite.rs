use crate::db::models::{DbQuote, NewQuote, Quote, QuoteId};
use crate::db::schema::SQLITE_INIT;
use crate::db::QuoteStore;
use crate::error::StorageError;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::str::FromStr;
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

#[derive(Clone)]
pub struct SqliteQuoteStore {
    pool: SqlitePool,
}

impl SqliteQuoteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `url` and apply the schema.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self::new(pool);
        store.init_schema().await?;
        info!(backend = "sqlite", url = %url, "quote store connected");
        Ok(store)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), StorageError> {
        // sqlx::query runs a single statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl QuoteStore for SqliteQuoteStore {
    async fn list_all(&self) -> Result<Vec<Quote>, StorageError> {
        let rows: Vec<DbQuote> =
            sqlx::query_as("SELECT id, text, author, date, time FROM quotes ORDER BY id")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(Quote::from).collect())
    }

    async fn insert(&self, quote: NewQuote) -> Result<Quote, StorageError> {
        let result = sqlx::query("INSERT INTO quotes (text, author, date, time) VALUES (?, ?, ?, ?)")
            .bind(&quote.text)
            .bind(&quote.author)
            .bind(&quote.date)
            .bind(&quote.time)
            .execute(&self.pool)
            .await?;
        Ok(quote.into_quote(QuoteId::from(result.last_insert_rowid())))
    }

    async fn delete_by_id(&self, id: &QuoteId) -> Result<(), StorageError> {
        // A non-numeric id names no row.
        let Ok(row_id) = id.as_str().parse::<i64>() else {
            return Ok(());
        };
        sqlx::query("DELETE FROM quotes WHERE id = ?")
            .bind(row_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
