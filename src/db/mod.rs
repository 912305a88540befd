//! Quote storage: the `QuoteStore` seam and its backends.
//!
//! Layout:
//! - `models.rs`: quote records and the insert payload
//! - `schema.rs`: SQL DDL for the relational backend (quotes + sessions)
//! - `sqlite.rs`: relational backend on sqlx/SQLite
//! - `document.rs`: document backend on redb, JSON documents keyed by UUID

pub mod document;
pub mod models;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::StorageError;

pub use document::DocumentQuoteStore;
pub use models::{NewQuote, Quote, QuoteId, UNKNOWN};
pub use schema::SQLITE_INIT;
pub use sqlite::{SqlitePool, SqliteQuoteStore};

/// Operations every quote backend supports. Route handlers depend only on this.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Every stored quote, in the backend's natural order.
    async fn list_all(&self) -> Result<Vec<Quote>, StorageError>;

    /// Persist a quote and return it with its assigned id.
    async fn insert(&self, quote: NewQuote) -> Result<Quote, StorageError>;

    /// Remove a quote. Deleting an id that does not exist is not an error.
    async fn delete_by_id(&self, id: &QuoteId) -> Result<(), StorageError>;
}
