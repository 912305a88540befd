use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Stored in place of a date or time the author did not know.
pub const UNKNOWN: &str = "Unknown";

/// Backend-assigned quote identifier: a decimal row id for SQLite, a UUID for
/// the document store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuoteId(String);

impl QuoteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for QuoteId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for QuoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: QuoteId,
    pub text: String,
    pub author: String,
    pub date: String,
    pub time: String,
}

/// Insert payload; `date`/`time` are already resolved to a value or [`UNKNOWN`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuote {
    pub text: String,
    pub author: String,
    pub date: String,
    pub time: String,
}

impl NewQuote {
    pub fn into_quote(self, id: QuoteId) -> Quote {
        Quote {
            id,
            text: self.text,
            author: self.author,
            date: self.date,
            time: self.time,
        }
    }
}

/// Row shape of the `quotes` table.
#[derive(Debug, Clone, FromRow)]
pub struct DbQuote {
    pub id: i64,
    pub text: String,
    pub author: String,
    pub date: String,
    pub time: String,
}

impl From<DbQuote> for Quote {
    fn from(d: DbQuote) -> Self {
        Quote {
            id: QuoteId::from(d.id),
            text: d.text,
            author: d.author,
            date: d.date,
            time: d.time,
        }
    }
}
