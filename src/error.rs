use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;
use tracing::error;

/// Failure of a quote storage backend.
#[derive(Debug, ThisError)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Document store error: {0}")]
    Document(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage task failed: {0}")]
    Task(String),
}

/// Failure of a session store backend.
#[derive(Debug, ThisError)]
pub enum SessionError {
    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Document store error: {0}")]
    Document(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Session task failed: {0}")]
    Task(String),

    #[error("Invalid timestamp in session record: {0}")]
    Timestamp(i64),
}

#[derive(Debug, ThisError)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// A route failure: the underlying error plus the plain-text message shown to
/// the client. Always rendered as a 500.
#[derive(Debug)]
pub struct PageFailure {
    message: &'static str,
    source: AppError,
}

impl PageFailure {
    pub fn new(message: &'static str, source: impl Into<AppError>) -> Self {
        Self {
            message,
            source: source.into(),
        }
    }
}

impl IntoResponse for PageFailure {
    fn into_response(self) -> Response {
        error!(error = %self.source, "{}", self.message);
        (StatusCode::INTERNAL_SERVER_ERROR, self.message).into_response()
    }
}

/// Attach a client-facing message to a fallible route step.
pub trait OrPage<T> {
    fn or_page(self, message: &'static str) -> Result<T, PageFailure>;
}

impl<T, E> OrPage<T> for Result<T, E>
where
    E: Into<AppError>,
{
    fn or_page(self, message: &'static str) -> Result<T, PageFailure> {
        self.map_err(|e| PageFailure::new(message, e))
    }
}

impl From<redb::Error> for StorageError {
    fn from(e: redb::Error) -> Self {
        StorageError::Document(e.to_string())
    }
}

impl From<redb::Error> for SessionError {
    fn from(e: redb::Error) -> Self {
        SessionError::Document(e.to_string())
    }
}
