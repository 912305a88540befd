use axum::{
    Router,
    extract::FromRef,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use axum_extra::extract::cookie::Key;
use sha2::{Digest, Sha512};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::auth::{CredentialProvider, StaticCredentials};
use crate::config::{Config, SessionBackend, StorageBackend};
use crate::db::{DocumentQuoteStore, QuoteStore, SqliteQuoteStore};
use crate::error::AppError;
use crate::handlers::{login, quotes};
use crate::middleware::resolve_session;
use crate::session::{DocumentSessionStore, MemorySessionStore, SessionStore, SqliteSessionStore};

/// State shared by every route. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub quotes: Arc<dyn QuoteStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub cookie_key: Key,
    pub session_ttl: Duration,
    pub secure_cookie: bool,
    pub static_dir: PathBuf,
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl AppState {
    /// Open the configured backends and assemble the state.
    pub async fn from_config(cfg: &Config) -> Result<Self, AppError> {
        let (quotes, sessions): (Arc<dyn QuoteStore>, Arc<dyn SessionStore>) = match cfg.storage
        {
            StorageBackend::Sqlite => {
                let store = SqliteQuoteStore::connect(&cfg.database_url).await?;
                let sessions: Arc<dyn SessionStore> = match cfg.session_store {
                    SessionBackend::Database => {
                        Arc::new(SqliteSessionStore::new(store.pool().clone()))
                    }
                    SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
                };
                let quotes: Arc<dyn QuoteStore> = Arc::new(store);
                (quotes, sessions)
            }
            StorageBackend::Document => {
                let store = DocumentQuoteStore::open(&cfg.document_path)?;
                let sessions: Arc<dyn SessionStore> = match cfg.session_store {
                    SessionBackend::Database => {
                        Arc::new(DocumentSessionStore::new(store.database())?)
                    }
                    SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
                };
                let quotes: Arc<dyn QuoteStore> = Arc::new(store);
                (quotes, sessions)
            }
        };

        if cfg.session_store == SessionBackend::Memory {
            warn!("sessions are kept in memory; every login is lost on restart");
        }
        info!(
            storage = ?cfg.storage,
            session_store = ?cfg.session_store,
            users = cfg.users.len(),
            "backends ready"
        );

        Ok(Self {
            quotes,
            sessions,
            credentials: Arc::new(StaticCredentials::new(cfg.users.clone())),
            cookie_key: cookie_key(cfg.session_secret.as_deref()),
            session_ttl: cfg.session_ttl(),
            secure_cookie: cfg.secure_cookie,
            static_dir: cfg.static_dir.clone(),
        })
    }
}

/// Derive the private-cookie key from the configured secret, or generate a
/// random one when no secret is set.
pub fn cookie_key(secret: Option<&str>) -> Key {
    match secret {
        Some(secret) if !secret.is_empty() => {
            Key::from(Sha512::digest(secret.as_bytes()).as_slice())
        }
        _ => {
            warn!("QUOTES_SESSION_SECRET is not set; using a random key, sessions end on restart");
            Key::generate()
        }
    }
}

pub fn app_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        .route("/", get(quotes::list_quotes))
        .route("/new-quote", get(quotes::new_quote_form))
        .route("/save-quote", post(quotes::save_quote))
        .route("/delete-quote/{id}", post(quotes::delete_quote))
        .route("/login", get(login::login_page).post(login::login_submit))
        .route("/logout", get(login::logout))
        .route_layer(from_fn_with_state(state.clone(), resolve_session))
        .fallback_service(static_files)
        .with_state(state)
}
