//! Runtime configuration.
//!
//! Defaults are layered under `QUOTES_`-prefixed environment variables with
//! figment, e.g. `QUOTES_DATABASE_URL`, `QUOTES_SESSION_SECRET`,
//! `QUOTES_USERS='[{username="ops",password="hunter2"}]'`.

use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Where quotes (and, by default, sessions) live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sqlite,
    Document,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    /// Persist sessions next to the quotes, in whichever backend holds them.
    #[default]
    Database,
    /// Process memory; every session is lost on restart.
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredential {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listen_addr: String,
    pub loglevel: String,
    pub storage: StorageBackend,
    pub database_url: String,
    pub document_path: PathBuf,
    pub session_store: SessionBackend,
    /// Cookie key material. Unset means a random per-process key.
    pub session_secret: Option<String>,
    pub session_ttl_secs: u64,
    pub secure_cookie: bool,
    pub static_dir: PathBuf,
    pub users: Vec<UserCredential>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            loglevel: "info".to_string(),
            storage: StorageBackend::Sqlite,
            database_url: "sqlite:quotes.db".to_string(),
            document_path: PathBuf::from("quotes.redb"),
            session_store: SessionBackend::Database,
            session_secret: None,
            session_ttl_secs: 14 * 24 * 60 * 60,
            secure_cookie: false,
            static_dir: PathBuf::from("public"),
            users: vec![UserCredential {
                username: "admin".to_string(),
                password: "admin123".to_string(),
            }],
        }
    }
}

impl Config {
    /// Load defaults overridden by `QUOTES_*` environment variables.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::prefixed("QUOTES_"))
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}
