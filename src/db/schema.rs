//! SQL DDL for the relational backend.

/// SQLite schema with:
/// - `quotes`: `id` INTEGER PRIMARY KEY AUTOINCREMENT, every text column NOT NULL
/// - `sessions`: opaque `id` key, nullable `username`, unix-seconds `expires_at`
pub const SQLITE_INIT: &str = r#"
CREATE TABLE IF NOT EXISTS quotes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    text TEXT NOT NULL,
    author TEXT NOT NULL,
    date TEXT NOT NULL,
    time TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    username TEXT NULL,
    expires_at INTEGER NOT NULL -- unix seconds
);

CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);
"#;
