// src/db/sqlite_conn.rs
use std::sync::{Mutex, MutexGuard};
use std::{fs, path::Path};

use rusqlite::vtab::array;
use rusqlite::Connection;
use tracing::debug;

use super::RepoResult;
use crate::error::RepositoryError;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS secrets (
        id              TEXT PRIMARY KEY,
        token           TEXT NOT NULL UNIQUE,
        encrypted_value TEXT NOT NULL,
        created_at      TEXT NOT NULL,
        updated_at      TEXT NOT NULL,
        expires_at      TEXT,
        soft_deleted_at TEXT
    );

    CREATE INDEX IF NOT EXISTS idx_secrets_expires_at ON secrets(expires_at);
    CREATE INDEX IF NOT EXISTS idx_secrets_soft_deleted_at ON secrets(soft_deleted_at);
"#;

/// SQLite-backed [`Repository`](super::Repository)
///
/// One connection behind a mutex; every trait call is a single statement,
/// which SQLite applies atomically.
#[derive(Debug)]
pub struct SqliteRepository {
    conn: Mutex<Connection>,
}

impl SqliteRepository {
    /// Open (or create) a database file and provision the `secrets` table
    pub fn open<P: AsRef<Path>>(path: P) -> RepoResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }
        debug!(path = %path.as_ref().display(), "opening sqlite repository");
        Self::from_connection(Connection::open(path)?)
    }

    /// Private in-memory database, gone when the repository is dropped
    pub fn open_in_memory() -> RepoResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Adopt an existing connection; the schema is created if missing
    pub fn from_connection(conn: Connection) -> RepoResult<Self> {
        array::load_module(&conn)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub(super) fn conn(&self) -> RepoResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| RepositoryError::Poisoned)
    }
}
