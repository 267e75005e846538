//! `SQLite`-backed key-value store.
//!
//! The database is stored at `~/.engojee/engojee.db` and holds a single
//! `kv_store` table. Each write is one upsert statement, so a value is always
//! replaced as a whole.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};

use crate::config::Paths;
use crate::error::EngojeeError;

use super::{migrations, KeyValueStore};

/// Key-value store over a `SQLite` connection.
///
/// Cloning shares the underlying connection.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open the database at the default location.
    ///
    /// Creates the database file and runs migrations if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open() -> Result<Self, EngojeeError> {
        let paths = Paths::new()?;
        paths.ensure_dirs()?;
        Self::open_at(&paths.database)
    }

    /// Open the database at a specific path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_at(path: &Path) -> Result<Self, EngojeeError> {
        let conn = Connection::open(path).map_err(|e| {
            EngojeeError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "opened rule database");
        Self::from_connection(conn)
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrations fail.
    pub fn open_in_memory() -> Result<Self, EngojeeError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            EngojeeError::Database(format!("Failed to open in-memory database: {e}"))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, EngojeeError> {
        migrations::run(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the current schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub async fn schema_version(&self) -> Result<i32, EngojeeError> {
        self.with_conn(migrations::get_version).await
    }

    /// Run `f` against the connection on the blocking thread pool.
    async fn with_conn<T, F>(&self, f: F) -> Result<T, EngojeeError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, EngojeeError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| EngojeeError::Database("Connection lock poisoned".to_string()))?;
            f(&*guard)
        })
        .await
        .map_err(|e| EngojeeError::Database(format!("Blocking task failed: {e}")))?
    }
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get_item(&self, key: &str) -> Result<Option<String>, EngojeeError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| EngojeeError::Database(format!("Failed to read {key}: {e}")))
        })
        .await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), EngojeeError> {
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            conn.execute(
                r"INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
                  ON CONFLICT(key) DO UPDATE SET value = excluded.value,
                                                 updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .map(|_| ())
            .map_err(|e| EngojeeError::Database(format!("Failed to write {key}: {e}")))
        })
        .await
    }

    async fn remove_item(&self, key: &str) -> Result<(), EngojeeError> {
        let key = key.to_string();
        self.with_conn(move |conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
                .map(|_| ())
                .map_err(|e| EngojeeError::Database(format!("Failed to remove {key}: {e}")))
        })
        .await
    }
}
