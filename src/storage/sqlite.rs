//! SQLite storage implementation
//!
//! This module provides a SQLite-backed implementation of the TtlStore trait.
//! Statements run on tokio's blocking pool so a slow disk never stalls the
//! async workers.

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{StorageError, StorageResult, TtlStore};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// SQLite storage backend
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Opens (or creates) a store at the given path
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(StorageError)` - Failed to open database or create the schema
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        tracing::debug!("Opened policy store at {}", path.display());
        Ok(Self::from_connection(conn))
    }

    /// Creates an in-memory store
    ///
    /// Entries live as long as this value (and its clones).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Deletes every expired entry
    ///
    /// Reads already ignore expired rows; this only reclaims space.
    ///
    /// # Returns
    ///
    /// The number of rows removed
    pub async fn purge_expired(&self) -> StorageResult<usize> {
        let now = Utc::now().timestamp_millis();
        let removed = self
            .with_conn(move |conn| {
                Ok(conn.execute(
                    "DELETE FROM policy_cache WHERE expires_at IS NOT NULL AND expires_at <= ?1",
                    params![now],
                )?)
            })
            .await?;

        if removed > 0 {
            tracing::debug!("Purged {} expired policies", removed);
        }
        Ok(removed)
    }

    /// Counts stored rows, expired or not
    pub async fn count_entries(&self) -> StorageResult<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM policy_cache", [], |row| row.get(0))?;
            Ok(count as u64)
        })
        .await
    }

    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| StorageError::Task("connection mutex poisoned".to_string()))?;
            f(&*conn)
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

impl TtlStore for SqliteStore {
    async fn get(&self, key: &str) -> StorageResult<String> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();

        self.with_conn(move |conn| {
            let row: Option<(String, Option<i64>)> = conn
                .query_row(
                    "SELECT value, expires_at FROM policy_cache WHERE key = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )
                .optional()?;

            match row {
                None => Err(StorageError::NotFound(key)),
                Some((_, Some(expires_at))) if expires_at <= now => {
                    conn.execute(
                        "DELETE FROM policy_cache WHERE key = ?1 AND expires_at <= ?2",
                        params![key, now],
                    )?;
                    Err(StorageError::NotFound(key))
                }
                Some((value, _)) => Ok(value),
            }
        })
        .await
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> StorageResult<()> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();
        let expires_at = expiry_from(now, ttl);

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO policy_cache (key, value, stored_at, expires_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![key, value, now, expires_at],
            )?;
            Ok(())
        })
        .await
    }
}

/// Absolute expiry in epoch milliseconds; `None` for a zero TTL
fn expiry_from(now: i64, ttl: Duration) -> Option<i64> {
    if ttl.is_zero() {
        return None;
    }
    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    Some(now.saturating_add(ttl_ms))
}
