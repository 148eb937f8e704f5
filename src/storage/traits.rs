//! Storage traits and error types
//!
//! This module defines the interface a durable policy store must provide and
//! the errors it may report.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// The key is absent or its entry has expired
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    /// Returns true for a plain miss, as opposed to a real fault
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A key-value store whose entries expire after a time-to-live
///
/// Values are opaque strings; callers decide the encoding. Expiry must be
/// transparent: once an entry's TTL has elapsed, `get` reports
/// [`StorageError::NotFound`] without the caller having to evict anything.
pub trait TtlStore: Send + Sync {
    /// Looks up a live entry
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The stored value
    /// * `Err(StorageError::NotFound)` - No entry, or the entry expired
    /// * `Err(_)` - Any other fault
    fn get(&self, key: &str) -> impl Future<Output = StorageResult<String>> + Send;

    /// Stores a value, replacing any previous entry for the key
    ///
    /// A zero `ttl` keeps the entry until it is overwritten.
    fn put(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = StorageResult<()>> + Send;
}
