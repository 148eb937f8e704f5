//! In-memory storage implementation
//!
//! A map-backed TtlStore for tests and single-process use. Expiry uses the
//! monotonic clock and expired entries are dropped when read.

use crate::storage::traits::{StorageError, StorageResult, TtlStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// In-process TtlStore
///
/// Clones share the same map, so several caches can be pointed at one store.
/// Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, including expired ones not yet read
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl TtlStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<String> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if entry.is_expired(Instant::now()) => {
                entries.remove(key);
                Err(StorageError::NotFound(key.to_string()))
            }
            Some(entry) => Ok(entry.value.clone()),
            None => Err(StorageError::NotFound(key.to_string())),
        }
    }

    async fn put(&self, key: &str, value: String, ttl: Duration) -> StorageResult<()> {
        let expires_at = if ttl.is_zero() {
            None
        } else {
            Instant::now().checked_add(ttl)
        };
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }
}
