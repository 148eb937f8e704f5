//! Single-flight cache implementation
//!
//! Concurrent lookups for the same key share one fetch. Successful results
//! can be written through to a [`TtlStore`] so later lookups (including ones
//! from other processes using the same store) skip the network entirely.

use crate::storage::{StorageError, TtlStore};
use crate::RobotsError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError, Receiver, Sender};

type Outcome<V> = Result<V, RobotsError>;

/// Keyed async cache with in-flight deduplication
///
/// Lookups fall through three tiers:
///
/// 1. A fetch already in flight for the key: wait for its outcome
/// 2. The durable store, when one is configured
/// 3. A fresh fetch, whose outcome is broadcast to every waiter
///
/// A TTL of zero keeps stored entries forever. Without a store nothing
/// outlives the fetch itself, so the cache only deduplicates concurrent
/// lookups.
pub struct SingleFlightCache<V, S> {
    store: Option<S>,
    ttl: Duration,
    pending: Mutex<HashMap<String, Sender<Outcome<V>>>>,
}

enum Slot<V> {
    Owner,
    Waiter(Receiver<Outcome<V>>),
}

impl<V, S> SingleFlightCache<V, S>
where
    V: Clone + Serialize + DeserializeOwned + Send + 'static,
    S: TtlStore,
{
    /// Creates a cache
    ///
    /// # Arguments
    ///
    /// * `store` - Optional durable tier
    /// * `ttl` - Lifetime of stored entries; zero means no expiry
    pub fn new(store: Option<S>, ttl: Duration) -> Self {
        Self {
            store,
            ttl,
            pending: Mutex::new(HashMap::new()),
        }
    }

    /// Lifetime applied to stored entries
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns true if a durable store is configured
    pub fn has_store(&self) -> bool {
        self.store.is_some()
    }

    /// Number of keys with a fetch currently in flight
    pub fn in_flight(&self) -> usize {
        self.lock_pending().len()
    }

    /// Resolves `key`, calling `fetch` only if no other tier can answer
    ///
    /// `fetch` runs at most once per call, and only when this call ends up
    /// owning the in-flight entry for `key`. Every caller attached to that
    /// entry receives a clone of the same outcome.
    ///
    /// # Errors
    ///
    /// * The error returned by `fetch`, unchanged
    /// * `RobotsError::Store` if the store fails for any reason other than a
    ///   miss, on read or on write-through
    pub async fn get<F, Fut>(&self, key: &str, fetch: F) -> Outcome<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<V>>,
    {
        loop {
            if let Some(rx) = self.subscribe(key) {
                match wait(key, rx).await {
                    Some(outcome) => return outcome,
                    None => continue,
                }
            }

            if let Some(value) = self.lookup_store(key).await? {
                return Ok(value);
            }

            match self.register(key) {
                Slot::Owner => break,
                Slot::Waiter(rx) => match wait(key, rx).await {
                    Some(outcome) => return outcome,
                    None => continue,
                },
            }
        }

        let registration = Registration {
            pending: &self.pending,
            key,
            settled: false,
        };

        // Another owner may have stored the value since the first lookup
        let outcome = match self.lookup_store(key).await {
            Ok(Some(value)) => Ok(value),
            Ok(None) => {
                tracing::debug!("Cache miss for {}, fetching", key);
                self.fetch_and_store(key, fetch).await
            }
            Err(e) => Err(e),
        };
        registration.settle(outcome.clone());
        outcome
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<String, Sender<Outcome<V>>>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn subscribe(&self, key: &str) -> Option<Receiver<Outcome<V>>> {
        self.lock_pending().get(key).map(Sender::subscribe)
    }

    /// Claims the in-flight entry for `key`, or attaches to the existing one
    fn register(&self, key: &str) -> Slot<V> {
        let mut pending = self.lock_pending();
        if let Some(tx) = pending.get(key) {
            return Slot::Waiter(tx.subscribe());
        }
        let (tx, _) = broadcast::channel(1);
        pending.insert(key.to_string(), tx);
        Slot::Owner
    }

    async fn lookup_store(&self, key: &str) -> Outcome<Option<V>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };

        match store.get(key).await {
            Ok(raw) => {
                let value = serde_json::from_str(&raw)
                    .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e)))?;
                tracing::debug!("Store hit for {}", key);
                Ok(Some(value))
            }
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => {
                tracing::warn!("Store lookup failed for {}: {}", key, e);
                Err(e.into())
            }
        }
    }

    async fn fetch_and_store<F, Fut>(&self, key: &str, fetch: F) -> Outcome<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome<V>>,
    {
        let value = fetch().await?;

        if let Some(store) = &self.store {
            let raw = serde_json::to_string(&value)
                .map_err(|e| StorageError::Serialization(format!("{}: {}", key, e)))?;
            store.put(key, raw, self.ttl).await.map_err(|e| {
                tracing::warn!("Store write failed for {}: {}", key, e);
                RobotsError::from(e)
            })?;
            tracing::info!("Stored policy for {} (ttl {:?})", key, self.ttl);
        }

        Ok(value)
    }
}

/// Waits for the owner of an in-flight entry
///
/// Returns `None` if the owner went away without settling, in which case the
/// caller starts over.
async fn wait<V: Clone>(key: &str, mut rx: Receiver<Outcome<V>>) -> Option<Outcome<V>> {
    match rx.recv().await {
        Ok(outcome) => Some(outcome),
        Err(RecvError::Closed) | Err(RecvError::Lagged(_)) => {
            tracing::debug!("In-flight fetch for {} was abandoned, retrying", key);
            None
        }
    }
}

/// Ownership of one in-flight entry
///
/// Dropping it unsettled (the owning future was cancelled) removes the entry,
/// which closes the channel and wakes the waiters.
struct Registration<'a, V> {
    pending: &'a Mutex<HashMap<String, Sender<Outcome<V>>>>,
    key: &'a str,
    settled: bool,
}

impl<V: Clone> Registration<'_, V> {
    /// Removes the entry and broadcasts the outcome under one lock
    fn settle(mut self, outcome: Outcome<V>) {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(tx) = pending.remove(self.key) {
            // No receivers is fine: nobody else asked for this key
            let _ = tx.send(outcome);
        }
        self.settled = true;
    }
}

impl<V> Drop for Registration<'_, V> {
    fn drop(&mut self) {
        if !self.settled {
            self.pending
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(self.key);
        }
    }
}
