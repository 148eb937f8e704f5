//! Top-level robots.txt client
//!
//! Ties the pieces together: a URL is split into its policy scope and path,
//! the scope's policy is resolved through the single-flight cache (fetching
//! it if needed), and the path is evaluated against it.

use crate::cache::SingleFlightCache;
use crate::config::{validate, Config};
use crate::robots::{PolicyDocument, PolicyFetcher, RobotsGuard};
use crate::storage::{SqliteStore, TtlStore};
use crate::url::split_url;
use crate::{ConfigError, RobotsError};

/// Answers robots.txt permission checks
///
/// Construct one per application and share it (behind an `Arc` if needed);
/// its cache is only useful if every caller goes through the same instance.
pub struct RobotsClient<S = SqliteStore> {
    cache: SingleFlightCache<PolicyDocument, S>,
    fetcher: PolicyFetcher,
}

impl RobotsClient<SqliteStore> {
    /// Creates a client from configuration
    ///
    /// Opens the SQLite store at `database-path` when one is configured;
    /// otherwise the client only deduplicates concurrent fetches.
    ///
    /// # Returns
    ///
    /// * `Ok(RobotsClient)` - Ready to answer queries
    /// * `Err(ConfigError)` - Invalid configuration, HTTP client or store failure
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        validate(&config)?;
        let store = config
            .database_path
            .as_deref()
            .map(SqliteStore::open)
            .transpose()?;
        Self::with_store(config, store)
    }
}

impl<S: TtlStore> RobotsClient<S> {
    /// Creates a client with a caller-supplied durable store
    ///
    /// `config.database_path` is ignored; pass `None` to run without a
    /// durable tier.
    pub fn with_store(config: Config, store: Option<S>) -> Result<Self, ConfigError> {
        validate(&config)?;
        let fetcher = PolicyFetcher::new(&config.request)?;

        tracing::debug!(
            "Robots client ready (durable store: {}, ttl: {:?})",
            store.is_some(),
            config.ttl()
        );

        Ok(Self {
            cache: SingleFlightCache::new(store, config.ttl()),
            fetcher,
        })
    }

    /// Checks if `user_agent` may fetch `url`
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - Allowed, or the site has no robots.txt (4xx)
    /// * `Ok(false)` - Disallowed by the site's robots.txt
    /// * `Err(RobotsError)` - The URL is malformed, or the policy could not be
    ///   obtained (5xx, 429, network failure, store failure)
    pub async fn is_allowed(&self, user_agent: &str, url: &str) -> Result<bool, RobotsError> {
        let split = split_url(url)?;
        let policy = self.resolve(&split.cache_key).await?;
        let allowed = RobotsGuard::new(&policy).is_allowed(user_agent, &split.path);

        tracing::debug!(
            "{} {} for {}",
            split.path,
            if allowed { "allowed" } else { "disallowed" },
            user_agent
        );
        Ok(allowed)
    }

    /// Returns the policy that applies to `url`
    pub async fn policy(&self, url: &str) -> Result<PolicyDocument, RobotsError> {
        let split = split_url(url)?;
        self.resolve(&split.cache_key).await
    }

    /// Returns the crawl delay (seconds) the site asks of `user_agent`
    pub async fn crawl_delay(&self, user_agent: &str, url: &str) -> Result<Option<f64>, RobotsError> {
        Ok(self.policy(url).await?.crawl_delay(user_agent))
    }

    /// Number of hosts with a fetch currently in flight
    pub fn in_flight(&self) -> usize {
        self.cache.in_flight()
    }

    async fn resolve(&self, cache_key: &str) -> Result<PolicyDocument, RobotsError> {
        let result = self
            .cache
            .get(cache_key, || self.fetcher.fetch(cache_key))
            .await;

        match result {
            Err(e) if e.is_unavailable() => {
                tracing::debug!("No robots.txt for {} ({}), allowing all", cache_key, e);
                Ok(PolicyDocument::allow_all())
            }
            other => other,
        }
    }
}
