//! Robots-Gate: robots.txt permission checks with single-flight caching
//!
//! This crate answers whether a user agent may fetch a URL according to the
//! site's robots.txt. Policies are fetched once per host, shared between all
//! concurrent callers asking about that host, and optionally persisted to a
//! durable store with a time-to-live.
//!
//! # Example
//!
//! ```no_run
//! use robots_gate::{Config, RobotsClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = RobotsClient::new(Config::default())?;
//! let allowed = client
//!     .is_allowed("woobot/1.0", "https://example.com/some/page")
//!     .await?;
//! println!("allowed: {}", allowed);
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod robots;
pub mod storage;
pub mod url;

use std::sync::Arc;
use thiserror::Error;

/// Main error type for policy lookups
///
/// Every variant is cheap to clone because a single fetch outcome is handed
/// to all callers waiting on the same host.
#[derive(Debug, Clone, Error)]
pub enum RobotsError {
    #[error("URL error: {0}")]
    Parse(#[from] UrlError),

    #[error("Http status {0}")]
    Status(u16),

    #[error("HTTP error for {url}: {source}")]
    Transport {
        url: String,
        source: Arc<reqwest::Error>,
    },

    #[error("Store error: {0}")]
    Store(Arc<StorageError>),
}

impl RobotsError {
    /// Returns the HTTP status code for `Status` errors
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status(code) => Some(*code),
            _ => None,
        }
    }

    /// Returns true if the error means the site has no usable robots.txt
    ///
    /// Client errors (4xx) count as "unavailable" and are treated as allow-all
    /// by [`RobotsClient`]. 429 is excluded: the server is throttling us, not
    /// telling us the file is absent.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Status(code) if (400..500).contains(code) && *code != 429)
    }

    pub(crate) fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source: Arc::new(source),
        }
    }
}

impl From<StorageError> for RobotsError {
    fn from(err: StorageError) -> Self {
        Self::Store(Arc::new(err))
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to open store: {0}")]
    Store(#[from] StorageError),
}

/// URL-specific errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Result type alias for policy lookups
pub type Result<T> = std::result::Result<T, RobotsError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use cache::SingleFlightCache;
pub use client::RobotsClient;
pub use config::Config;
pub use robots::{PolicyDocument, PolicyFetcher, RobotsGuard};
pub use storage::{MemoryStore, SqliteStore, StorageError, TtlStore};
pub use url::{split_url, SplitUrl};
