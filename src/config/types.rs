use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for Robots-Gate
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Lifetime of stored policies in milliseconds; 0 keeps them forever
    #[serde(default)]
    pub ttl: u64,

    /// Path to the SQLite policy store; absent disables the durable tier
    #[serde(rename = "database-path", default)]
    pub database_path: Option<PathBuf>,

    /// Base options applied to every robots.txt request
    #[serde(default)]
    pub request: RequestConfig,
}

impl Config {
    /// The configured TTL as a Duration
    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl)
    }
}

/// HTTP options merged into every robots.txt request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestConfig {
    /// User-Agent header sent with policy requests
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,

    /// Total request timeout (milliseconds)
    #[serde(rename = "timeout-ms", default)]
    pub timeout_ms: Option<u64>,

    /// Connection establishment timeout (milliseconds)
    #[serde(rename = "connect-timeout-ms", default)]
    pub connect_timeout_ms: Option<u64>,

    /// Proxy URL used for all requests
    #[serde(default)]
    pub proxy: Option<String>,

    /// Extra headers sent with every request
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}
