//! HTTP fetcher for robots.txt
//!
//! This module handles the network side of policy lookups:
//! - Building an HTTP client from the configured request options
//! - Requesting `<host>/robots.txt`
//! - Classifying the response status
//! - Buffering and parsing successful bodies

use crate::config::RequestConfig;
use crate::robots::PolicyDocument;
use crate::RobotsError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Proxy};
use std::time::Duration;

/// Builds an HTTP client from request options
///
/// User agent, timeouts and proxy are client-wide settings in reqwest, so
/// they are applied here once rather than on every request.
///
/// # Arguments
///
/// * `config` - The base request options
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client (bad proxy URL, TLS init)
pub fn build_http_client(config: &RequestConfig) -> Result<Client, reqwest::Error> {
    let mut builder = Client::builder().gzip(true).brotli(true);

    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.as_str());
    }
    if let Some(timeout_ms) = config.timeout_ms {
        builder = builder.timeout(Duration::from_millis(timeout_ms));
    }
    if let Some(connect_timeout_ms) = config.connect_timeout_ms {
        builder = builder.connect_timeout(Duration::from_millis(connect_timeout_ms));
    }
    if let Some(proxy) = &config.proxy {
        builder = builder.proxy(Proxy::all(proxy.as_str())?);
    }

    builder.build()
}

/// Builds the robots.txt URL for a cache key
///
/// # Examples
///
/// ```
/// use robots_gate::robots::policy_url;
///
/// assert_eq!(policy_url("https://example.com"), "https://example.com/robots.txt");
/// ```
pub fn policy_url(host: &str) -> String {
    format!("{}/robots.txt", host)
}

/// Returns true for statuses whose body is treated as the policy
pub fn is_success_status(status: u16) -> bool {
    (200..400).contains(&status)
}

/// Fetches and parses robots.txt files
#[derive(Debug, Clone)]
pub struct PolicyFetcher {
    http: Client,
    headers: HeaderMap,
}

impl PolicyFetcher {
    /// Creates a fetcher from request options
    ///
    /// Headers that fail to convert are skipped with a warning; run the
    /// config through validation first to reject them up front.
    pub fn new(config: &RequestConfig) -> Result<Self, reqwest::Error> {
        let http = build_http_client(config)?;
        Ok(Self::with_client(http, config))
    }

    /// Creates a fetcher around an existing HTTP client
    pub fn with_client(http: Client, config: &RequestConfig) -> Self {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    headers.insert(name, value);
                }
                _ => tracing::warn!("Skipping invalid request header '{}'", name),
            }
        }
        Self { http, headers }
    }

    /// Fetches the robots.txt policy for a host
    ///
    /// # Request Flow
    ///
    /// 1. GET `<host>/robots.txt` with the configured headers
    /// 2. Classify the status:
    ///
    /// | Status | Result |
    /// |--------|--------|
    /// | 200-399 | Body buffered and parsed |
    /// | anything else | `RobotsError::Status(code)`, body discarded |
    /// | no response | `RobotsError::Transport` |
    ///
    /// # Arguments
    ///
    /// * `host` - Cache key of the form `scheme://host[:port]`
    pub async fn fetch(&self, host: &str) -> Result<PolicyDocument, RobotsError> {
        let url = policy_url(host);
        tracing::debug!("Fetching {}", url);

        let response = self
            .http
            .get(&url)
            .headers(self.headers.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Request for {} failed: {}", url, e);
                RobotsError::transport(&url, e)
            })?;

        let status = response.status().as_u16();
        if !is_success_status(status) {
            // Dropping the response discards any unread body
            tracing::debug!("{} returned status {}", url, status);
            return Err(RobotsError::Status(status));
        }

        let body = response.bytes().await.map_err(|e| {
            tracing::warn!("Reading body of {} failed: {}", url, e);
            RobotsError::transport(&url, e)
        })?;

        tracing::debug!("Fetched {} ({} bytes, status {})", url, body.len(), status);
        Ok(PolicyDocument::parse(&String::from_utf8_lossy(&body)))
    }
}
