use crate::config::types::{Config, RequestConfig};
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_database_path(config)?;
    validate_request_config(&config.request)?;
    Ok(())
}

fn validate_database_path(config: &Config) -> Result<(), ConfigError> {
    if let Some(path) = &config.database_path {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::Validation(
                "database_path cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Validates request options
fn validate_request_config(config: &RequestConfig) -> Result<(), ConfigError> {
    if config.timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "timeout_ms must be > 0 when set".to_string(),
        ));
    }

    if config.connect_timeout_ms == Some(0) {
        return Err(ConfigError::Validation(
            "connect_timeout_ms must be > 0 when set".to_string(),
        ));
    }

    if let Some(user_agent) = &config.user_agent {
        if user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent cannot be empty".to_string(),
            ));
        }
        HeaderValue::from_str(user_agent).map_err(|_| {
            ConfigError::Validation(format!("user_agent is not a valid header value: '{}'", user_agent))
        })?;
    }

    if let Some(proxy) = &config.proxy {
        Url::parse(proxy).map_err(|e| ConfigError::InvalidUrl(format!("Invalid proxy: {}", e)))?;
    }

    for (name, value) in &config.headers {
        HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ConfigError::Validation(format!("Invalid header name: '{}'", name)))?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }

    Ok(())
}
