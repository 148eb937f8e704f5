//! Configuration module for Robots-Gate
//!
//! This module handles loading, parsing, and validating TOML configuration.
//!
//! # Example
//!
//! ```no_run
//! use robots_gate::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("robots.toml")).unwrap();
//! println!("Policy TTL: {:?}", config.ttl());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, RequestConfig};

// Re-export parser functions
pub use parser::{load_config, parse_config};
pub use validation::validate;
