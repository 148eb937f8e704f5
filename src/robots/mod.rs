//! Robots.txt handling module
//!
//! This module provides functionality for fetching, parsing, and evaluating
//! robots.txt files.

mod fetcher;
mod guard;
mod parser;

pub use fetcher::{build_http_client, is_success_status, policy_url, PolicyFetcher};
pub use guard::{is_allowed, RobotsGuard};
pub use parser::PolicyDocument;
