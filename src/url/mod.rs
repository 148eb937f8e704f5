//! URL handling module for Robots-Gate
//!
//! This module splits a URL into the cache key identifying its robots.txt
//! scope and the request path that is checked against the policy.

mod split;

pub use split::{split_url, SplitUrl};
