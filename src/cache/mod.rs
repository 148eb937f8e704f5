//! Policy caching module
//!
//! This module deduplicates concurrent policy fetches per host and writes
//! successful results through to an optional durable store.

mod single_flight;

pub use single_flight::SingleFlightCache;
