//! Storage module for persisting fetched policies
//!
//! This module provides the durable tier of the policy cache:
//! - The `TtlStore` trait every backend implements
//! - A SQLite backend for persistence across process restarts
//! - An in-memory backend for tests and single-process use

mod memory;
mod schema;
mod sqlite;
mod traits;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{StorageError, StorageResult, TtlStore};
