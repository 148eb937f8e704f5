//! Database schema definitions
//!
//! This module contains the SQL schema for the durable policy cache.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Cached robots.txt policies keyed by scheme://host[:port]
CREATE TABLE IF NOT EXISTS policy_cache (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    stored_at INTEGER NOT NULL,
    expires_at INTEGER
);

CREATE INDEX IF NOT EXISTS idx_policy_cache_expires ON policy_cache(expires_at);
"#;

/// Initializes the database schema
///
/// Safe to call on an existing database; every statement is idempotent.
pub fn initialize_schema(conn: &rusqlite::Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)
}
