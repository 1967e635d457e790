//! Scrape cache - memoized full-page scrapes keyed by URL.
//!
//! The cache lets repeated invocations for the same scene skip the network
//! within an expiry window. Entries are opaque strings (serialized records).

mod memory;
mod sqlite;

pub use memory::MemoryScrapeCache;
pub use sqlite::SqliteScrapeCache;

use std::time::Duration;

use thiserror::Error;

/// Errors from a cache backend. Callers log these and carry on uncached.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache database error: {0}")]
    Database(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// Trait for scrape cache storage.
///
/// Single-process, read-through usage: check with `get`, otherwise compute
/// and `set`. No cross-process locking is provided.
pub trait ScrapeCache: Send + Sync {
    /// Get a live (unexpired) entry.
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Store an entry that expires after `ttl`, replacing any existing one.
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    /// Remove an entry.
    fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Drop expired entries. Returns how many were removed.
    fn purge_expired(&self) -> Result<u32, CacheError>;
}

/// Cache key for a full scene scrape.
pub fn scene_key(url: &str) -> String {
    format!("scene:{}", url)
}
