//! SQLite-backed scrape cache implementation.

use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{CacheError, ScrapeCache};

/// SQLite-backed scrape cache.
pub struct SqliteScrapeCache {
    conn: Mutex<Connection>,
}

impl SqliteScrapeCache {
    /// Open the cache, creating the database file and table if needed.
    pub fn new(path: &Path) -> Result<Self, CacheError> {
        let conn = Connection::open(path).map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory cache (useful for testing).
    pub fn in_memory() -> Result<Self, CacheError> {
        let conn =
            Connection::open_in_memory().map_err(|e| CacheError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), CacheError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scrape_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                stored_at TEXT NOT NULL,
                expires_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_scrape_cache_expires ON scrape_cache(expires_at);
            "#,
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|e| CacheError::Database(format!("Lock poisoned: {}", e)))
    }
}

impl ScrapeCache for SqliteScrapeCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let conn = self.lock()?;

        let row: Option<(String, String)> = conn
            .query_row(
                "SELECT value, expires_at FROM scrape_cache WHERE key = ?",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| CacheError::Database(e.to_string()))?;

        let Some((value, expires_at)) = row else {
            return Ok(None);
        };

        // An unreadable timestamp counts as expired.
        let live = DateTime::parse_from_rfc3339(&expires_at)
            .map(|dt| dt.with_timezone(&Utc) > Utc::now())
            .unwrap_or(false);

        Ok(live.then_some(value))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let conn = self.lock()?;
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| CacheError::Serialization(format!("Invalid TTL: {}", e)))?;
        let expires_at = now + ttl;

        conn.execute(
            "INSERT INTO scrape_cache (key, value, stored_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                stored_at = excluded.stored_at,
                expires_at = excluded.expires_at",
            params![key, value, now.to_rfc3339(), expires_at.to_rfc3339()],
        )
        .map_err(|e| CacheError::Database(e.to_string()))?;

        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM scrape_cache WHERE key = ?", params![key])
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(())
    }

    fn purge_expired(&self) -> Result<u32, CacheError> {
        let conn = self.lock()?;
        // RFC 3339 UTC timestamps from chrono compare correctly as text.
        let removed = conn
            .execute(
                "DELETE FROM scrape_cache WHERE expires_at <= ?",
                params![Utc::now().to_rfc3339()],
            )
            .map_err(|e| CacheError::Database(e.to_string()))?;
        Ok(removed as u32)
    }
}
