//! In-process scrape cache.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::{CacheError, ScrapeCache};

/// HashMap-backed cache. Lives only as long as the process; stands in when
/// the SQLite file cannot be opened, and in tests.
#[derive(Debug, Default)]
pub struct MemoryScrapeCache {
    entries: Mutex<HashMap<String, (String, Instant)>>,
}

impl MemoryScrapeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries, expired or not.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<String, (String, Instant)>>, CacheError> {
        self.entries
            .lock()
            .map_err(|e| CacheError::Database(format!("Lock poisoned: {}", e)))
    }
}

impl ScrapeCache for MemoryScrapeCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self.lock()?;
        Ok(entries
            .get(key)
            .filter(|(_, expires_at)| *expires_at > Instant::now())
            .map(|(value, _)| value.clone()))
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        self.lock()?
            .insert(key.to_string(), (value.to_string(), Instant::now() + ttl));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.lock()?.remove(key);
        Ok(())
    }

    fn purge_expired(&self) -> Result<u32, CacheError> {
        let mut entries = self.lock()?;
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - entries.len()) as u32)
    }
}
