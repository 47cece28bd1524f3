#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Time source for cache expiry checks.
///
/// Production code uses [`SystemClock`]; tests inject a manually advanced
/// clock so TTL behavior is deterministic.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A thread-safe cache with TTL support.
pub struct Cache<V> {
    data: DashMap<String, CacheEntry<V>>,
    default_ttl: chrono::Duration,
    clock: Arc<dyn Clock>,
}

struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

impl<V: Clone> Cache<V> {
    /// Create a new cache with the given default TTL, on the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    /// Create a new cache reading time from the given clock.
    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            data: DashMap::new(),
            default_ttl: chrono::Duration::from_std(default_ttl)
                .unwrap_or(chrono::Duration::MAX),
            clock,
        }
    }

    /// Get a value from the cache.
    pub fn get(&self, key: &str) -> Option<V> {
        let entry = self.data.get(key)?;
        if entry.expires_at > self.clock.now() {
            Some(entry.value.clone())
        } else {
            drop(entry);
            self.data.remove(key);
            None
        }
    }

    /// Set a value in the cache with the default TTL, replacing any previous
    /// entry for the key.
    pub fn set(&self, key: String, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Set a value in the cache with a custom TTL.
    pub fn set_with_ttl(&self, key: String, value: V, ttl: chrono::Duration) {
        self.data.insert(
            key,
            CacheEntry {
                value,
                expires_at: self.clock.now() + ttl,
            },
        );
    }

    /// Check if a key exists and is not expired.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Remove a value from the cache.
    pub fn remove(&self, key: &str) -> Option<V> {
        self.data.remove(key).map(|(_, entry)| entry.value)
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        self.data.clear();
    }

    /// Remove all expired entries from the cache.
    pub fn cleanup(&self) {
        let now = self.clock.now();
        self.data.retain(|_, entry| entry.expires_at > now);
    }

    /// Get the number of entries in the cache (including expired).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
