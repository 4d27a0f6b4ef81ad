//! Short-lived TTL cache for fetch results.
//!
//! Process-scoped, unbounded key space, per-entry TTL with lazy eviction:
//! an expired entry reads as absent and is removed by the lookup that
//! observes it. The cache is in-memory and resets on application restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::warn;

/// Default TTL applied when `set` is called without one.
const DEFAULT_TTL: Duration = Duration::from_secs(60);

/// Floor for entry TTLs. Shorter values are clamped up.
const MIN_TTL: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

/// Thread-safe TTL cache keyed by string.
pub struct ExpiringCache<V> {
    default_ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> ExpiringCache<V> {
    /// Create a cache with a 60 second default TTL.
    pub fn new() -> Self {
        Self::with_default_ttl(DEFAULT_TTL)
    }

    /// Create a cache with a custom default TTL.
    pub fn with_default_ttl(default_ttl: Duration) -> Self {
        Self {
            default_ttl: default_ttl.max(MIN_TTL),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Lock the entries mutex, recovering from poison if necessary.
    ///
    /// Worst case after recovery is a stale or missing cache entry, which
    /// is better than panicking.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<V>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Cache mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Look up `key`. An entry whose TTL has elapsed reads as absent and is
    /// evicted.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.lock_entries();
        match entries.get(key) {
            Some(entry) if entry.expires_at <= now => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }

    /// Store `value` under `key`, overwriting any previous entry. `ttl`
    /// falls back to the cache default.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) {
        let ttl = ttl.unwrap_or(self.default_ttl).max(MIN_TTL);
        let mut entries = self.lock_entries();
        entries.insert(
            key.into(),
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.lock_entries().clear();
    }

    /// Number of stored entries, including not-yet-evicted expired ones.
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for ExpiringCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_round_trip_before_ttl() {
        let cache = ExpiringCache::new();
        cache.set("quote:AAPL", 42u64, Some(Duration::from_secs(5)));
        assert_eq!(cache.get("quote:AAPL"), Some(42));
    }

    #[test]
    fn test_absent_after_ttl_and_lazily_evicted() {
        let cache = ExpiringCache::new();
        cache.set("quote:AAPL", 42u64, Some(Duration::from_millis(10)));
        assert_eq!(cache.len(), 1);

        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get("quote:AAPL"), None);
        // The failed lookup removed the entry.
        assert!(cache.is_empty());
    }

    #[test]
    fn test_set_overwrites_existing_entry() {
        let cache = ExpiringCache::new();
        cache.set("k", 1u64, None);
        cache.set("k", 2u64, None);
        assert_eq!(cache.get("k"), Some(2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_zero_ttl_is_clamped_to_minimum() {
        let cache = ExpiringCache::new();
        cache.set("k", 1u64, Some(Duration::ZERO));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
    }

    #[test]
    fn test_clear_drops_all_entries() {
        let cache = ExpiringCache::new();
        cache.set("a", 1u64, None);
        cache.set("b", 2u64, None);
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_concurrent_get_and_set() {
        let cache = Arc::new(ExpiringCache::new());
        let mut handles = Vec::new();
        for worker in 0..4u64 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..100u64 {
                    let key = format!("k{}", i % 10);
                    cache.set(key.clone(), worker * 1000 + i, None);
                    let _ = cache.get(&key);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 10);
    }
}
