// src/services/cache.rs
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    ttl: Duration,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.inserted_at) >= self.ttl
    }
}

/// In-memory key/value store with per-entry expiry.
///
/// Expired entries are dropped when a read finds them and by [`TtlCache::sweep`].
/// A poisoned lock is recovered rather than propagated; the map holds plain
/// values, so a panic elsewhere cannot leave it half-written.
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> Self {
        TtlCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let entry = CacheEntry {
            value,
            inserted_at: Instant::now(),
            ttl,
        };
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.into(), entry);
    }

    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(key) {
                None => return None,
                Some(entry) if !entry.is_expired(now) => return Some(entry.value.clone()),
                Some(_) => {}
            }
        }

        // Re-check under the write lock: a concurrent set may have refreshed it.
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            debug!("Evicting expired cache entry {}", key);
            entries.remove(key);
        }
        None
    }

    /// Removes every expired entry and returns how many were dropped.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shortest sweep period; `tokio::time::interval` rejects a zero period.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Runs [`TtlCache::sweep`] every `every` (at least [`MIN_SWEEP_INTERVAL`])
/// until the returned task is aborted.
pub fn spawn_sweeper<V>(cache: Arc<TtlCache<V>>, every: Duration) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every.max(MIN_SWEEP_INTERVAL));
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.sweep();
            if removed > 0 {
                debug!("Cache sweep removed {} expired entries", removed);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_value_before_expiry() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(60));
        assert_eq!(cache.get("a"), Some(1));
        assert_eq!(cache.get("missing"), None);
    }

    #[test]
    fn expired_read_is_a_miss_and_evicts() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_millis(10));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_ttl_never_serves() {
        let cache = TtlCache::new();
        cache.set("a", "x".to_string(), Duration::ZERO);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn sweep_drops_only_expired_entries() {
        let cache = TtlCache::new();
        cache.set("short", 1, Duration::from_millis(10));
        cache.set("long", 2, Duration::from_secs(60));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[test]
    fn set_overwrites_last_write_wins() {
        let cache = TtlCache::new();
        cache.set("a", 1, Duration::from_secs(60));
        cache.set("a", 2, Duration::from_secs(60));
        assert_eq!(cache.get("a"), Some(2));
    }

    #[tokio::test]
    async fn sweeper_task_clears_expired_entries() {
        let cache = Arc::new(TtlCache::new());
        cache.set("a", 1, Duration::from_millis(5));
        let handle = spawn_sweeper(cache.clone(), Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.is_empty());
        handle.abort();
    }

    #[tokio::test]
    async fn zero_sweep_interval_is_clamped() {
        let cache = Arc::new(TtlCache::new());
        cache.set("a", 1, Duration::from_millis(5));
        let handle = spawn_sweeper(cache.clone(), Duration::ZERO);
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(!handle.is_finished());
        assert!(cache.is_empty());
        handle.abort();
    }
}
