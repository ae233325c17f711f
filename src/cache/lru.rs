//! Advanced LRU Cache
//!
//! Bounded, TTL-aware, string-keyed cache with tag invalidation and
//! best-effort disk persistence.
//!
//! # Design
//!
//! - `IndexMap` keeps entries in recency order: index 0 is the next eviction
//!   candidate, the last index is the most recently read or written key
//! - One `parking_lot::Mutex` per instance serializes every operation; no
//!   operation suspends while holding it
//! - Eviction is strict LRU, one entry per step regardless of entry size
//! - Persistence failures are logged and swallowed

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::entry::{now_secs, CacheEntry, EntryInfo};
use super::persistence::{self, PersistedEntry, Snapshot, SnapshotMetadata};
use crate::config::CacheConfig;
use crate::error::Result;

// =============================================================================
// Statistics
// =============================================================================

#[derive(Debug, Default, Clone)]
struct Counters {
    hits: u64,
    misses: u64,
    evictions: u64,
    expired_removals: u64,
    avg_access_time_ms: f64,
}

/// Point-in-time cache statistics
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Percentage 0-100, rounded to two places; 0 with no requests
    pub hit_ratio: f64,
    pub evictions: u64,
    pub expired_removals: u64,
    pub current_size: usize,
    pub max_size: usize,
    pub total_size_bytes: u64,
    pub avg_access_time_ms: f64,
    pub ttl_seconds: f64,
    pub persistence_enabled: bool,
}

impl CacheStats {
    /// Entry count as a percentage of capacity
    pub fn utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.current_size as f64 / self.max_size as f64 * 100.0
        }
    }

    /// Total get calls observed
    pub fn total_requests(&self) -> u64 {
        self.hits + self.misses
    }
}

// =============================================================================
// Cache
// =============================================================================

struct CacheInner<V> {
    entries: IndexMap<String, CacheEntry<V>>,
    counters: Counters,
    total_size_bytes: u64,
}

impl<V> CacheInner<V> {
    fn new() -> Self {
        Self {
            entries: IndexMap::new(),
            counters: Counters::default(),
            total_size_bytes: 0,
        }
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let removed = self.entries.shift_remove(key)?;
        self.total_size_bytes = self.total_size_bytes.saturating_sub(removed.size_bytes());
        Some(removed)
    }

    fn remove_where(&mut self, mut pred: impl FnMut(&CacheEntry<V>) -> bool) -> usize {
        let before = self.entries.len();
        let mut freed = 0u64;
        self.entries.retain(|_, entry| {
            if pred(entry) {
                freed += entry.size_bytes();
                false
            } else {
                true
            }
        });
        self.total_size_bytes = self.total_size_bytes.saturating_sub(freed);
        before - self.entries.len()
    }

    fn record_access_time(&mut self, elapsed: Duration) {
        let total = self.counters.hits + self.counters.misses;
        if total == 0 {
            return;
        }
        let ms = elapsed.as_secs_f64() * 1000.0;
        let prev = self.counters.avg_access_time_ms;
        self.counters.avg_access_time_ms = (prev * (total - 1) as f64 + ms) / total as f64;
    }
}

/// Thread-safe LRU cache with TTL, tags and optional persistence
pub struct AdvancedLruCache<V = Value> {
    max_size: usize,
    ttl: Duration,
    /// Snapshot target, present only when persistence is enabled
    persistence_path: Option<PathBuf>,
    inner: Mutex<CacheInner<V>>,
}

impl<V> AdvancedLruCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    /// Create a cache, loading any existing snapshot when persistence is on
    pub fn with_config(config: CacheConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_validated(&config))
    }

    /// Create a cache with the default configuration
    pub fn new() -> Self {
        Self::from_validated(&CacheConfig::default())
    }

    pub(crate) fn from_validated(config: &CacheConfig) -> Self {
        let persistence_path = config
            .enable_persistence
            .then(|| persistence::resolve_path(config.persistence_path.as_deref()));

        let cache = Self {
            max_size: config.max_size,
            ttl: config.ttl,
            persistence_path,
            inner: Mutex::new(CacheInner::new()),
        };
        cache.load_from_disk();
        cache
    }

    /// Look up a key, promoting it to most-recent on a hit
    pub fn get(&self, key: &str) -> Option<V> {
        let start = Instant::now();
        let mut inner = self.inner.lock();

        let result = match inner.entries.get_index_of(key) {
            None => {
                inner.counters.misses += 1;
                None
            }
            Some(idx) if inner.entries[idx].is_expired(self.ttl) => {
                inner.remove(key);
                inner.counters.misses += 1;
                inner.counters.expired_removals += 1;
                debug!(key, "cache entry expired on read");
                None
            }
            Some(idx) => {
                let last = inner.entries.len() - 1;
                inner.entries.move_index(idx, last);
                let entry = &mut inner.entries[last];
                entry.touch();
                let value = entry.value().clone();
                inner.counters.hits += 1;
                Some(value)
            }
        };

        inner.record_access_time(start.elapsed());
        result
    }

    /// Insert or fully replace a value
    pub fn put(&self, key: impl Into<String>, value: V) {
        self.put_tagged(key, value, std::iter::empty::<String>());
    }

    /// Insert or fully replace a value, attaching invalidation tags
    pub fn put_tagged<I, S>(&self, key: impl Into<String>, value: V, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let key = key.into();
        let tags: BTreeSet<String> = tags.into_iter().map(Into::into).collect();
        let entry = CacheEntry::new(key.clone(), value, tags);

        let mut inner = self.inner.lock();
        inner.remove(&key);
        inner.total_size_bytes += entry.size_bytes();
        inner.entries.insert(key, entry);

        while inner.entries.len() > self.max_size {
            if let Some((evicted, entry)) = inner.entries.shift_remove_index(0) {
                inner.total_size_bytes = inner.total_size_bytes.saturating_sub(entry.size_bytes());
                inner.counters.evictions += 1;
                debug!(key = %evicted, "evicted least recently used entry");
            }
        }

        self.save_to_disk(&inner);
    }

    /// Remove one key; false if it was not present
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.remove(key).is_some();
        if removed {
            self.save_to_disk(&inner);
        }
        removed
    }

    /// Remove every entry carrying any of the given tags
    pub fn invalidate_by_tags<S: AsRef<str>>(&self, tags: &[S]) -> usize {
        if tags.is_empty() {
            return 0;
        }
        let mut inner = self.inner.lock();
        let removed = inner.remove_where(|entry| entry.has_any_tag(tags));
        if removed > 0 {
            debug!(removed, "invalidated entries by tag");
            self.save_to_disk(&inner);
        }
        removed
    }

    /// Drop all entries; statistics are kept
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.total_size_bytes = 0;
        self.save_to_disk(&inner);
    }

    /// Zero the statistics counters; contents are kept
    pub fn reset_stats(&self) {
        self.inner.lock().counters = Counters::default();
    }

    /// Sweep all expired entries
    pub fn cleanup_expired(&self) -> usize {
        let mut inner = self.inner.lock();
        let ttl = self.ttl;
        let removed = inner.remove_where(|entry| entry.is_expired(ttl));
        inner.counters.expired_removals += removed as u64;
        if removed > 0 {
            debug!(removed, "removed expired entries");
            self.save_to_disk(&inner);
        }
        removed
    }

    /// Current statistics
    pub fn get_stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let c = &inner.counters;
        let total = c.hits + c.misses;
        let hit_ratio = if total > 0 {
            c.hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        CacheStats {
            hits: c.hits,
            misses: c.misses,
            hit_ratio: crate::round_to(hit_ratio, 2),
            evictions: c.evictions,
            expired_removals: c.expired_removals,
            current_size: inner.entries.len(),
            max_size: self.max_size,
            total_size_bytes: inner.total_size_bytes,
            avg_access_time_ms: crate::round_to(c.avg_access_time_ms, 3),
            ttl_seconds: self.ttl.as_secs_f64(),
            persistence_enabled: self.persistence_path.is_some(),
        }
    }

    /// Per-entry diagnostics, oldest first; does not change LRU order
    pub fn get_entries_info(&self) -> Vec<EntryInfo> {
        let inner = self.inner.lock();
        inner.entries.values().map(|e| e.info(self.ttl)).collect()
    }

    /// Keys in recency order, oldest first
    pub fn keys(&self) -> Vec<String> {
        self.inner.lock().entries.keys().cloned().collect()
    }

    /// Presence check that touches neither statistics nor order
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Snapshot path when persistence is enabled
    pub fn persistence_path(&self) -> Option<&Path> {
        self.persistence_path.as_deref()
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    fn save_to_disk(&self, inner: &CacheInner<V>) {
        let Some(path) = self.persistence_path.as_deref() else {
            return;
        };

        let entries = inner
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(self.ttl))
            .map(|(key, entry)| {
                (
                    key.clone(),
                    PersistedEntry {
                        value: entry.value().clone(),
                        created_at: Some(entry.created_at()),
                        accessed_at: Some(entry.accessed_at()),
                        access_count: entry.access_count(),
                        tags: entry.tags().clone(),
                    },
                )
            })
            .collect();

        let snapshot = Snapshot {
            metadata: SnapshotMetadata {
                version: crate::VERSION.to_string(),
                saved_at: now_secs(),
                max_size: self.max_size,
                ttl_seconds: self.ttl.as_secs_f64(),
            },
            entries,
        };

        if let Err(e) = persistence::save(path, &snapshot) {
            error!("Failed to save cache to disk at {}: {}", path.display(), e);
        }
    }

    fn load_from_disk(&self) {
        let Some(path) = self.persistence_path.as_deref() else {
            return;
        };

        let snapshot: Snapshot<V> = match persistence::load(path) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return,
            Err(e) => {
                warn!("Failed to load cache from disk at {}: {}", path.display(), e);
                return;
            }
        };

        let now = now_secs();
        let mut inner = self.inner.lock();

        for (key, saved) in snapshot.entries {
            if inner.entries.len() >= self.max_size {
                break;
            }
            let created_at = saved.created_at.unwrap_or(now);
            let entry = CacheEntry::restore(
                key.clone(),
                saved.value,
                created_at,
                saved.accessed_at.unwrap_or(created_at),
                saved.access_count,
                saved.tags,
            );
            if entry.is_expired(self.ttl) {
                continue;
            }
            inner.total_size_bytes += entry.size_bytes();
            inner.entries.insert(key, entry);
        }

        info!(
            loaded = inner.entries.len(),
            path = %path.display(),
            "loaded cache snapshot"
        );
    }
}

impl<V> Default for AdvancedLruCache<V>
where
    V: Clone + Serialize + DeserializeOwned,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<V> std::fmt::Debug for AdvancedLruCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdvancedLruCache")
            .field("max_size", &self.max_size)
            .field("ttl", &self.ttl)
            .field("persistence_path", &self.persistence_path)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache(max_size: usize) -> AdvancedLruCache {
        AdvancedLruCache::with_config(CacheConfig {
            max_size,
            ..Default::default()
        })
        .unwrap()
    }

    fn short_ttl_cache(ttl: Duration) -> AdvancedLruCache {
        AdvancedLruCache::with_config(CacheConfig {
            ttl,
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_put_get() {
        let cache = cache(10);
        cache.put("guide", json!({"content": "text"}));

        assert_eq!(cache.get("guide"), Some(json!({"content": "text"})));
        assert_eq!(cache.len(), 1);

        let stats = cache.get_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_miss_counts() {
        let cache = cache(10);
        assert!(cache.get("absent").is_none());

        let stats = cache.get_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.expired_removals, 0);
        assert_eq!(stats.hit_ratio, 0.0);
    }

    #[test]
    fn test_lru_eviction_order() {
        let cache = cache(2);
        cache.put("a", json!(1));
        cache.put("b", json!(2));
        cache.get("a");
        cache.put("c", json!(3));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.get_stats().evictions, 1);
        assert_eq!(cache.keys(), vec!["a", "c"]);
    }

    #[test]
    fn test_replace_is_not_merge() {
        let cache = cache(5);
        cache.put_tagged("k", json!({"old": true}), ["t1"]);
        cache.put("k", json!({"new": true}));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), Some(json!({"new": true})));
        // Old tags went with the old entry
        assert_eq!(cache.invalidate_by_tags(&["t1"]), 0);
    }

    #[test]
    fn test_replace_moves_to_most_recent() {
        let cache = cache(2);
        cache.put("a", json!(1));
        cache.put("b", json!(2));
        cache.put("a", json!(3));
        cache.put("c", json!(4));

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
    }

    #[test]
    fn test_ttl_expiry_on_get() {
        let cache = short_ttl_cache(Duration::from_millis(100));
        cache.put("k", json!("v"));
        std::thread::sleep(Duration::from_millis(150));

        assert!(cache.get("k").is_none());
        let stats = cache.get_stats();
        assert_eq!(stats.expired_removals, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.current_size, 0);
    }

    #[test]
    fn test_tag_invalidation() {
        let cache = cache(10);
        cache.put_tagged("a", json!(1), ["t1"]);
        cache.put_tagged("b", json!(2), ["t1", "t2"]);
        cache.put_tagged("c", json!(3), ["t2"]);

        assert_eq!(cache.invalidate_by_tags(&["t1"]), 2);
        assert!(!cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.invalidate_by_tags::<&str>(&[]), 0);
    }

    #[test]
    fn test_invalidate() {
        let cache = cache(10);
        cache.put("a", json!(1));
        assert!(cache.invalidate("a"));
        assert!(!cache.invalidate("a"));
        assert_eq!(cache.get_stats().total_size_bytes, 0);
    }

    #[test]
    fn test_clear_keeps_history() {
        let cache = cache(10);
        cache.put("a", json!(1));
        cache.get("a");
        cache.get("zz");
        cache.clear();

        let stats = cache.get_stats();
        assert_eq!(stats.current_size, 0);
        assert_eq!(stats.total_size_bytes, 0);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        cache.reset_stats();
        let stats = cache.get_stats();
        assert_eq!(stats.hits, 0);
        assert_eq!(stats.misses, 0);
    }

    #[test]
    fn test_cleanup_expired() {
        let cache = short_ttl_cache(Duration::from_millis(50));
        cache.put("a", json!(1));
        cache.put("b", json!(2));
        std::thread::sleep(Duration::from_millis(80));
        cache.put("c", json!(3));

        assert_eq!(cache.cleanup_expired(), 2);
        assert_eq!(cache.keys(), vec!["c"]);
        assert_eq!(cache.get_stats().expired_removals, 2);
    }

    #[test]
    fn test_hit_ratio_rounding() {
        let cache = cache(10);
        cache.put("a", json!(1));
        cache.get("a");
        cache.get("a");
        cache.get("x");

        // 2 / 3 * 100 = 66.666...
        assert_eq!(cache.get_stats().hit_ratio, 66.67);
    }

    #[test]
    fn test_total_size_tracking() {
        let cache = cache(2);
        cache.put("a", json!("xx")); // 4 bytes
        cache.put("b", json!("yyy")); // 5 bytes
        assert_eq!(cache.get_stats().total_size_bytes, 9);

        cache.put("c", json!("z")); // evicts a
        assert_eq!(cache.get_stats().total_size_bytes, 8);
    }

    #[test]
    fn test_entries_info_does_not_reorder() {
        let cache = cache(3);
        cache.put_tagged("a", json!(1), ["x"]);
        cache.put("b", json!(2));
        cache.get("a");

        let info = cache.get_entries_info();
        assert_eq!(info.len(), 2);
        assert_eq!(info[0].key, "b");
        assert_eq!(info[1].key, "a");
        assert_eq!(info[1].access_count, 1);
        assert_eq!(info[1].tags, vec!["x".to_string()]);
        assert_eq!(cache.keys(), vec!["b", "a"]);
    }

    #[test]
    fn test_stats_shape() {
        let cache = cache(7);
        let stats = cache.get_stats();
        assert_eq!(stats.max_size, 7);
        assert_eq!(stats.ttl_seconds, 3600.0);
        assert!(!stats.persistence_enabled);
        assert_eq!(stats.utilization(), 0.0);
    }

    #[test]
    fn test_typed_values() {
        let cache: AdvancedLruCache<String> = AdvancedLruCache::new();
        cache.put("greeting", "hello".to_string());
        assert_eq!(cache.get("greeting").as_deref(), Some("hello"));
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig {
            enable_persistence: true,
            persistence_path: Some(dir.path().join("cache.json")),
            ..Default::default()
        };

        {
            let cache: AdvancedLruCache = AdvancedLruCache::with_config(config.clone()).unwrap();
            cache.put_tagged("a", json!({"v": 1}), ["t"]);
            cache.put("b", json!("two"));
        }

        let reloaded: AdvancedLruCache = AdvancedLruCache::with_config(config).unwrap();
        assert_eq!(reloaded.keys(), vec!["a", "b"]);
        assert_eq!(reloaded.get("a"), Some(json!({"v": 1})));
        assert_eq!(reloaded.get("b"), Some(json!("two")));
        assert_eq!(reloaded.invalidate_by_tags(&["t"]), 1);
    }

    #[test]
    fn test_persistence_load_respects_max_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let big = CacheConfig {
            max_size: 10,
            enable_persistence: true,
            persistence_path: Some(path.clone()),
            ..Default::default()
        };
        {
            let cache: AdvancedLruCache = AdvancedLruCache::with_config(big).unwrap();
            for i in 0..5 {
                cache.put(format!("k{}", i), json!(i));
            }
        }

        let small = CacheConfig {
            max_size: 3,
            enable_persistence: true,
            persistence_path: Some(path),
            ..Default::default()
        };
        let reloaded: AdvancedLruCache = AdvancedLruCache::with_config(small).unwrap();
        assert_eq!(reloaded.len(), 3);
        assert_eq!(reloaded.keys(), vec!["k0", "k1", "k2"]);
    }

    #[test]
    fn test_persistence_skips_expired_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let config = CacheConfig {
            ttl: Duration::from_millis(100),
            enable_persistence: true,
            persistence_path: Some(path),
            ..Default::default()
        };
        {
            let cache: AdvancedLruCache = AdvancedLruCache::with_config(config.clone()).unwrap();
            cache.put("k", json!(1));
        }
        std::thread::sleep(Duration::from_millis(150));

        let reloaded: AdvancedLruCache = AdvancedLruCache::with_config(config).unwrap();
        assert!(reloaded.is_empty());
    }

    #[test]
    fn test_snapshot_records_sub_second_ttl() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let config = CacheConfig {
            ttl: Duration::from_millis(250),
            enable_persistence: true,
            persistence_path: Some(path.clone()),
            ..Default::default()
        };
        let cache: AdvancedLruCache = AdvancedLruCache::with_config(config).unwrap();
        cache.put("k", json!(1));

        let snapshot: Snapshot<Value> = persistence::load(&path).unwrap().unwrap();
        assert_eq!(snapshot.metadata.ttl_seconds, 0.25);
    }

    #[test]
    fn test_load_uses_entry_expiry_rule() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let now = now_secs();
        let saved = |age: f64| PersistedEntry {
            value: json!(age),
            created_at: Some(now - age),
            accessed_at: Some(now - age),
            access_count: 0,
            tags: BTreeSet::new(),
        };
        let mut entries = IndexMap::new();
        entries.insert("fresh".to_string(), saved(5.0));
        entries.insert("stale".to_string(), saved(15.0));
        let snapshot = Snapshot {
            metadata: SnapshotMetadata {
                version: "test".into(),
                saved_at: now,
                max_size: 10,
                ttl_seconds: 10.0,
            },
            entries,
        };
        persistence::save(&path, &snapshot).unwrap();

        let reloaded: AdvancedLruCache = AdvancedLruCache::with_config(CacheConfig {
            ttl: Duration::from_secs(10),
            enable_persistence: true,
            persistence_path: Some(path),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(reloaded.keys(), vec!["fresh"]);
    }

    #[test]
    fn test_corrupt_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, b"garbage").unwrap();

        let cache: AdvancedLruCache = AdvancedLruCache::with_config(CacheConfig {
            enable_persistence: true,
            persistence_path: Some(path),
            ..Default::default()
        })
        .unwrap();
        assert!(cache.is_empty());

        // Still fully usable, and the next put overwrites the bad file
        cache.put("k", json!(1));
        assert_eq!(cache.get("k"), Some(json!(1)));
    }

    #[test]
    fn test_unwritable_path_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        // Parent "directory" is a regular file, so every save fails
        let cache: AdvancedLruCache = AdvancedLruCache::with_config(CacheConfig {
            enable_persistence: true,
            persistence_path: Some(blocker.join("cache.json")),
            ..Default::default()
        })
        .unwrap();

        cache.put("k", json!(1));
        assert_eq!(cache.get("k"), Some(json!(1)));
        assert!(cache.get_stats().persistence_enabled);
    }

    #[test]
    fn test_concurrent_access() {
        use std::sync::Arc;
        use std::thread;

        let cache = Arc::new(cache(64));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("k-{}-{}", t, i);
                        cache.put(key.clone(), json!(i));
                        cache.get(&key);
                        assert!(cache.len() <= 64);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let stats = cache.get_stats();
        assert_eq!(stats.current_size, 64);
        assert_eq!(stats.evictions, 8 * 200 - 64);
    }
}
