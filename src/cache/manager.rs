//! Cache Manager - Registry of Named Caches
//!
//! Owns one privileged `default` cache plus any number of independently
//! configured named caches. Construct one per process and share it by
//! `Arc`; every cache has its own lock so operations on different names
//! never contend.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

use super::lru::{AdvancedLruCache, CacheStats};
use crate::config::{default_cache_dir, CacheConfig};
use crate::error::{Error, Result};

/// Name of the always-present cache
pub const DEFAULT_CACHE: &str = "default";

/// Registry of named cache instances
pub struct CacheManager {
    /// Configuration used for caches created on first reference
    default_config: CacheConfig,
    /// Directory for per-name snapshot files
    persistence_dir: PathBuf,
    default_cache: Arc<AdvancedLruCache>,
    caches: RwLock<HashMap<String, Arc<AdvancedLruCache>>>,
}

impl CacheManager {
    /// Create a manager whose default cache uses `default_config`
    pub fn new(default_config: CacheConfig) -> Result<Self> {
        default_config.validate()?;
        let default_cache = Arc::new(AdvancedLruCache::from_validated(&default_config));
        Ok(Self {
            default_config,
            persistence_dir: default_cache_dir(),
            default_cache,
            caches: RwLock::new(HashMap::new()),
        })
    }

    /// Store named-cache snapshots under `dir` instead of the temp directory
    pub fn with_persistence_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.persistence_dir = dir.into();
        self
    }

    /// Snapshot file used by the named cache
    pub fn persistence_path_for(&self, name: &str) -> PathBuf {
        self.persistence_dir.join(format!("{}.json", name))
    }

    /// Get a cache by name, creating it with the default configuration on
    /// first reference
    pub fn get_cache(&self, name: &str) -> Arc<AdvancedLruCache> {
        if name == DEFAULT_CACHE {
            return Arc::clone(&self.default_cache);
        }

        if let Some(cache) = self.caches.read().get(name) {
            return Arc::clone(cache);
        }

        let mut caches = self.caches.write();
        let cache = caches.entry(name.to_string()).or_insert_with(|| {
            debug!(name, "creating cache with default configuration");
            let config = CacheConfig {
                persistence_path: Some(self.persistence_path_for(name)),
                ..self.default_config.clone()
            };
            Arc::new(AdvancedLruCache::from_validated(&config))
        });
        Arc::clone(cache)
    }

    /// The `default` cache
    pub fn default_cache(&self) -> Arc<AdvancedLruCache> {
        Arc::clone(&self.default_cache)
    }

    /// Create (or replace) a named cache with explicit settings
    pub fn create_cache(
        &self,
        name: &str,
        max_size: usize,
        ttl: Duration,
        enable_persistence: bool,
    ) -> Result<Arc<AdvancedLruCache>> {
        if name == DEFAULT_CACHE {
            return Err(Error::ReservedCacheName(name.to_string()));
        }

        let config = CacheConfig {
            max_size,
            ttl,
            enable_persistence,
            persistence_path: Some(self.persistence_path_for(name)),
        };
        let cache = Arc::new(AdvancedLruCache::with_config(config)?);

        info!(
            name,
            max_size,
            ttl_secs = ttl.as_secs_f64(),
            enable_persistence,
            "registered cache"
        );
        self.caches.write().insert(name.to_string(), Arc::clone(&cache));
        Ok(cache)
    }

    /// Registered names, `default` first
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.caches.read().keys().cloned().collect();
        names.sort();
        names.insert(0, DEFAULT_CACHE.to_string());
        names
    }

    /// Statistics for every registered cache
    pub fn get_all_stats(&self) -> BTreeMap<String, CacheStats> {
        self.for_each_cache(|cache| cache.get_stats())
    }

    /// Sweep expired entries in every cache
    pub fn cleanup_all_expired(&self) -> BTreeMap<String, usize> {
        self.for_each_cache(|cache| cache.cleanup_expired())
    }

    /// Clear the contents of every cache
    pub fn clear_all(&self) {
        self.for_each_cache(|cache| cache.clear());
    }

    fn for_each_cache<T>(&self, f: impl Fn(&AdvancedLruCache) -> T) -> BTreeMap<String, T> {
        // Clone the handles first so no registry lock is held while a cache lock is taken
        let named: Vec<(String, Arc<AdvancedLruCache>)> = self
            .caches
            .read()
            .iter()
            .map(|(name, cache)| (name.clone(), Arc::clone(cache)))
            .collect();

        let mut out = BTreeMap::new();
        out.insert(DEFAULT_CACHE.to_string(), f(&self.default_cache));
        for (name, cache) in named {
            out.insert(name, f(&cache));
        }
        out
    }

    /// Periodically sweep expired entries until the handle is aborted
    pub fn spawn_expiry_sweeper(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            info!("Starting cache expiry sweeper every {:?}", every);
            let mut tick = interval(every);
            // The first tick completes immediately
            tick.tick().await;
            loop {
                tick.tick().await;
                let removed: usize = manager.cleanup_all_expired().values().sum();
                if removed > 0 {
                    debug!(removed, "expiry sweep removed entries");
                }
            }
        })
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("caches", &self.names())
            .field("persistence_dir", &self.persistence_dir)
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
