//! Configuration for the cache and batch subsystems
//!
//! Values are plain data here. The binary fills them from CLI flags and
//! `OSP_*` environment variables; library users construct them directly.

use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};

/// Environment variable overriding the cache persistence file
pub const CACHE_PATH_ENV: &str = "OSP_CACHE_PATH";

/// Frameworks applied when neither the item nor the caller names any
pub const DEFAULT_FRAMEWORKS: [&str; 4] = ["IDEAL", "STEPPS", "E-E-A-T", "GDocP"];

/// Directory holding persisted cache snapshots when no path is configured
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir().join("osp_cache")
}

// =============================================================================
// Cache Configuration
// =============================================================================

/// Configuration for a single [`AdvancedLruCache`](crate::cache::AdvancedLruCache)
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of entries
    pub max_size: usize,

    /// Age after which an entry is stale
    pub ttl: Duration,

    /// Write a snapshot to disk on every put
    pub enable_persistence: bool,

    /// Explicit snapshot path (takes precedence over `OSP_CACHE_PATH`)
    pub persistence_path: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 50,
            ttl: Duration::from_secs(3600),
            enable_persistence: false,
            persistence_path: None,
        }
    }
}

impl CacheConfig {
    /// Reject configurations the cache cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(Error::Config("cache max_size must be > 0".into()));
        }
        if self.ttl.is_zero() {
            return Err(Error::Config("cache ttl must be > 0".into()));
        }
        Ok(())
    }

    /// Soft advisories for values that work but are probably mistakes
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.max_size < 10 {
            warnings.push(format!(
                "Cache size ({}) is very small, consider increasing",
                self.max_size
            ));
        } else if self.max_size > 1000 {
            warnings.push(format!(
                "Cache size ({}) is very large, consider reducing",
                self.max_size
            ));
        }

        let ttl_secs = self.ttl.as_secs_f64();
        if ttl_secs < 60.0 {
            warnings.push(format!("Cache TTL ({}s) is very short", ttl_secs));
        } else if ttl_secs > 86_400.0 {
            warnings.push(format!("Cache TTL ({}s) is very long", ttl_secs));
        }

        warnings
    }
}

// =============================================================================
// Batch Configuration
// =============================================================================

/// Configuration for [`BatchProcessor`](crate::batch::BatchProcessor) runs
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Maximum items accepted in one batch
    pub max_batch_size: usize,

    /// Maximum items scored at the same time
    pub parallel_workers: usize,

    /// Deadline for the whole batch
    pub timeout: Duration,

    /// Frameworks used for items that do not name their own
    pub default_frameworks: Vec<String>,

    /// Number of finished batches kept in the manager's history
    pub history_limit: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 10,
            parallel_workers: 4,
            timeout: Duration::from_secs(300),
            default_frameworks: DEFAULT_FRAMEWORKS.iter().map(|s| s.to_string()).collect(),
            history_limit: 100,
        }
    }
}

impl BatchConfig {
    /// Reject configurations the processor cannot honour
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size == 0 {
            return Err(Error::Config("batch max_batch_size must be >= 1".into()));
        }
        if self.parallel_workers == 0 {
            return Err(Error::Config("batch parallel_workers must be >= 1".into()));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("batch timeout must be > 0".into()));
        }
        if self.default_frameworks.is_empty() {
            return Err(Error::Config(
                "batch default_frameworks must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Soft advisories for values that work but are probably mistakes
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.max_batch_size > 100 {
            warnings.push(format!(
                "Batch max size ({}) is very large",
                self.max_batch_size
            ));
        }
        if self.parallel_workers > 32 {
            warnings.push(format!(
                "Batch parallel workers ({}) may be excessive",
                self.parallel_workers
            ));
        }
        warnings
    }
}

// =============================================================================
// Tests
// =============================================================================
