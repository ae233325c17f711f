//! Prometheus Metrics
//!
//! Batch throughput and cache occupancy, registered on an owned
//! [`Registry`] so several instances can coexist in one process.

use prometheus::{
    Encoder, GaugeVec, Histogram, HistogramOpts, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

use crate::cache::{CacheManager, CacheStats};
use crate::error::Result;

/// Terminal outcome of one batch item
pub mod outcome {
    pub const SUCCESS: &str = "success";
    pub const FAILED: &str = "failed";
    pub const CANCELLED: &str = "cancelled";
    pub const TIMEOUT: &str = "timeout";
}

/// Terminal outcome of one batch run
pub mod batch_result {
    pub const COMPLETED: &str = "completed";
    pub const TIMED_OUT: &str = "timed_out";
    pub const FAILED: &str = "failed";
}

/// Metric handles for the cache and batch subsystems
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    batch_items: IntCounterVec,
    batches: IntCounterVec,
    item_duration: Histogram,
    cache_entries: IntGaugeVec,
    cache_hit_ratio: GaugeVec,
}

impl Metrics {
    /// Create and register every metric
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let batch_items = IntCounterVec::new(
            Opts::new("osp_batch_items_total", "Batch items by terminal outcome"),
            &["outcome"],
        )?;
        let batches = IntCounterVec::new(
            Opts::new("osp_batches_total", "Batch runs by result"),
            &["result"],
        )?;
        let item_duration = Histogram::with_opts(
            HistogramOpts::new(
                "osp_batch_item_duration_seconds",
                "Wall time spent scoring one item",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 30.0]),
        )?;
        let cache_entries = IntGaugeVec::new(
            Opts::new("osp_cache_entries", "Current entries per cache"),
            &["cache"],
        )?;
        let cache_hit_ratio = GaugeVec::new(
            Opts::new("osp_cache_hit_ratio", "Hit ratio percentage per cache"),
            &["cache"],
        )?;

        registry.register(Box::new(batch_items.clone()))?;
        registry.register(Box::new(batches.clone()))?;
        registry.register(Box::new(item_duration.clone()))?;
        registry.register(Box::new(cache_entries.clone()))?;
        registry.register(Box::new(cache_hit_ratio.clone()))?;

        Ok(Self {
            registry,
            batch_items,
            batches,
            item_duration,
            cache_entries,
            cache_hit_ratio,
        })
    }

    /// Count one finished item; `elapsed_ms` is observed only when positive
    pub fn record_item(&self, outcome: &str, elapsed_ms: f64) {
        self.batch_items.with_label_values(&[outcome]).inc();
        if elapsed_ms > 0.0 {
            self.item_duration.observe(elapsed_ms / 1000.0);
        }
    }

    /// Count one finished batch run
    pub fn record_batch(&self, result: &str) {
        self.batches.with_label_values(&[result]).inc();
    }

    /// Publish one cache's statistics
    pub fn observe_cache(&self, name: &str, stats: &CacheStats) {
        self.cache_entries
            .with_label_values(&[name])
            .set(stats.current_size as i64);
        self.cache_hit_ratio
            .with_label_values(&[name])
            .set(stats.hit_ratio);
    }

    /// Publish statistics for every cache in the manager
    pub fn observe_caches(&self, manager: &CacheManager) {
        for (name, stats) in manager.get_all_stats() {
            self.observe_cache(&name, &stats);
        }
    }

    /// Items counted for `outcome` so far
    pub fn items(&self, outcome: &str) -> u64 {
        self.batch_items.with_label_values(&[outcome]).get()
    }

    /// Batches counted for `result` so far
    pub fn batches(&self, result: &str) -> u64 {
        self.batches.with_label_values(&[result]).get()
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Prometheus text exposition of every registered metric
    pub fn gather_text(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
