//! OSP Marketing Core - Content Cache and Batch Analysis
//!
//! The caching and parallel batch-processing layer behind the OSP
//! marketing tools. Content analysis itself is pluggable: the batch
//! processor only sees a [`ContentScorer`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        OSP Marketing Core                        │
//! ├──────────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────┐   ┌────────────────┐   ┌───────────────┐  │
//! │  │ BatchAnalysis     │──▶│ BatchProcessor │──▶│ ContentScorer │  │
//! │  │ Manager           │   │ (per batch)    │   │ (frameworks)  │  │
//! │  └───────────────────┘   └────────────────┘   └───────────────┘  │
//! │                                                                  │
//! │  ┌───────────────────┐   ┌────────────────┐                      │
//! │  │ CachedResources   │──▶│ CacheManager   │──▶ JSON snapshots    │
//! │  └───────────────────┘   │ AdvancedLru... │                      │
//! │                          └────────────────┘                      │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`batch`] - Batch items, processor and submission manager
//! - [`cache`] - LRU caches with TTL, tags and persistence
//! - [`config`] - Cache and batch configuration
//! - [`error`] - Error types
//! - [`metrics`] - Prometheus metrics
//! - [`resources`] - Cached access to resource files
//! - [`scoring`] - Content scoring port and framework registry

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod resources;
pub mod scoring;

// Re-export commonly used types
pub use batch::{
    BatchAnalysisManager, BatchItem, BatchProcessor, BatchProgress, BatchReport, BatchResult,
    BatchState, BatchSummary,
};
pub use cache::{AdvancedLruCache, CacheEntry, CacheManager, CacheStats};
pub use config::{BatchConfig, CacheConfig};
pub use error::{Error, Result};
pub use metrics::Metrics;
pub use resources::{CachedResources, DirResourceReader, ResourceReader};
pub use scoring::{ContentScorer, Framework, FrameworkRegistry};

/// Crate version, written into persisted cache snapshots
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Round `value` to `places` decimal places
pub(crate) fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
