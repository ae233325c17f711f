//! Content Cache
//!
//! Bounded LRU caches with TTL expiry, tag invalidation and best-effort
//! JSON snapshot persistence, grouped under a [`CacheManager`].
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        CacheManager                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  "default"            │ "content"          │ ...              │
//! │  ┌────────────────┐   │ ┌────────────────┐ │                  │
//! │  │AdvancedLruCache│   │ │AdvancedLruCache│ │                  │
//! │  │ Mutex<IndexMap>│   │ │ Mutex<IndexMap>│ │                  │
//! │  └───────┬────────┘   │ └───────┬────────┘ │                  │
//! │          │ put        │         │ put      │                  │
//! │          ▼            │         ▼          │                  │
//! │    cache.json         │   content.json     │                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Values default to `serde_json::Value`; any `Clone + Serialize +
//! DeserializeOwned` type works for standalone caches.

mod entry;
mod health;
mod lru;
mod manager;
mod persistence;
mod proptest;

pub use entry::{CacheEntry, EntryInfo};
pub use health::{CacheHealthReport, Efficiency, HealthStatus, MemoryUsage};
pub use lru::{AdvancedLruCache, CacheStats};
pub use manager::{CacheManager, DEFAULT_CACHE};
pub use persistence::{resolve_path, PersistedEntry, Snapshot, SnapshotMetadata};
