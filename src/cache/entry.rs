//! Cache Entry Types
//!
//! A cached value plus the bookkeeping the LRU cache needs: timestamps,
//! access count, serialized size and invalidation tags.

use std::collections::BTreeSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

/// Current wall-clock time as fractional epoch seconds
#[inline]
pub(crate) fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

/// Serialized length of a value, never zero
fn serialized_size<V: Serialize>(value: &V) -> u64 {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len() as u64)
        .unwrap_or(0)
        .max(1)
}

/// A cached value with its metadata
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    key: String,
    value: V,
    /// Creation timestamp (epoch seconds)
    created_at: f64,
    /// Last access timestamp (epoch seconds)
    accessed_at: f64,
    access_count: u64,
    size_bytes: u64,
    tags: BTreeSet<String>,
}

impl<V: Serialize> CacheEntry<V> {
    /// Create a fresh entry stamped with the current time
    pub fn new(key: impl Into<String>, value: V, tags: BTreeSet<String>) -> Self {
        let now = now_secs();
        Self::restore(key, value, now, now, 0, tags)
    }

    /// Rebuild an entry from persisted metadata
    pub fn restore(
        key: impl Into<String>,
        value: V,
        created_at: f64,
        accessed_at: f64,
        access_count: u64,
        tags: BTreeSet<String>,
    ) -> Self {
        let size_bytes = serialized_size(&value);
        Self {
            key: key.into(),
            value,
            created_at,
            accessed_at,
            access_count,
            size_bytes,
            tags,
        }
    }
}

impl<V> CacheEntry<V> {
    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    #[inline]
    pub fn created_at(&self) -> f64 {
        self.created_at
    }

    #[inline]
    pub fn accessed_at(&self) -> f64 {
        self.accessed_at
    }

    #[inline]
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    #[inline]
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    #[inline]
    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    /// Seconds since creation
    pub fn age_secs(&self) -> f64 {
        (now_secs() - self.created_at).max(0.0)
    }

    /// An entry is stale once its age strictly exceeds the TTL
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.age_secs() > ttl.as_secs_f64()
    }

    /// True if the entry carries any of the given tags
    pub fn has_any_tag<S: AsRef<str>>(&self, tags: &[S]) -> bool {
        tags.iter().any(|t| self.tags.contains(t.as_ref()))
    }

    /// Record a read hit
    pub fn touch(&mut self) {
        self.accessed_at = now_secs();
        self.access_count += 1;
    }

    /// Diagnostic view of this entry
    pub fn info(&self, ttl: Duration) -> EntryInfo {
        let age = self.age_secs();
        EntryInfo {
            key: self.key.clone(),
            created_at: self.created_at,
            accessed_at: self.accessed_at,
            access_count: self.access_count,
            size_bytes: self.size_bytes,
            tags: self.tags.iter().cloned().collect(),
            age_seconds: crate::round_to(age, 2),
            is_expired: age > ttl.as_secs_f64(),
        }
    }
}

/// Read-only per-entry diagnostics returned by `get_entries_info`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryInfo {
    pub key: String,
    pub created_at: f64,
    pub accessed_at: f64,
    pub access_count: u64,
    pub size_bytes: u64,
    pub tags: Vec<String>,
    pub age_seconds: f64,
    pub is_expired: bool,
}

// =============================================================================
// Tests
// =============================================================================
