//! Snapshot persistence for the LRU cache
//!
//! The on-disk format is a single JSON document:
//!
//! ```text
//! {
//!   "metadata": {"version", "saved_at", "max_size", "ttl_seconds"},
//!   "entries":  {"<key>": {"value", "created_at", "accessed_at", "access_count", "tags"}}
//! }
//! ```
//!
//! Entries are written oldest-first so a reload restores LRU order. Callers
//! treat every failure here as non-fatal.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::{default_cache_dir, CACHE_PATH_ENV};
use crate::error::Result;

/// Snapshot header
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotMetadata {
    pub version: String,
    pub saved_at: f64,
    pub max_size: usize,
    pub ttl_seconds: f64,
}

/// One persisted entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistedEntry<V> {
    pub value: V,
    #[serde(default)]
    pub created_at: Option<f64>,
    #[serde(default)]
    pub accessed_at: Option<f64>,
    #[serde(default)]
    pub access_count: u64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

/// Full cache snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<V> {
    pub metadata: SnapshotMetadata,
    pub entries: IndexMap<String, PersistedEntry<V>>,
}

/// Resolve the snapshot path: explicit > `OSP_CACHE_PATH` > temp dir default
pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return expand_home(path);
    }
    if let Some(from_env) = std::env::var_os(CACHE_PATH_ENV) {
        if !from_env.is_empty() {
            return expand_home(Path::new(&from_env));
        }
    }
    default_cache_dir().join("cache.json")
}

fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    path.to_path_buf()
}

/// Write a snapshot, replacing the previous file atomically
pub fn save<V: Serialize>(path: &Path, snapshot: &Snapshot<V>) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    let body = serde_json::to_vec_pretty(snapshot)?;
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Read a snapshot; `Ok(None)` when no file exists yet
pub fn load<V: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<Snapshot<V>>> {
    let body = match std::fs::read(path) {
        Ok(body) => body,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_slice(&body)?))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn snapshot() -> Snapshot<Value> {
        let mut entries = IndexMap::new();
        entries.insert(
            "b".to_string(),
            PersistedEntry {
                value: json!("second"),
                created_at: Some(10.0),
                accessed_at: Some(11.0),
                access_count: 2,
                tags: BTreeSet::from(["t".to_string()]),
            },
        );
        entries.insert(
            "a".to_string(),
            PersistedEntry {
                value: json!({"n": 1}),
                created_at: Some(12.0),
                accessed_at: None,
                access_count: 0,
                tags: BTreeSet::new(),
            },
        );
        Snapshot {
            metadata: SnapshotMetadata {
                version: "test".into(),
                saved_at: 13.0,
                max_size: 5,
                ttl_seconds: 60.0,
            },
            entries,
        }
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_path(Some(Path::new("/var/tmp/explicit.json")));
        assert_eq!(path, PathBuf::from("/var/tmp/explicit.json"));
    }

    #[test]
    fn test_save_preserves_entry_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");

        save(&path, &snapshot()).unwrap();
        let loaded: Snapshot<Value> = load(&path).unwrap().unwrap();

        let keys: Vec<_> = loaded.entries.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(loaded.entries["b"].access_count, 2);
        assert_eq!(loaded.metadata.max_size, 5);
        assert!(!dir.path().join("nested").join("cache.json.tmp").exists());
    }

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let loaded: Option<Snapshot<Value>> = load(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, b"{not json").unwrap();
        assert!(load::<Value>(&path).is_err());
    }

    #[test]
    fn test_optional_fields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            br#"{"metadata":{"version":"0","saved_at":1,"max_size":1,"ttl_seconds":1},
                 "entries":{"k":{"value":42}}}"#,
        )
        .unwrap();

        let loaded: Snapshot<Value> = load(&path).unwrap().unwrap();
        let entry = &loaded.entries["k"];
        assert_eq!(entry.value, json!(42));
        assert!(entry.created_at.is_none());
        assert_eq!(entry.access_count, 0);
        assert!(entry.tags.is_empty());
    }
}
