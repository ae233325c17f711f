//! Resource Files
//!
//! Read-only access to named text resources (framework guides and the
//! like) in a single directory, with an LRU cache in front.
//!
//! Names are plain file names. Anything that could leave the resource
//! directory is rejected before the filesystem is touched.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::cache::{AdvancedLruCache, CacheManager};
use crate::error::{Error, Result};

/// Default per-file size limit in megabytes
pub const DEFAULT_MAX_FILE_SIZE_MB: u64 = 10;

/// Cache holding resource contents in a [`CacheManager`]
pub const RESOURCE_CACHE: &str = "resources";

/// Tag attached to every cached resource
pub const RESOURCE_TAG: &str = "resource";

/// Source of named text resources
#[async_trait]
pub trait ResourceReader: Send + Sync {
    async fn read(&self, name: &str) -> Result<String>;
}

/// Reject empty names and names containing path separators or `..`
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::EmptyResourceName);
    }
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        warn!(name, "Path traversal attempt in resource name");
        return Err(Error::PathTraversal(name.to_string()));
    }
    Ok(())
}

// =============================================================================
// Directory Reader
// =============================================================================

/// Reads resources from files in one directory
#[derive(Debug, Clone)]
pub struct DirResourceReader {
    root: PathBuf,
    max_file_size: u64,
}

impl DirResourceReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE_MB * 1024 * 1024,
        }
    }

    /// Limit file size in bytes
    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn map_io(name: &str, e: std::io::Error) -> Error {
        match e.kind() {
            ErrorKind::NotFound => Error::ResourceNotFound(name.to_string()),
            ErrorKind::PermissionDenied => Error::PermissionDenied(name.to_string()),
            _ => Error::Io(e),
        }
    }
}

#[async_trait]
impl ResourceReader for DirResourceReader {
    #[instrument(skip(self))]
    async fn read(&self, name: &str) -> Result<String> {
        validate_name(name)?;
        let path = self.root.join(name);

        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Self::map_io(name, e))?;
        if !metadata.is_file() {
            return Err(Error::ResourceNotFound(name.to_string()));
        }
        if metadata.len() > self.max_file_size {
            return Err(Error::ResourceTooLarge {
                name: name.to_string(),
                size: metadata.len(),
                max: self.max_file_size,
            });
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| Self::map_io(name, e))?;
        let content =
            String::from_utf8(bytes).map_err(|_| Error::ResourceEncoding(name.to_string()))?;

        if content.trim().is_empty() {
            warn!(name, "Resource file is empty");
        }
        info!(name, chars = content.chars().count(), "Read resource");
        Ok(content)
    }
}

// =============================================================================
// Cached Reader
// =============================================================================

/// Serves resources from an LRU cache, falling back to `reader` on a miss.
///
/// Only successful reads are cached.
pub struct CachedResources<R> {
    reader: R,
    cache: Arc<AdvancedLruCache>,
}

impl<R: ResourceReader> CachedResources<R> {
    pub fn new(reader: R, cache: Arc<AdvancedLruCache>) -> Self {
        Self { reader, cache }
    }

    /// Use the manager's [`RESOURCE_CACHE`]
    pub fn from_manager(reader: R, manager: &CacheManager) -> Self {
        Self::new(reader, manager.get_cache(RESOURCE_CACHE))
    }

    pub fn cache(&self) -> &Arc<AdvancedLruCache> {
        &self.cache
    }

    /// Drop every cached resource; returns how many were removed
    pub fn invalidate_all(&self) -> usize {
        self.cache.invalidate_by_tags(&[RESOURCE_TAG])
    }
}

#[async_trait]
impl<R: ResourceReader> ResourceReader for CachedResources<R> {
    async fn read(&self, name: &str) -> Result<String> {
        if let Some(Value::String(content)) = self.cache.get(name) {
            debug!(name, "Resource cache hit");
            return Ok(content);
        }

        debug!(name, "Resource cache miss");
        let content = self.reader.read(name).await?;
        self.cache
            .put_tagged(name, Value::String(content.clone()), [RESOURCE_TAG]);
        Ok(content)
    }
}

// =============================================================================
// Tests
// =============================================================================
