//! Error types for the OSP marketing core

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the cache and batch subsystems
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Metrics registry error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    // =========================================================================
    // Cache Errors
    // =========================================================================
    /// The default cache cannot be replaced
    #[error("Cache name '{0}' is reserved")]
    ReservedCacheName(String),

    // =========================================================================
    // Batch Errors
    // =========================================================================
    /// Batch exceeds the configured maximum
    #[error("Batch size ({size}) exceeds maximum allowed ({max})")]
    BatchTooLarge { size: usize, max: usize },

    /// Two items in the same batch share an id
    #[error("Duplicate item id in batch: {0}")]
    DuplicateItemId(String),

    /// Content item is neither text nor a structured record
    #[error("Invalid content item: {0}")]
    InvalidContentItem(String),

    /// A batch with this id is already running
    #[error("Batch already in progress: {batch_id}")]
    BatchInProgress { batch_id: String },

    // =========================================================================
    // Scoring Errors
    // =========================================================================
    /// Framework not registered with the scorer
    #[error("Unknown framework '{name}'. Valid frameworks: {valid}")]
    UnknownFramework { name: String, valid: String },

    /// Scoring capability failed
    #[error("Scoring failed: {0}")]
    Scoring(String),

    // =========================================================================
    // Resource Errors
    // =========================================================================
    /// Empty resource name
    #[error("Filename cannot be empty")]
    EmptyResourceName,

    /// Resource name tries to escape the resource directory
    #[error("Invalid filename '{0}' - path traversal not allowed")]
    PathTraversal(String),

    /// Resource file missing
    #[error("Required file '{0}' not found")]
    ResourceNotFound(String),

    /// Resource file over the size limit
    #[error("File '{name}' is too large ({size} bytes, max {max})")]
    ResourceTooLarge { name: String, size: u64, max: u64 },

    /// Resource file is not valid UTF-8
    #[error("File '{0}' encoding error")]
    ResourceEncoding(String),

    /// Resource file not readable
    #[error("Permission denied reading '{0}'")]
    PermissionDenied(String),
}

impl Error {
    /// True for faults raised before any batch work starts
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::BatchTooLarge { .. }
                | Error::DuplicateItemId(_)
                | Error::InvalidContentItem(_)
                | Error::Config(_)
        )
    }
}
