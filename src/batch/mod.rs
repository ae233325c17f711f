//! Batch Analysis
//!
//! Parallel scoring of content batches with progress reporting.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    BatchAnalysisManager                       │
//! │   submit_batch ─▶ normalize ─▶ BatchProcessor (per batch)     │
//! │        │                             │                        │
//! │   active: DashMap ◀── cancel_batch   │ Semaphore + JoinSet    │
//! │   history: VecDeque                  ▼                        │
//! │                              ContentScorer::score             │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod input;
mod manager;
mod processor;
mod types;

pub use input::{ContentItem, ContentRecord};
pub use manager::{BatchAnalysisManager, BatchRecord, DEFAULT_HISTORY_LIMIT};
pub use processor::{
    BatchProcessor, ProgressCallback, CANCELLED_ERROR, EMPTY_CONTENT_ERROR, TIMEOUT_ERROR,
};
pub use types::{BatchItem, BatchProgress, BatchReport, BatchResult, BatchState, BatchSummary};
