//! Batch Processor
//!
//! Scores a bounded batch of items concurrently against an injected
//! [`ContentScorer`], with a worker cap, a whole-batch deadline and
//! cooperative cancellation.
//!
//! # Flow
//!
//! ```text
//! Idle ─▶ Validating ─┬─▶ Running ─┬─▶ Completed
//!                     │            ├─▶ TimedOut   (unfinished items fail)
//!                     └────────────┴─▶ Failed     (batch-level fault)
//!
//!   items ─sort by priority─▶ JoinSet ──Semaphore(parallel_workers)──▶ scorer
//!                                │
//!                     join_next until deadline ─▶ progress + callback
//! ```
//!
//! Per-item failures never fail the batch. Only validation faults
//! (returned as `Err`) and orchestration faults (`success = false`)
//! are batch-level.

use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

use super::types::{
    BatchItem, BatchProgress, BatchReport, BatchResult, BatchState, BatchSummary,
};
use crate::config::BatchConfig;
use crate::error::{Error, Result};
use crate::metrics::{batch_result, outcome, Metrics};
use crate::scoring::ContentScorer;

/// Error recorded for items with blank content
pub const EMPTY_CONTENT_ERROR: &str = "Empty or invalid content";

/// Error recorded for items skipped after cancellation
pub const CANCELLED_ERROR: &str = "Processing cancelled";

/// Error recorded for items unfinished at the deadline
pub const TIMEOUT_ERROR: &str = "Processing timeout";

/// Observer invoked after every finished item
pub type ProgressCallback = dyn Fn(&BatchProgress) + Send + Sync;

/// Shared inputs cloned into every item task
#[derive(Clone)]
struct ItemContext {
    scorer: Arc<dyn ContentScorer>,
    default_frameworks: Arc<Vec<String>>,
    cancelled: Arc<AtomicBool>,
}

/// Runs one batch at a time against a scoring capability
pub struct BatchProcessor {
    config: BatchConfig,
    scorer: Arc<dyn ContentScorer>,
    cancelled: Arc<AtomicBool>,
    state: Mutex<BatchState>,
    metrics: Option<Metrics>,
}

impl BatchProcessor {
    /// Create a processor after validating `config`
    pub fn new(config: BatchConfig, scorer: Arc<dyn ContentScorer>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scorer,
            cancelled: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(BatchState::Idle),
            metrics: None,
        })
    }

    /// Record item and batch outcomes on `metrics`
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn state(&self) -> BatchState {
        *self.state.lock()
    }

    /// Ask unstarted items to skip scoring. Does not wait.
    pub fn cancel_processing(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        info!("Batch processing cancellation requested");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    fn set_state(&self, state: BatchState) {
        let mut current = self.state.lock();
        let previous = *current;
        debug!(from = %previous, to = %state, "Batch state transition");
        *current = state;
    }

    fn validate(&self, items: &[BatchItem]) -> Result<()> {
        if items.len() > self.config.max_batch_size {
            return Err(Error::BatchTooLarge {
                size: items.len(),
                max: self.config.max_batch_size,
            });
        }

        let mut seen = HashSet::with_capacity(items.len());
        for item in items {
            if !seen.insert(item.id.as_str()) {
                return Err(Error::DuplicateItemId(item.id.clone()));
            }
        }
        Ok(())
    }

    /// Score every item and report per-item results plus a summary.
    ///
    /// # Errors
    ///
    /// Returns an error before any item starts if the batch is larger
    /// than `max_batch_size` or two items share an id.
    #[instrument(skip(self, items, on_progress), fields(items = items.len()))]
    pub async fn process_batch(
        &self,
        items: Vec<BatchItem>,
        on_progress: Option<&ProgressCallback>,
    ) -> Result<BatchReport> {
        self.set_state(BatchState::Validating);
        if let Err(e) = self.validate(&items) {
            warn!(error = %e, "Batch rejected");
            self.set_state(BatchState::Failed);
            self.record_batch(batch_result::FAILED);
            return Err(e);
        }

        if items.is_empty() {
            self.set_state(BatchState::Completed);
            self.record_batch(batch_result::COMPLETED);
            return Ok(BatchReport::empty());
        }

        self.set_state(BatchState::Running);
        info!(
            items = items.len(),
            workers = self.config.parallel_workers,
            "Starting batch"
        );

        let mut items = items;
        items.sort_by(|a, b| b.priority.cmp(&a.priority));
        let ids: Vec<String> = items.iter().map(|item| item.id.clone()).collect();

        let ctx = ItemContext {
            scorer: self.scorer.clone(),
            default_frameworks: Arc::new(self.config.default_frameworks.clone()),
            cancelled: self.cancelled.clone(),
        };
        let semaphore = Arc::new(Semaphore::new(self.config.parallel_workers));
        let deadline = tokio::time::Instant::now() + self.config.timeout;

        let mut tasks = JoinSet::new();
        for (index, item) in items.into_iter().enumerate() {
            let ctx = ctx.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        let result = BatchResult::failed(
                            item.id,
                            format!("Task collection error: {}", e),
                            0.0,
                        );
                        return (index, result, outcome::FAILED);
                    }
                };
                let (result, label) = process_item(item, &ctx).await;
                (index, result, label)
            });
        }

        let mut progress = BatchProgress::new(ids.len());
        let mut finished = vec![false; ids.len()];
        let mut results = Vec::with_capacity(ids.len());
        let mut timed_out = false;

        loop {
            match tokio::time::timeout_at(deadline, tasks.join_next()).await {
                Ok(Some(Ok((index, result, label)))) => {
                    finished[index] = true;
                    self.record_item(label, result.processing_time_ms);
                    progress.record(&result);
                    results.push(result);
                    notify(on_progress, &progress);
                }
                Ok(Some(Err(e))) => {
                    tasks.abort_all();
                    error!(error = %e, "Batch task failed");
                    self.set_state(BatchState::Failed);
                    self.record_batch(batch_result::FAILED);
                    return Ok(BatchReport::fault(
                        format!("Task collection error: {}", e),
                        results,
                        progress,
                    ));
                }
                Ok(None) => break,
                Err(_) => {
                    tasks.abort_all();
                    timed_out = true;
                    break;
                }
            }
        }

        if timed_out {
            let unfinished: Vec<usize> = (0..ids.len()).filter(|i| !finished[*i]).collect();
            warn!(
                timeout_secs = self.config.timeout.as_secs_f64(),
                unfinished = unfinished.len(),
                "Batch timed out"
            );
            for index in unfinished {
                let result = BatchResult::failed(ids[index].clone(), TIMEOUT_ERROR, 0.0);
                self.record_item(outcome::TIMEOUT, 0.0);
                progress.record(&result);
                results.push(result);
            }
        }

        let summary = BatchSummary::from_results(&results, progress.elapsed());
        info!(
            successful = summary.successful_items,
            failed = summary.failed_items,
            elapsed_secs = summary.total_processing_time_seconds,
            timed_out,
            "Batch finished"
        );

        if timed_out {
            self.set_state(BatchState::TimedOut);
            self.record_batch(batch_result::TIMED_OUT);
        } else {
            self.set_state(BatchState::Completed);
            self.record_batch(batch_result::COMPLETED);
        }

        Ok(BatchReport {
            success: true,
            results,
            summary,
            progress,
            error: None,
            timed_out,
        })
    }

    fn record_item(&self, label: &str, elapsed_ms: f64) {
        if let Some(metrics) = &self.metrics {
            metrics.record_item(label, elapsed_ms);
        }
    }

    fn record_batch(&self, label: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_batch(label);
        }
    }
}

impl std::fmt::Debug for BatchProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchProcessor")
            .field("config", &self.config)
            .field("state", &self.state())
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// Invoke the progress callback, containing any panic it raises
fn notify(on_progress: Option<&ProgressCallback>, progress: &BatchProgress) {
    let Some(callback) = on_progress else {
        return;
    };
    if catch_unwind(AssertUnwindSafe(|| callback(progress))).is_err() {
        warn!(
            current_item = ?progress.current_item,
            "Progress callback panicked; continuing batch"
        );
    }
}

/// Score a single item. Never fails: every fault becomes a failed result.
async fn process_item(item: BatchItem, ctx: &ItemContext) -> (BatchResult, &'static str) {
    if ctx.cancelled.load(Ordering::SeqCst) {
        debug!(item_id = %item.id, "Skipping item after cancellation");
        return (
            BatchResult::failed(item.id, CANCELLED_ERROR, 0.0),
            outcome::CANCELLED,
        );
    }

    if item.content.trim().is_empty() {
        return (
            BatchResult::failed(item.id, EMPTY_CONTENT_ERROR, 0.0),
            outcome::FAILED,
        );
    }

    let frameworks = match item.frameworks {
        Some(list) if !list.is_empty() => list,
        _ => ctx.default_frameworks.as_ref().clone(),
    };

    let start = Instant::now();
    let scorer = ctx.scorer.clone();
    let content = item.content;
    let requested = frameworks.clone();
    // Owned by this task: a panicking scorer surfaces as a JoinError, and
    // aborting the item task drops the set, which aborts the scorer too
    let mut scoring = JoinSet::new();
    scoring.spawn(async move { scorer.score(&content, &requested).await });
    let scored = scoring.join_next().await;
    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

    match scored {
        Some(Ok(Ok(data))) => (
            BatchResult::succeeded(item.id, data, elapsed_ms, frameworks.len()),
            outcome::SUCCESS,
        ),
        Some(Ok(Err(e))) => {
            error!(item_id = %item.id, error = %e, "Item scoring failed");
            (
                BatchResult::failed(item.id, e.to_string(), elapsed_ms),
                outcome::FAILED,
            )
        }
        Some(Err(e)) => {
            error!(item_id = %item.id, error = %e, "Item scoring task failed");
            (
                BatchResult::failed(
                    item.id,
                    format!("Task collection error: {}", e),
                    elapsed_ms,
                ),
                outcome::FAILED,
            )
        }
        None => (
            BatchResult::failed(item.id, "Task collection error: no scoring task", elapsed_ms),
            outcome::FAILED,
        ),
    }
}

// =============================================================================
// Tests
// =============================================================================
