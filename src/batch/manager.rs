//! Batch Analysis Manager
//!
//! Front door for batch submissions: normalizes raw content, runs each
//! submission on a fresh [`BatchProcessor`], tracks in-flight batches for
//! cancellation, and keeps a bounded history of finished runs.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use super::input::{self, ContentItem, SubmissionDefaults};
use super::processor::BatchProcessor;
use super::types::{BatchItem, BatchReport, BatchSummary};
use crate::config::BatchConfig;
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::scoring::ContentScorer;

/// Default number of entries returned by [`BatchAnalysisManager::get_batch_history`]
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Compact record of one finished batch
#[derive(Debug, Clone, Serialize)]
pub struct BatchRecord {
    pub batch_id: String,
    pub timestamp: DateTime<Utc>,
    pub summary: BatchSummary,
    pub success: bool,
    pub timed_out: bool,
}

/// Removes a batch from the active set when dropped
struct ActiveGuard<'a> {
    active: &'a DashMap<String, Arc<BatchProcessor>>,
    batch_id: &'a str,
}

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.active.remove(self.batch_id);
    }
}

/// Runs batch submissions and remembers their outcomes
pub struct BatchAnalysisManager {
    config: BatchConfig,
    scorer: Arc<dyn ContentScorer>,
    /// In-flight batches by id
    active: DashMap<String, Arc<BatchProcessor>>,
    history: Mutex<VecDeque<BatchRecord>>,
    metrics: Option<Metrics>,
}

impl BatchAnalysisManager {
    /// Create a manager after validating `config`
    pub fn new(config: BatchConfig, scorer: Arc<dyn ContentScorer>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            scorer,
            active: DashMap::new(),
            history: Mutex::new(VecDeque::new()),
            metrics: None,
        })
    }

    /// Pass `metrics` to every processor this manager creates
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Normalize raw JSON content and run it as one batch.
    ///
    /// Strings become items with id `{batch_id}_item_{index}`; objects may
    /// set `id`, `content`, `frameworks`, `metadata` and `priority`.
    ///
    /// # Errors
    ///
    /// Fails before any work starts on a malformed content item, an
    /// oversized batch, duplicate item ids, or a `batch_id` that is
    /// already running.
    pub async fn submit_batch(
        &self,
        batch_id: &str,
        content_items: Vec<Value>,
        default_frameworks: Option<Vec<String>>,
        priority: i64,
    ) -> Result<BatchReport> {
        let items = input::normalize_values(
            batch_id,
            content_items,
            SubmissionDefaults {
                frameworks: default_frameworks.as_deref(),
                priority,
            },
        )?;
        self.run(batch_id, items).await
    }

    /// Typed counterpart of [`submit_batch`](Self::submit_batch)
    pub async fn submit_items(
        &self,
        batch_id: &str,
        content_items: Vec<ContentItem>,
        default_frameworks: Option<Vec<String>>,
        priority: i64,
    ) -> Result<BatchReport> {
        let items = input::normalize(
            batch_id,
            content_items,
            SubmissionDefaults {
                frameworks: default_frameworks.as_deref(),
                priority,
            },
        );
        self.run(batch_id, items).await
    }

    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn run(&self, batch_id: &str, items: Vec<BatchItem>) -> Result<BatchReport> {
        let mut processor = BatchProcessor::new(self.config.clone(), self.scorer.clone())?;
        if let Some(metrics) = &self.metrics {
            processor = processor.with_metrics(metrics.clone());
        }
        let processor = Arc::new(processor);

        match self.active.entry(batch_id.to_string()) {
            Entry::Occupied(_) => {
                return Err(Error::BatchInProgress {
                    batch_id: batch_id.to_string(),
                })
            }
            Entry::Vacant(slot) => {
                slot.insert(processor.clone());
            }
        }
        let _guard = ActiveGuard {
            active: &self.active,
            batch_id,
        };

        info!(batch_id, "Batch submitted");
        let report = processor.process_batch(items, None).await?;

        self.push_history(BatchRecord {
            batch_id: batch_id.to_string(),
            timestamp: Utc::now(),
            summary: report.summary.clone(),
            success: report.success,
            timed_out: report.timed_out,
        });

        Ok(report)
    }

    fn push_history(&self, record: BatchRecord) {
        let mut history = self.history.lock();
        history.push_back(record);
        while history.len() > self.config.history_limit {
            history.pop_front();
        }
    }

    /// Ids of batches currently running, sorted
    pub fn get_active_batches(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.active.iter().map(|e| e.key().clone()).collect();
        ids.sort();
        ids
    }

    /// Request cooperative cancellation; false if `batch_id` is not running
    pub fn cancel_batch(&self, batch_id: &str) -> bool {
        match self.active.get(batch_id) {
            Some(processor) => {
                processor.cancel_processing();
                info!(batch_id, "Batch cancelled");
                true
            }
            None => {
                warn!(batch_id, "Cancel requested for unknown batch");
                false
            }
        }
    }

    /// Most recent `limit` records, newest last
    pub fn get_batch_history(&self, limit: usize) -> Vec<BatchRecord> {
        let history = self.history.lock();
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }
}

impl std::fmt::Debug for BatchAnalysisManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchAnalysisManager")
            .field("config", &self.config)
            .field("active", &self.get_active_batches())
            .field("history_len", &self.history.lock().len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::processor::CANCELLED_ERROR;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    struct SlowScorer(Duration);

    #[async_trait]
    impl ContentScorer for SlowScorer {
        async fn score(&self, content: &str, frameworks: &[String]) -> anyhow::Result<Value> {
            tokio::time::sleep(self.0).await;
            Ok(json!({ "length": content.len(), "frameworks": frameworks.len() }))
        }
    }

    fn manager(delay_ms: u64) -> BatchAnalysisManager {
        BatchAnalysisManager::new(
            BatchConfig::default(),
            Arc::new(SlowScorer(Duration::from_millis(delay_ms))),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_submit_mixed_content() {
        let manager = manager(0);
        let report = manager
            .submit_batch(
                "b1",
                vec![json!("plain text"), json!({"id": "rec", "content": "record"})],
                Some(vec!["IDEAL".into()]),
                0,
            )
            .await
            .unwrap();

        assert!(report.success);
        assert!(report.result_for("b1_item_0").unwrap().success);
        assert_eq!(report.result_for("rec").unwrap().framework_count, 1);
        assert!(manager.get_active_batches().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_item_rejected() {
        let manager = manager(0);
        let err = manager
            .submit_batch("bad", vec![json!(["nested"])], None, 0)
            .await
            .unwrap_err();

        assert_matches!(err, Error::InvalidContentItem(_));
        assert!(manager.get_batch_history(10).is_empty());
    }

    #[tokio::test]
    async fn test_validation_failure_cleans_active_set() {
        let manager = manager(0);
        let values: Vec<Value> = (0..11).map(|i| json!(format!("text {}", i))).collect();

        let err = manager.submit_batch("big", values, None, 0).await.unwrap_err();

        assert_matches!(err, Error::BatchTooLarge { size: 11, max: 10 });
        assert!(manager.get_active_batches().is_empty());
    }

    #[tokio::test]
    async fn test_history_newest_last() {
        let manager = manager(0);
        for i in 0..3 {
            manager
                .submit_items(&format!("b{}", i), vec!["text".into()], None, 0)
                .await
                .unwrap();
        }

        let history = manager.get_batch_history(2);
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].batch_id, "b1");
        assert_eq!(history[1].batch_id, "b2");
        assert!(history[1].success);
        assert_eq!(history[1].summary.total_items, 1);
    }

    #[tokio::test]
    async fn test_history_is_capped() {
        let config = BatchConfig {
            history_limit: 2,
            ..Default::default()
        };
        let manager =
            BatchAnalysisManager::new(config, Arc::new(SlowScorer(Duration::ZERO))).unwrap();

        for i in 0..5 {
            manager
                .submit_items(&format!("b{}", i), vec!["x".into()], None, 0)
                .await
                .unwrap();
        }

        let history = manager.get_batch_history(DEFAULT_HISTORY_LIMIT);
        let ids: Vec<_> = history.iter().map(|r| r.batch_id.as_str()).collect();
        assert_eq!(ids, vec!["b3", "b4"]);
    }

    #[tokio::test]
    async fn test_active_tracking_and_cancel() {
        let config = BatchConfig {
            parallel_workers: 1,
            ..Default::default()
        };
        let manager = Arc::new(
            BatchAnalysisManager::new(config, Arc::new(SlowScorer(Duration::from_millis(200))))
                .unwrap(),
        );

        let runner = manager.clone();
        let handle = tokio::spawn(async move {
            runner
                .submit_items("slow", vec!["a".into(), "b".into(), "c".into()], None, 0)
                .await
        });

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(manager.get_active_batches(), vec!["slow"]);
        assert!(manager.cancel_batch("slow"));
        assert!(!manager.cancel_batch("missing"));

        let report = handle.await.unwrap().unwrap();
        // the first item was already running and completes
        assert_eq!(report.summary.successful_items, 1);
        assert_eq!(
            report
                .results
                .iter()
                .filter(|r| r.error.as_deref() == Some(CANCELLED_ERROR))
                .count(),
            2
        );
        assert!(manager.get_active_batches().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_active_id_rejected() {
        let manager = Arc::new(manager(200));

        let runner = manager.clone();
        let handle =
            tokio::spawn(async move { runner.submit_items("dup", vec!["a".into()], None, 0).await });

        tokio::time::sleep(Duration::from_millis(50)).await;
        let err = manager
            .submit_items("dup", vec!["b".into()], None, 0)
            .await
            .unwrap_err();
        assert_matches!(err, Error::BatchInProgress { batch_id } if batch_id == "dup");

        assert!(handle.await.unwrap().unwrap().success);
    }
}
