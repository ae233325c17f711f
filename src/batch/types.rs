//! Batch data carriers: items, per-item results, progress and reports

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::round_to;

// =============================================================================
// Batch Item
// =============================================================================

/// One piece of content to be scored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Identifier echoed on the result
    pub id: String,

    /// Text payload
    pub content: String,

    /// Frameworks to apply; `None` uses the processor default
    #[serde(default)]
    pub frameworks: Option<Vec<String>>,

    /// Caller metadata, carried through untouched
    #[serde(default)]
    pub metadata: HashMap<String, Value>,

    /// Higher values start earlier
    #[serde(default)]
    pub priority: i64,
}

impl BatchItem {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            frameworks: None,
            metadata: HashMap::new(),
            priority: 0,
        }
    }

    pub fn with_frameworks<I, S>(mut self, frameworks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.frameworks = Some(frameworks.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

// =============================================================================
// Batch Result
// =============================================================================

/// Outcome of scoring one item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub item_id: String,
    pub success: bool,
    /// Present iff `success`
    pub data: Option<Value>,
    /// Present iff not `success`
    pub error: Option<String>,
    pub processing_time_ms: f64,
    pub framework_count: usize,
}

impl BatchResult {
    pub fn succeeded(
        item_id: impl Into<String>,
        data: Value,
        processing_time_ms: f64,
        framework_count: usize,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            success: true,
            data: Some(data),
            error: None,
            processing_time_ms,
            framework_count,
        }
    }

    pub fn failed(
        item_id: impl Into<String>,
        error: impl Into<String>,
        processing_time_ms: f64,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            success: false,
            data: None,
            error: Some(error.into()),
            processing_time_ms,
            framework_count: 0,
        }
    }
}

// =============================================================================
// Progress
// =============================================================================

/// Live counters for a running batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    pub total_items: usize,
    pub completed_items: usize,
    pub failed_items: usize,
    /// Last item observed finishing
    pub current_item: Option<String>,
    pub start_time: DateTime<Utc>,
    pub estimated_completion_time: Option<DateTime<Utc>>,
}

impl BatchProgress {
    pub fn new(total_items: usize) -> Self {
        Self {
            total_items,
            completed_items: 0,
            failed_items: 0,
            current_item: None,
            start_time: Utc::now(),
            estimated_completion_time: None,
        }
    }

    /// Items in a terminal state
    pub fn finished_items(&self) -> usize {
        self.completed_items + self.failed_items
    }

    /// Share of successfully completed items, 100 for an empty batch
    pub fn progress_percentage(&self) -> f64 {
        if self.total_items == 0 {
            return 100.0;
        }
        self.completed_items as f64 / self.total_items as f64 * 100.0
    }

    pub fn elapsed(&self) -> Duration {
        (Utc::now() - self.start_time)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Count one finished item and refresh the completion estimate
    pub fn record(&mut self, result: &BatchResult) {
        if result.success {
            self.completed_items += 1;
        } else {
            self.failed_items += 1;
        }
        self.current_item = Some(result.item_id.clone());
        self.update_estimated_completion();
    }

    /// Project the finish time from the mean time per completed item
    pub fn update_estimated_completion(&mut self) {
        if self.completed_items == 0 {
            return;
        }
        let per_item = self.elapsed().as_secs_f64() / self.completed_items as f64;
        let remaining = self.total_items.saturating_sub(self.completed_items) as f64;
        let eta = chrono::Duration::milliseconds((per_item * remaining * 1000.0) as i64);
        self.estimated_completion_time = Some(Utc::now() + eta);
    }
}

// =============================================================================
// Summary
// =============================================================================

/// Aggregate statistics for a finished batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_items: usize,
    pub successful_items: usize,
    pub failed_items: usize,
    /// Percentage, 0 for an empty batch
    pub success_rate: f64,
    pub total_processing_time_seconds: f64,
    /// Mean over items that reported a non-zero time
    pub average_processing_time_ms: f64,
    /// Frameworks applied across successful items
    pub total_frameworks_processed: usize,
    pub throughput_items_per_second: f64,
}

impl BatchSummary {
    pub fn from_results(results: &[BatchResult], elapsed: Duration) -> Self {
        let total_secs = elapsed.as_secs_f64();
        if results.is_empty() {
            return Self {
                total_processing_time_seconds: round_to(total_secs, 2),
                ..Self::default()
            };
        }

        let total_items = results.len();
        let successful_items = results.iter().filter(|r| r.success).count();

        let timed: Vec<f64> = results
            .iter()
            .map(|r| r.processing_time_ms)
            .filter(|t| *t > 0.0)
            .collect();
        let average_processing_time_ms = if timed.is_empty() {
            0.0
        } else {
            timed.iter().sum::<f64>() / timed.len() as f64
        };

        let total_frameworks_processed = results
            .iter()
            .filter(|r| r.success)
            .map(|r| r.framework_count)
            .sum();

        let throughput = if total_secs > 0.0 {
            total_items as f64 / total_secs
        } else {
            0.0
        };

        Self {
            total_items,
            successful_items,
            failed_items: total_items - successful_items,
            success_rate: round_to(successful_items as f64 / total_items as f64 * 100.0, 2),
            total_processing_time_seconds: round_to(total_secs, 2),
            average_processing_time_ms: round_to(average_processing_time_ms, 2),
            total_frameworks_processed,
            throughput_items_per_second: round_to(throughput, 2),
        }
    }
}

// =============================================================================
// State & Report
// =============================================================================

/// Lifecycle of one batch run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BatchState {
    Idle,
    Validating,
    Running,
    Completed,
    Failed,
    TimedOut,
}

impl BatchState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchState::Completed | BatchState::Failed | BatchState::TimedOut
        )
    }
}

impl std::fmt::Display for BatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchState::Idle => write!(f, "Idle"),
            BatchState::Validating => write!(f, "Validating"),
            BatchState::Running => write!(f, "Running"),
            BatchState::Completed => write!(f, "Completed"),
            BatchState::Failed => write!(f, "Failed"),
            BatchState::TimedOut => write!(f, "TimedOut"),
        }
    }
}

/// Everything a caller learns from one batch run
///
/// `success` is a batch-level flag. Individual item failures leave it
/// `true`; inspect `summary` and `results` for per-item outcomes.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub success: bool,
    pub results: Vec<BatchResult>,
    pub summary: BatchSummary,
    pub progress: BatchProgress,
    pub error: Option<String>,
    pub timed_out: bool,
}

impl BatchReport {
    /// Vacuous success for an empty batch
    pub fn empty() -> Self {
        Self {
            success: true,
            results: Vec::new(),
            summary: BatchSummary::default(),
            progress: BatchProgress::new(0),
            error: None,
            timed_out: false,
        }
    }

    /// Batch-level fault raised during orchestration
    pub fn fault(
        error: impl Into<String>,
        results: Vec<BatchResult>,
        progress: BatchProgress,
    ) -> Self {
        let summary = BatchSummary::from_results(&results, progress.elapsed());
        Self {
            success: false,
            results,
            summary,
            progress,
            error: Some(error.into()),
            timed_out: false,
        }
    }

    /// Result for `item_id`, if the batch produced one
    pub fn result_for(&self, item_id: &str) -> Option<&BatchResult> {
        self.results.iter().find(|r| r.item_id == item_id)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_progress_is_complete() {
        let progress = BatchProgress::new(0);
        assert_eq!(progress.progress_percentage(), 100.0);
        assert_eq!(progress.finished_items(), 0);
    }

    #[test]
    fn test_progress_record() {
        let mut progress = BatchProgress::new(4);
        progress.record(&BatchResult::succeeded("a", json!({}), 5.0, 2));
        progress.record(&BatchResult::failed("b", "boom", 1.0));

        assert_eq!(progress.completed_items, 1);
        assert_eq!(progress.failed_items, 1);
        assert_eq!(progress.current_item.as_deref(), Some("b"));
        assert_eq!(progress.progress_percentage(), 25.0);
        assert!(progress.estimated_completion_time.is_some());
    }

    #[test]
    fn test_no_estimate_without_completions() {
        let mut progress = BatchProgress::new(2);
        progress.record(&BatchResult::failed("a", "boom", 1.0));
        assert!(progress.estimated_completion_time.is_none());
    }

    #[test]
    fn test_summary_statistics() {
        let results = vec![
            BatchResult::succeeded("a", json!(1), 10.0, 2),
            BatchResult::succeeded("b", json!(2), 20.0, 3),
            BatchResult::failed("c", "Empty or invalid content", 0.0),
        ];
        let summary = BatchSummary::from_results(&results, Duration::from_secs(2));

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.successful_items, 2);
        assert_eq!(summary.failed_items, 1);
        assert_eq!(summary.success_rate, 66.67);
        // zero-time results are excluded from the mean
        assert_eq!(summary.average_processing_time_ms, 15.0);
        assert_eq!(summary.total_frameworks_processed, 5);
        assert_eq!(summary.throughput_items_per_second, 1.5);
    }

    #[test]
    fn test_summary_zero_elapsed() {
        let results = vec![BatchResult::failed("a", "x", 0.0)];
        let summary = BatchSummary::from_results(&results, Duration::ZERO);
        assert_eq!(summary.throughput_items_per_second, 0.0);
        assert_eq!(summary.average_processing_time_ms, 0.0);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn test_item_deserialize_defaults() {
        let item: BatchItem =
            serde_json::from_value(json!({"id": "x", "content": "hello"})).unwrap();
        assert_eq!(item, BatchItem::new("x", "hello"));
    }

    #[test]
    fn test_state_display() {
        assert_eq!(BatchState::TimedOut.to_string(), "TimedOut");
        assert!(BatchState::Failed.is_terminal());
        assert!(!BatchState::Running.is_terminal());
    }
}
