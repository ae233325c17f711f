//! OSP Core CLI
//!
//! Command-line front end for the content cache and batch analysis core.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                            osp-core                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  batch <files>  ──▶ BatchAnalysisManager ──▶ FrameworkRegistry  │
//! │  cache <action> ──▶ CacheManager ──▶ snapshot file              │
//! │  resource <name> ─▶ CachedResources ──▶ resource directory      │
//! │  config         ──▶ effective settings + warnings               │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use osp_marketing_core::batch::{BatchAnalysisManager, ContentItem, ContentRecord};
use osp_marketing_core::cache::{CacheHealthReport, CacheManager, DEFAULT_CACHE};
use osp_marketing_core::config::{BatchConfig, CacheConfig};
use osp_marketing_core::error::{Error, Result};
use osp_marketing_core::metrics::Metrics;
use osp_marketing_core::resources::{CachedResources, DirResourceReader, ResourceReader};
use osp_marketing_core::scoring::{FrameworkRegistry, TextStatistics};

// =============================================================================
// CLI Arguments
// =============================================================================

/// OSP Core - content cache and batch analysis
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Maximum entries per cache
    #[arg(long, env = "OSP_CACHE_SIZE", default_value = "50")]
    cache_size: usize,

    /// Cache entry TTL in seconds
    #[arg(long, env = "OSP_CACHE_TTL", default_value = "3600")]
    cache_ttl: u64,

    /// Persist cache snapshots to disk
    #[arg(long, env = "OSP_CACHE_PERSIST")]
    cache_persist: bool,

    /// Snapshot file for the default cache
    #[arg(long, env = "OSP_CACHE_PATH")]
    cache_path: Option<PathBuf>,

    /// Maximum items per batch
    #[arg(long, env = "OSP_BATCH_MAX_SIZE", default_value = "10")]
    batch_max_size: usize,

    /// Items scored concurrently
    #[arg(long, env = "OSP_BATCH_WORKERS", default_value = "4")]
    batch_workers: usize,

    /// Batch deadline in seconds
    #[arg(long, env = "OSP_BATCH_TIMEOUT", default_value = "300")]
    batch_timeout: u64,

    /// Resource file size limit in megabytes
    #[arg(long, env = "OSP_MAX_FILE_SIZE_MB", default_value = "10")]
    max_file_size_mb: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "OSP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "OSP_LOG_JSON")]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze files as one batch and print the report
    Batch {
        /// Files to analyze, one item each
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Batch identifier (random when omitted)
        #[arg(long)]
        batch_id: Option<String>,

        /// Comma-separated frameworks (defaults to every registered one)
        #[arg(long, value_delimiter = ',')]
        frameworks: Option<Vec<String>>,

        /// Priority applied to every item
        #[arg(long, default_value_t = 0)]
        priority: i64,

        /// Print Prometheus metrics after the report
        #[arg(long)]
        metrics: bool,
    },

    /// Inspect or maintain a cache
    Cache {
        /// Cache name
        #[arg(long, default_value = DEFAULT_CACHE)]
        name: String,

        #[command(subcommand)]
        action: CacheAction,
    },

    /// Read a resource file through the cache
    Resource {
        /// File name inside the resource directory
        name: String,

        /// Resource directory
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },

    /// Print effective configuration and warnings
    Config,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum CacheAction {
    /// Hit/miss counters and occupancy
    Stats,
    /// Per-entry diagnostics in LRU order
    Entries,
    /// Remove expired entries
    Cleanup,
    /// Remove every entry
    Clear,
    /// Efficiency classification and recommendations
    Health,
}

impl Args {
    fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            max_size: self.cache_size,
            ttl: Duration::from_secs(self.cache_ttl),
            enable_persistence: self.cache_persist,
            persistence_path: self.cache_path.clone(),
        }
    }

    fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            max_batch_size: self.batch_max_size,
            parallel_workers: self.batch_workers,
            timeout: Duration::from_secs(self.batch_timeout),
            ..Default::default()
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let cache_config = args.cache_config();
    let batch_config = args.batch_config();
    for warning in cache_config.warnings().into_iter().chain(batch_config.warnings()) {
        warn!("{}", warning);
    }

    match &args.command {
        Command::Batch {
            files,
            batch_id,
            frameworks,
            priority,
            metrics,
        } => {
            run_batch(
                batch_config,
                files,
                batch_id.clone(),
                frameworks.clone(),
                *priority,
                *metrics,
            )
            .await
        }
        Command::Cache { name, action } => run_cache(cache_config, name, *action),
        Command::Resource { name, dir } => {
            let manager = CacheManager::new(cache_config)?;
            let reader = DirResourceReader::new(dir)
                .with_max_file_size(args.max_file_size_mb * 1024 * 1024);
            let resources = CachedResources::from_manager(reader, &manager);
            println!("{}", resources.read(name).await?);
            Ok(())
        }
        Command::Config => print_json(&json!({
            "cache": {
                "max_size": cache_config.max_size,
                "ttl_seconds": cache_config.ttl.as_secs(),
                "enable_persistence": cache_config.enable_persistence,
                "persistence_path": cache_config.persistence_path,
            },
            "batch": {
                "max_batch_size": batch_config.max_batch_size,
                "parallel_workers": batch_config.parallel_workers,
                "timeout_seconds": batch_config.timeout.as_secs(),
                "default_frameworks": batch_config.default_frameworks,
                "history_limit": batch_config.history_limit,
            },
            "max_file_size_mb": args.max_file_size_mb,
            "log_level": args.log_level,
            "warnings": cache_config.warnings().into_iter().chain(batch_config.warnings()).collect::<Vec<_>>(),
        })),
    }
}

async fn run_batch(
    mut config: BatchConfig,
    files: &[PathBuf],
    batch_id: Option<String>,
    frameworks: Option<Vec<String>>,
    priority: i64,
    show_metrics: bool,
) -> Result<()> {
    let registry = FrameworkRegistry::new().with(TextStatistics);
    config.default_frameworks = registry.names();

    let mut items = Vec::with_capacity(files.len());
    for path in files {
        let content = tokio::fs::read_to_string(path).await?;
        items.push(ContentItem::Record(ContentRecord {
            id: Some(path.display().to_string()),
            content: Some(content),
            ..Default::default()
        }));
    }

    let metrics = Metrics::new()?;
    let manager =
        BatchAnalysisManager::new(config, Arc::new(registry))?.with_metrics(metrics.clone());

    let batch_id = batch_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!(batch_id = %batch_id, files = files.len(), "Running batch");

    let report = manager
        .submit_items(&batch_id, items, frameworks, priority)
        .await?;
    print_json(&report)?;

    if show_metrics {
        print!("{}", metrics.gather_text()?);
    }
    Ok(())
}

fn run_cache(config: CacheConfig, name: &str, action: CacheAction) -> Result<()> {
    let manager = CacheManager::new(config)?;
    let cache = manager.get_cache(name);

    match action {
        CacheAction::Stats => print_json(&cache.get_stats()),
        CacheAction::Entries => print_json(&cache.get_entries_info()),
        CacheAction::Cleanup => print_json(&json!({ "removed": cache.cleanup_expired() })),
        CacheAction::Clear => {
            let removed = cache.len();
            cache.clear();
            print_json(&json!({ "removed": removed }))
        }
        CacheAction::Health => print_json(&CacheHealthReport::from_stats(cache.get_stats())),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(Error::from)?;
    println!("{}", text);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    // Logs go to stderr so stdout stays machine-readable
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
