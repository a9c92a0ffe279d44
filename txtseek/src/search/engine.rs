use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

use super::matcher::QueryMatcher;
use super::processor::FileScanner;
use crate::aggregator::Aggregator;
use crate::catalog;
use crate::config::SearchConfig;
use crate::errors::{SearchError, SearchResult};
use crate::results::{RunStats, SearchReport};

/// Runs one concurrent search: enumerate targets, fan them out across a
/// bounded worker pool, aggregate every completion, and return the frozen
/// report.
///
/// Per-file scan failures are counted, never raised; the only `Err` cases
/// are an empty query and a worker pool that cannot be built.
pub fn search(config: &SearchConfig) -> SearchResult<SearchReport> {
    if config.query.is_empty() {
        return Err(SearchError::EmptyQuery);
    }

    info!(
        "Starting search for {:?} under {}",
        config.query,
        config.root_path.display()
    );
    let start = Instant::now();

    let catalog = catalog::enumerate(&config.root_path, &config.extension);
    if catalog.is_empty() {
        debug!(
            "No .{} files under {}, nothing to scan",
            config.extension,
            config.root_path.display()
        );
        return Ok(SearchReport {
            stats: RunStats {
                elapsed: start.elapsed(),
                ..Default::default()
            },
            ..Default::default()
        });
    }

    let scanner = FileScanner::new(QueryMatcher::new(&config.query));
    let metrics = scanner.metrics().clone();
    let aggregator = Aggregator::new();

    let progress = if config.show_progress {
        let bar = ProgressBar::new(catalog.len() as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} files")
                .unwrap()
                .progress_chars("=>-"),
        );
        Some(bar)
    } else {
        None
    };

    // One scan task per target on a dedicated pool sized to the configured
    // worker ceiling. Completions land in the aggregator in whatever order
    // the workers finish.
    let worker_count = config.effective_thread_count();
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(worker_count)
        .build()
        .map_err(|e| SearchError::config_error(format!("Failed to build worker pool: {}", e)))?;

    debug!(
        "Dispatching {} targets across {} workers",
        catalog.len(),
        worker_count
    );

    pool.install(|| {
        catalog.targets.par_iter().for_each(|target| {
            aggregator.accept(scanner.scan(target));
            if let Some(bar) = &progress {
                bar.inc(1);
            }
        });
    });

    if let Some(bar) = &progress {
        bar.finish_and_clear();
    }

    metrics.log_stats();
    let snapshot = aggregator.into_snapshot();

    let stats = RunStats {
        files_discovered: catalog.len(),
        files_processed: snapshot.files_processed,
        matches_found: snapshot.matches_found,
        error_count: snapshot.error_count,
        total_bytes: catalog.total_bytes,
        elapsed: start.elapsed(),
        peak_memory: metrics.peak_usage(),
    };

    info!(
        "Search complete. {} matches across {} files, {} errors",
        stats.matches_found, stats.files_processed, stats.error_count
    );

    Ok(SearchReport {
        stats,
        matches: snapshot.matches,
        errors: snapshot.errors,
    })
}
