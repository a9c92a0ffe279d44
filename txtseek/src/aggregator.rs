use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tracing::warn;

use crate::results::{MatchRecord, ScanOutcome};

/// Thread-safe accumulation point for scan outcomes.
///
/// Workers race their completions into `accept`; the counters and the match
/// collection always update together, so no outcome is ever half-recorded.
/// Feeding the same outcomes in any order produces the same final counts
/// and match set. The only shared mutable state of a run lives here.
#[derive(Debug, Default)]
pub struct Aggregator {
    matches: Mutex<Vec<MatchRecord>>,
    errors: Mutex<Vec<String>>,
    files_processed: AtomicUsize,
    matches_found: AtomicUsize,
    error_count: AtomicUsize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed target. Called once per target, from any
    /// worker. Every outcome counts as a processed file; failures
    /// additionally bump the error count and keep their message, successes
    /// append their matches en bloc so one file's matches stay contiguous
    /// and position-ascending.
    pub fn accept(&self, outcome: ScanOutcome) {
        self.files_processed.fetch_add(1, Ordering::SeqCst);

        match outcome {
            ScanOutcome::Success { matches, .. } => {
                if !matches.is_empty() {
                    self.matches_found.fetch_add(matches.len(), Ordering::SeqCst);
                    self.matches
                        .lock()
                        .expect("aggregator match lock poisoned")
                        .extend(matches);
                }
            }
            ScanOutcome::Failure { path, message } => {
                warn!("Scan error for {}: {}", path.display(), message);
                self.error_count.fetch_add(1, Ordering::SeqCst);
                self.errors
                    .lock()
                    .expect("aggregator error lock poisoned")
                    .push(format!("{}: {}", path.display(), message));
            }
        }
    }

    /// Number of targets recorded so far
    pub fn files_processed(&self) -> usize {
        self.files_processed.load(Ordering::SeqCst)
    }

    /// Freezes the aggregate. Call only after every target has completed;
    /// the returned data is immutable from here on.
    pub fn into_snapshot(self) -> AggregateSnapshot {
        AggregateSnapshot {
            matches: self
                .matches
                .into_inner()
                .expect("aggregator match lock poisoned"),
            errors: self
                .errors
                .into_inner()
                .expect("aggregator error lock poisoned"),
            files_processed: self.files_processed.into_inner(),
            matches_found: self.matches_found.into_inner(),
            error_count: self.error_count.into_inner(),
        }
    }
}

/// The frozen, read-consistent view of a finished (or interrupted) run.
#[derive(Debug)]
pub struct AggregateSnapshot {
    pub matches: Vec<MatchRecord>,
    pub errors: Vec<String>,
    pub files_processed: usize,
    pub matches_found: usize,
    pub error_count: usize,
}
