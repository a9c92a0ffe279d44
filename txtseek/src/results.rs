use std::path::PathBuf;
use std::time::Duration;

/// One file queued for scanning, as enumerated by the catalog.
///
/// Immutable once created; `size` is the size observed at enumeration time.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    /// Path to the file
    pub path: PathBuf,
    /// File size in bytes at enumeration time
    pub size: u64,
}

/// One located occurrence of the query plus its surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// The file the match was found in
    pub path: PathBuf,
    /// Byte offset of the match start within the file
    pub position: usize,
    /// Trimmed window of up to 50 bytes either side of the match,
    /// decoded leniently
    pub context: String,
}

/// The result of scanning exactly one target: either every match found in
/// the file (possibly none), or a failure description. A failing scan is
/// data, not an error; the aggregator counts it and the run continues.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    Success {
        path: PathBuf,
        matches: Vec<MatchRecord>,
    },
    Failure {
        path: PathBuf,
        message: String,
    },
}

impl ScanOutcome {
    /// The target this outcome belongs to
    pub fn path(&self) -> &PathBuf {
        match self {
            ScanOutcome::Success { path, .. } => path,
            ScanOutcome::Failure { path, .. } => path,
        }
    }

    /// Number of matches carried by this outcome (zero for failures)
    pub fn match_count(&self) -> usize {
        match self {
            ScanOutcome::Success { matches, .. } => matches.len(),
            ScanOutcome::Failure { .. } => 0,
        }
    }
}

/// Frozen run statistics, read-only once the run completes.
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Number of targets the catalog enumerated
    pub files_discovered: usize,
    /// Number of targets that produced an outcome
    pub files_processed: usize,
    /// Total matches across all successful outcomes
    pub matches_found: usize,
    /// Number of targets that failed to scan
    pub error_count: usize,
    /// Sum of target sizes at enumeration time
    pub total_bytes: u64,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
    /// Peak bytes held in scan buffers and maps during the run
    pub peak_memory: u64,
}

/// The complete result of one search run.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub stats: RunStats,
    /// All matches, grouped per file in completion order; within one file
    /// the matches are position-ascending
    pub matches: Vec<MatchRecord>,
    /// Human-readable messages for each failed target
    pub errors: Vec<String>,
}

impl SearchReport {
    /// True when the catalog found nothing to scan
    pub fn no_files(&self) -> bool {
        self.stats.files_discovered == 0
    }
}
