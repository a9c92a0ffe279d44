use memmap2::Mmap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{trace, warn};

use super::matcher::QueryMatcher;
use crate::errors::{SearchError, SearchResult};
use crate::metrics::MemoryMetrics;
use crate::results::{MatchRecord, ScanOutcome, ScanTarget};

// Constants for file processing
const BUFFER_CAPACITY: usize = 65536;
pub(crate) const SMALL_FILE_THRESHOLD: u64 = 32 * 1024; // 32KB
pub(crate) const LARGE_FILE_THRESHOLD: u64 = 10 * 1024 * 1024; // 10MB

/// Bytes of context captured either side of a match, clipped at file bounds.
pub const CONTEXT_BYTES: usize = 50;

/// Scans individual targets for occurrences of the query.
///
/// A scan never fails the run: open, read and mapping errors all come back
/// as `ScanOutcome::Failure` for the aggregator to count. The backing
/// strategy is chosen by file size; callers cannot observe which one ran.
#[derive(Debug, Clone)]
pub struct FileScanner {
    matcher: QueryMatcher,
    metrics: MemoryMetrics,
}

impl FileScanner {
    /// Creates a new FileScanner with the given matcher. The scanner
    /// records onto the matcher's metrics so one run has one set of
    /// counters.
    pub fn new(matcher: QueryMatcher) -> Self {
        let metrics = matcher.metrics().as_ref().clone();
        Self { matcher, metrics }
    }

    /// Gets the current memory metrics
    pub fn metrics(&self) -> &MemoryMetrics {
        &self.metrics
    }

    /// Builds match records with their context windows from the raw bytes.
    ///
    /// Context is up to `CONTEXT_BYTES` before the match start and after the
    /// match end, clipped at the file boundaries. The window may split a
    /// multi-byte sequence at either edge; lossy decoding replaces whatever
    /// does not decode, the scan never aborts on malformed encoding.
    fn collect_matches(&self, path: &Path, bytes: &[u8]) -> Vec<MatchRecord> {
        self.matcher
            .find_matches(bytes)
            .into_iter()
            .map(|(start, end)| {
                let window_start = start.saturating_sub(CONTEXT_BYTES);
                let window_end = (end + CONTEXT_BYTES).min(bytes.len());
                let context = String::from_utf8_lossy(&bytes[window_start..window_end])
                    .trim()
                    .to_string();

                MatchRecord {
                    path: path.to_path_buf(),
                    position: start,
                    context,
                }
            })
            .collect()
    }

    fn open_file(path: &Path) -> SearchResult<File> {
        File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SearchError::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => SearchError::permission_denied(path),
            _ => SearchError::IoError(e),
        })
    }

    /// Scan a small file by reading it whole
    fn scan_whole_file(&self, path: &Path) -> SearchResult<Vec<MatchRecord>> {
        trace!("Using whole-file read for: {}", path.display());

        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => SearchError::file_not_found(path),
            std::io::ErrorKind::PermissionDenied => SearchError::permission_denied(path),
            _ => SearchError::IoError(e),
        })?;

        self.metrics.record_allocation(bytes.len() as u64);
        let matches = self.collect_matches(path, &bytes);
        self.metrics.record_deallocation(bytes.len() as u64);

        Ok(matches)
    }

    /// Scan a file through a buffered reader
    fn scan_buffered_file(&self, path: &Path) -> SearchResult<Vec<MatchRecord>> {
        trace!("Using buffered read for: {}", path.display());

        let file = Self::open_file(path)?;
        let mut reader = BufReader::with_capacity(BUFFER_CAPACITY, file);
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(SearchError::IoError)?;

        self.metrics.record_allocation(bytes.len() as u64);
        let matches = self.collect_matches(path, &bytes);
        self.metrics.record_deallocation(bytes.len() as u64);

        Ok(matches)
    }

    /// Scan a large file through a zero-copy memory map
    fn scan_mmap_file(&self, path: &Path) -> SearchResult<Vec<MatchRecord>> {
        trace!("Using memory map for: {}", path.display());

        let file = Self::open_file(path)?;
        let mmap = unsafe { Mmap::map(&file) }.map_err(SearchError::IoError)?;

        self.metrics.record_mmap(mmap.len() as u64);
        let matches = self.collect_matches(path, &mmap);
        self.metrics.record_munmap(mmap.len() as u64);

        Ok(matches)
    }

    /// Scans one target, producing exactly one outcome.
    ///
    /// Matches come back position-ascending. Any I/O failure is folded into
    /// a `Failure` outcome carrying the path and a readable message; it must
    /// not terminate sibling scans.
    pub fn scan(&self, target: &ScanTarget) -> ScanOutcome {
        trace!("Scanning file: {}", target.path.display());
        self.metrics.record_file_processing(target.size);

        let result = if target.size < SMALL_FILE_THRESHOLD {
            self.scan_whole_file(&target.path)
        } else if target.size >= LARGE_FILE_THRESHOLD {
            self.scan_mmap_file(&target.path)
        } else {
            self.scan_buffered_file(&target.path)
        };

        match result {
            Ok(matches) => ScanOutcome::Success {
                path: target.path.clone(),
                matches,
            },
            Err(e) => {
                warn!("Failed to scan {}: {}", target.path.display(), e);
                ScanOutcome::Failure {
                    path: target.path.clone(),
                    message: e.to_string(),
                }
            }
        }
    }
}
