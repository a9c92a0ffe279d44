use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use std::sync::Arc;

use crate::metrics::MemoryMetrics;

static MATCHER_CACHE: Lazy<DashMap<String, Arc<Regex>>> = Lazy::new(DashMap::new);

/// Literal byte matcher for one query string.
///
/// The query is escaped before compilation, so it is always matched as an
/// exact byte sequence and never interpreted as a pattern language. Matching
/// runs over raw file bytes, which keeps reported positions in file-byte
/// space regardless of how the file decodes. Compiled matchers are cached
/// globally, keyed by the query.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    regex: Arc<Regex>,
    metrics: Arc<MemoryMetrics>,
}

impl QueryMatcher {
    /// Creates a matcher for the given query
    pub fn new(query: &str) -> Self {
        Self::with_metrics(query, Arc::new(MemoryMetrics::new()))
    }

    /// Creates a matcher that records cache lookups on the given metrics
    pub fn with_metrics(query: &str, metrics: Arc<MemoryMetrics>) -> Self {
        let regex = if let Some(entry) = MATCHER_CACHE.get(query) {
            metrics.record_cache_lookup(true);
            entry.clone()
        } else {
            let compiled = Arc::new(
                Regex::new(&regex::escape(query)).expect("escaped literal always compiles"),
            );
            metrics.record_cache_lookup(false);
            MATCHER_CACHE.insert(query.to_string(), compiled.clone());
            compiled
        };

        Self { regex, metrics }
    }

    /// Gets the metrics this matcher records to
    pub fn metrics(&self) -> &Arc<MemoryMetrics> {
        &self.metrics
    }

    /// Finds all non-overlapping occurrences of the query, left to right.
    ///
    /// Returned as `(start, end)` byte offsets, position-ascending. The
    /// regex engine advances past each match, so overlapping occurrences
    /// of the same substring are never double-counted.
    pub fn find_matches(&self, haystack: &[u8]) -> Vec<(usize, usize)> {
        self.regex
            .find_iter(haystack)
            .map(|m| (m.start(), m.end()))
            .collect()
    }
}
