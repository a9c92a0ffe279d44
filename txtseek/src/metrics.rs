use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

use crate::search::processor::{LARGE_FILE_THRESHOLD, SMALL_FILE_THRESHOLD};

/// Tracks memory usage of the scan buffers and mapped files.
///
/// Clones share the underlying counters, so one instance can be handed to
/// every worker and read back after the run. The peak value feeds the
/// run summary's memory line.
#[derive(Debug, Clone)]
pub struct MemoryMetrics {
    // Memory usage metrics
    buffer_allocated: Arc<AtomicU64>,
    mmap_allocated: Arc<AtomicU64>,
    peak_usage: Arc<AtomicU64>,

    // Matcher cache metrics
    cache_hits: Arc<AtomicU64>,
    cache_misses: Arc<AtomicU64>,

    // File processing metrics
    small_files_processed: Arc<AtomicU64>,
    buffered_files_processed: Arc<AtomicU64>,
    mmap_files_processed: Arc<AtomicU64>,
}

impl MemoryMetrics {
    /// Creates a new MemoryMetrics instance
    pub fn new() -> Self {
        Self {
            buffer_allocated: Arc::new(AtomicU64::new(0)),
            mmap_allocated: Arc::new(AtomicU64::new(0)),
            peak_usage: Arc::new(AtomicU64::new(0)),
            cache_hits: Arc::new(AtomicU64::new(0)),
            cache_misses: Arc::new(AtomicU64::new(0)),
            small_files_processed: Arc::new(AtomicU64::new(0)),
            buffered_files_processed: Arc::new(AtomicU64::new(0)),
            mmap_files_processed: Arc::new(AtomicU64::new(0)),
        }
    }

    fn update_peak(&self) {
        let current = self.buffer_allocated.load(Ordering::Relaxed)
            + self.mmap_allocated.load(Ordering::Relaxed);
        let mut peak = self.peak_usage.load(Ordering::Relaxed);
        while current > peak {
            match self.peak_usage.compare_exchange_weak(
                peak,
                current,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(observed) => peak = observed,
            }
        }
    }

    /// Records allocation of a read buffer
    pub fn record_allocation(&self, bytes: u64) {
        let total = self.buffer_allocated.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.update_peak();
        debug!("Buffer allocated: {} bytes, total: {} bytes", bytes, total);
    }

    /// Records release of a read buffer
    pub fn record_deallocation(&self, bytes: u64) {
        self.buffer_allocated.fetch_sub(bytes, Ordering::Relaxed);
    }

    /// Records a memory-mapped file view
    pub fn record_mmap(&self, bytes: u64) {
        let total = self.mmap_allocated.fetch_add(bytes, Ordering::Relaxed) + bytes;
        self.update_peak();
        debug!(
            "Memory mapped: {} bytes, total mapped: {} bytes",
            bytes, total
        );
    }

    /// Records unmapping of a file view
    pub fn record_munmap(&self, bytes: u64) {
        self.mmap_allocated.fetch_sub(bytes, Ordering::Relaxed);
    }

    /// Records a matcher cache lookup
    pub fn record_cache_lookup(&self, hit: bool) {
        if hit {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.cache_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Records which strategy a file of the given size was scanned with
    pub fn record_file_processing(&self, size: u64) {
        if size < SMALL_FILE_THRESHOLD {
            self.small_files_processed.fetch_add(1, Ordering::Relaxed);
        } else if size >= LARGE_FILE_THRESHOLD {
            self.mmap_files_processed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.buffered_files_processed
                .fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Peak bytes held in buffers and maps so far
    pub fn peak_usage(&self) -> u64 {
        self.peak_usage.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.cache_misses.load(Ordering::Relaxed)
    }

    /// Gets current memory usage statistics
    pub fn get_stats(&self) -> MemoryStats {
        MemoryStats {
            buffer_allocated: self.buffer_allocated.load(Ordering::Relaxed),
            mmap_allocated: self.mmap_allocated.load(Ordering::Relaxed),
            peak_usage: self.peak_usage.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            small_files: self.small_files_processed.load(Ordering::Relaxed),
            buffered_files: self.buffered_files_processed.load(Ordering::Relaxed),
            mmap_files: self.mmap_files_processed.load(Ordering::Relaxed),
        }
    }

    /// Logs current memory usage statistics
    pub fn log_stats(&self) {
        let stats = self.get_stats();
        info!(
            "Memory usage stats:\n\
             Buffers allocated: {} bytes\n\
             Memory mapped: {} bytes\n\
             Peak usage: {} bytes\n\
             Cache hits/misses: {}/{}\n\
             Files processed (small/buffered/mmap): {}/{}/{}",
            stats.buffer_allocated,
            stats.mmap_allocated,
            stats.peak_usage,
            stats.cache_hits,
            stats.cache_misses,
            stats.small_files,
            stats.buffered_files,
            stats.mmap_files
        );
    }
}

impl Default for MemoryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of the memory metrics
#[derive(Debug, Clone, Copy)]
pub struct MemoryStats {
    pub buffer_allocated: u64,
    pub mmap_allocated: u64,
    pub peak_usage: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub small_files: u64,
    pub buffered_files: u64,
    pub mmap_files: u64,
}
