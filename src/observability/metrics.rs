//! Index counters
//!
//! - Counters only, monotonic
//! - Reset only when the index is reopened
//! - Thread-safe, lock-free
//!
//! Cache hit and miss counts live in `BucketCache::stats`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for one index instance.
///
/// Shared between the query path and the background rebuilder. Relaxed
/// ordering is enough: nothing synchronizes through these values.
#[derive(Debug, Default)]
pub struct IndexMetrics {
    scan_cycles: AtomicU64,
    files_indexed: AtomicU64,
    files_skipped: AtomicU64,
    buckets_created: AtomicU64,
    buckets_reset: AtomicU64,
    corrupt_reads: AtomicU64,
    queries: AtomicU64,
    queries_rejected: AtomicU64,
}

impl IndexMetrics {
    /// Create a registry with every counter at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_scan_cycles(&self) {
        self.scan_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_files_indexed(&self) {
        self.files_indexed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_files_skipped(&self) {
        self.files_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_buckets_created(&self) {
        self.buckets_created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_buckets_reset(&self) {
        self.buckets_reset.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_corrupt_reads(&self) {
        self.corrupt_reads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries(&self) {
        self.queries.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_queries_rejected(&self) {
        self.queries_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            scan_cycles: self.scan_cycles.load(Ordering::Relaxed),
            files_indexed: self.files_indexed.load(Ordering::Relaxed),
            files_skipped: self.files_skipped.load(Ordering::Relaxed),
            buckets_created: self.buckets_created.load(Ordering::Relaxed),
            buckets_reset: self.buckets_reset.load(Ordering::Relaxed),
            corrupt_reads: self.corrupt_reads.load(Ordering::Relaxed),
            queries: self.queries.load(Ordering::Relaxed),
            queries_rejected: self.queries_rejected.load(Ordering::Relaxed),
        }
    }

    /// Snapshot rendered as a single JSON object
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub scan_cycles: u64,
    pub files_indexed: u64,
    pub files_skipped: u64,
    pub buckets_created: u64,
    pub buckets_reset: u64,
    pub corrupt_reads: u64,
    pub queries: u64,
    pub queries_rejected: u64,
}
