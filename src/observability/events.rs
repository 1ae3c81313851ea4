//! Observable index events
//!
//! Events are explicit and typed; the string form is what appears in the
//! `event` field of a log line.

use std::fmt;

/// Observable events in the index lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Index opened for a data root
    IndexOpen,
    /// Index closed, scheduler stopped
    IndexClosed,
    /// Leftover bucket files from an earlier run removed
    ScratchCleanup,

    // Scan cycle
    /// Scan cycle started
    ScanBegin,
    /// Scan cycle finished
    ScanComplete,
    /// A data file was decoded and added to its buckets
    FileIndexed,
    /// A candidate file could not be decoded
    FileSkipped,
    /// Directory traversal failed below some path
    ScanWalkError,
    /// The per-cycle log file could not be created
    ScanLogUnavailable,

    // Buckets
    /// A new day bucket was created
    BucketCreated,
    /// A bucket failed to deserialize and was treated as empty
    BucketCorrupt,
    /// A bucket could not be verified and was reset to empty
    BucketReset,
    /// An append to a bucket failed
    BucketAppendFailed,

    // Queries
    /// Query rejected before touching any bucket
    QueryRejected,
}

impl Event {
    /// Returns the event name used in log lines
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::IndexOpen => "INDEX_OPEN",
            Event::IndexClosed => "INDEX_CLOSED",
            Event::ScratchCleanup => "SCRATCH_CLEANUP",
            Event::ScanBegin => "SCAN_BEGIN",
            Event::ScanComplete => "SCAN_COMPLETE",
            Event::FileIndexed => "FILE_INDEXED",
            Event::FileSkipped => "FILE_SKIPPED",
            Event::ScanWalkError => "SCAN_WALK_ERROR",
            Event::ScanLogUnavailable => "SCAN_LOG_UNAVAILABLE",
            Event::BucketCreated => "BUCKET_CREATED",
            Event::BucketCorrupt => "BUCKET_CORRUPT",
            Event::BucketReset => "BUCKET_RESET",
            Event::BucketAppendFailed => "BUCKET_APPEND_FAILED",
            Event::QueryRejected => "QUERY_REJECTED",
        }
    }

    /// Whether the event signals a recovered failure
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            Event::FileSkipped
                | Event::ScanWalkError
                | Event::ScanLogUnavailable
                | Event::BucketCorrupt
                | Event::BucketReset
                | Event::BucketAppendFailed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
