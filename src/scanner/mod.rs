//! Directory scanner
//!
//! A scan cycle has two passes:
//!
//! 1. Verify: every known bucket drops records whose file has vanished.
//! 2. Scan: the data root is walked recursively; each file with a data
//!    suffix is decoded and filed under every UTC day it spans, and its
//!    monitor is added to the [`MonitorSet`].
//!
//! [`ScanScheduler`] repeats cycles on a background thread until stopped.

mod monitor_set;
mod rebuilder;
mod scan_log;
mod scheduler;

pub use monitor_set::MonitorSet;
pub use rebuilder::{is_data_file, Rebuilder, ScanReport, DATA_FILE_SUFFIXES};
pub use scheduler::{ScanScheduler, SCHEDULER_THREAD_NAME};
