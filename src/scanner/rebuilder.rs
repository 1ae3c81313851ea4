//! One scan cycle: verify every known bucket, then walk the data root

use std::any::Any;
use std::ffi::OsStr;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use walkdir::WalkDir;

use super::monitor_set::MonitorSet;
use super::scan_log::ScanLog;
use crate::bucket::BucketStore;
use crate::observability::{Event, IndexMetrics};
use crate::record::RecordDecoder;

/// Extensions a candidate data file may carry, compared case-insensitively
pub const DATA_FILE_SUFFIXES: [&str; 3] = ["dat", "csv", "txt"];

/// Whether a file name looks like a data file
pub fn is_data_file(name: &OsStr) -> bool {
    let name = name.to_string_lossy().to_lowercase();
    DATA_FILE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// What one cycle did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub buckets_verified: usize,
    pub buckets_reset: usize,
    pub records_pruned: usize,
    pub files_seen: usize,
    pub files_indexed: usize,
    pub files_skipped: usize,
    pub append_failures: usize,
    pub walk_errors: usize,
    pub duration: Duration,
}

/// Keeps the bucket store and monitor set in step with the data root.
///
/// Nothing in a cycle fails the cycle: undecodable files are skipped
/// (including ones whose decoder panics), unreadable directories are
/// logged, bad buckets are reset.
pub struct Rebuilder {
    root: PathBuf,
    log_dir: PathBuf,
    decoder: Arc<dyn RecordDecoder>,
    store: Arc<BucketStore>,
    monitors: Arc<MonitorSet>,
    metrics: Arc<IndexMetrics>,
}

impl Rebuilder {
    pub fn new(
        root: impl Into<PathBuf>,
        log_dir: impl Into<PathBuf>,
        decoder: Arc<dyn RecordDecoder>,
        store: Arc<BucketStore>,
        monitors: Arc<MonitorSet>,
        metrics: Arc<IndexMetrics>,
    ) -> Self {
        Self {
            root: root.into(),
            log_dir: log_dir.into(),
            decoder,
            store,
            monitors,
            metrics,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Run one full verify + scan pass
    pub fn run_cycle(&self) -> ScanReport {
        let started = Instant::now();
        let mut log = ScanLog::open(&self.log_dir);
        let root = self.root.display().to_string();
        log.emit(Event::ScanBegin, &[("root", &root)]);

        let mut report = ScanReport::default();
        self.verify_pass(&mut report);
        self.scan_pass(&mut log, &mut report);
        report.duration = started.elapsed();
        self.metrics.increment_scan_cycles();

        log.emit(
            Event::ScanComplete,
            &[
                ("root", &root),
                ("buckets_verified", &report.buckets_verified.to_string()),
                ("buckets_reset", &report.buckets_reset.to_string()),
                ("records_pruned", &report.records_pruned.to_string()),
                ("files_seen", &report.files_seen.to_string()),
                ("files_indexed", &report.files_indexed.to_string()),
                ("files_skipped", &report.files_skipped.to_string()),
                ("append_failures", &report.append_failures.to_string()),
                ("walk_errors", &report.walk_errors.to_string()),
                ("duration_ms", &report.duration.as_millis().to_string()),
            ],
        );
        report
    }

    fn verify_pass(&self, report: &mut ScanReport) {
        for day in self.store.days() {
            match self.store.verify(day) {
                Ok(removed) => report.records_pruned += removed,
                Err(_) => report.buckets_reset += 1,
            }
            report.buckets_verified += 1;
        }
    }

    fn scan_pass(&self, log: &mut ScanLog, report: &mut ScanReport) {
        for entry in WalkDir::new(&self.root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    report.walk_errors += 1;
                    let path = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| self.root.display().to_string());
                    log.emit(
                        Event::ScanWalkError,
                        &[("path", &path), ("reason", &e.to_string())],
                    );
                    continue;
                }
            };
            if !entry.file_type().is_file() || !is_data_file(entry.file_name()) {
                continue;
            }
            report.files_seen += 1;
            self.index_file(entry.path(), log, report);
        }
    }

    fn index_file(&self, path: &Path, log: &mut ScanLog, report: &mut ScanReport) {
        let path_text = path.display().to_string();
        let decoded = panic::catch_unwind(AssertUnwindSafe(|| self.decoder.decode(path)));
        let record = match decoded {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                self.skip(&path_text, e.reason(), &e.to_string(), log, report);
                return;
            }
            Err(payload) => {
                self.skip(&path_text, "panic", &panic_message(&*payload), log, report);
                return;
            }
        };

        self.monitors.add(record.monitor());
        let days = record.days();
        for day in &days {
            if self.store.append(*day, &record).is_err() {
                report.append_failures += 1;
            }
        }

        report.files_indexed += 1;
        self.metrics.increment_files_indexed();
        log.emit(
            Event::FileIndexed,
            &[
                ("path", &path_text),
                ("monitor", &record.monitor().identifier()),
                ("days", &days.len().to_string()),
            ],
        );
    }

    fn skip(
        &self,
        path: &str,
        reason: &str,
        detail: &str,
        log: &mut ScanLog,
        report: &mut ScanReport,
    ) {
        report.files_skipped += 1;
        self.metrics.increment_files_skipped();
        log.emit(
            Event::FileSkipped,
            &[("path", path), ("reason", reason), ("detail", detail)],
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "decoder panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    use crate::record::{DecodeError, DecodeResult, Record};

    #[test]
    fn test_suffix_allow_list_ignores_case() {
        assert!(is_data_file(OsStr::new("a.txt")));
        assert!(is_data_file(OsStr::new("B.CSV")));
        assert!(is_data_file(OsStr::new("c.Dat")));
        assert!(!is_data_file(OsStr::new("d.png")));
        assert!(!is_data_file(OsStr::new("notes.md")));
    }

    fn fixture(dir: &TempDir) -> (Rebuilder, Arc<BucketStore>, Arc<MonitorSet>) {
        let metrics = Arc::new(IndexMetrics::new());
        let store =
            Arc::new(BucketStore::open(dir.path().join("index"), 8, Arc::clone(&metrics)).unwrap());
        let monitors = Arc::new(MonitorSet::new());

        // "bad*" files fail to decode and "boom*" files panic; the rest
        // cover 2024-01-01 01:00 to 02:00.
        let decoder = |path: &Path| -> DecodeResult<Record> {
            let name = path.file_name().unwrap().to_string_lossy();
            if name.starts_with("boom") {
                panic!("decoder blew up on {}", name);
            }
            if name.starts_with("bad") {
                return Err(DecodeError::MissingField("Site"));
            }
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap();
            let end = Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap();
            Record::new(path, "SiteA", "M1", "StationX", start, end)
        };

        let rebuilder = Rebuilder::new(
            dir.path().join("data"),
            dir.path().join("logs"),
            Arc::new(decoder),
            Arc::clone(&store),
            Arc::clone(&monitors),
            metrics,
        );
        (rebuilder, store, monitors)
    }

    #[test]
    fn test_cycle_indexes_and_skips() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data").join("nested");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("good.txt"), b"").unwrap();
        fs::write(data.join("bad.txt"), b"").unwrap();
        fs::write(data.join("image.png"), b"").unwrap();

        let (rebuilder, store, monitors) = fixture(&dir);
        let report = rebuilder.run_cycle();

        assert_eq!(report.files_seen, 2);
        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.files_skipped, 1);
        assert_eq!(monitors.len(), 1);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(store.read(day).len(), 1);
        assert_eq!(fs::read_dir(dir.path().join("logs")).unwrap().count(), 1);
    }

    #[test]
    fn test_second_cycle_prunes_deleted_file() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("a.txt"), b"").unwrap();
        fs::write(data.join("b.txt"), b"").unwrap();

        let (rebuilder, store, _) = fixture(&dir);
        rebuilder.run_cycle();
        fs::remove_file(data.join("b.txt")).unwrap();

        let report = rebuilder.run_cycle();
        assert_eq!(report.buckets_verified, 1);
        assert_eq!(report.records_pruned, 1);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(store.read(day).len(), 1);
    }

    #[test]
    fn test_missing_root_is_a_walk_error() {
        let dir = TempDir::new().unwrap();
        let (rebuilder, _, _) = fixture(&dir);
        let report = rebuilder.run_cycle();
        assert_eq!(report.walk_errors, 1);
        assert_eq!(report.files_seen, 0);
    }

    #[test]
    fn test_panicking_decoder_skips_only_that_file() {
        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("boom.txt"), b"").unwrap();
        fs::write(data.join("good.txt"), b"").unwrap();

        let (rebuilder, store, _) = fixture(&dir);
        let report = rebuilder.run_cycle();
        assert_eq!(report.files_seen, 2);
        assert_eq!(report.files_indexed, 1);
        assert_eq!(report.files_skipped, 1);
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(store.read(day).len(), 1);

        let log = fs::read_dir(dir.path().join("logs")).unwrap().next().unwrap().unwrap();
        let contents = fs::read_to_string(log.path()).unwrap();
        assert!(contents.contains("\"reason\":\"panic\""));
        assert!(contents.contains("decoder blew up"));

        let again = rebuilder.run_cycle();
        assert_eq!(again.files_skipped, 1);
    }
}
