//! Background rescan thread
//!
//! The first cycle starts as soon as the thread does. Between cycles the
//! thread waits on a stop channel with a timeout equal to the refresh
//! interval, so [`ScanScheduler::stop`] wakes it at once. A cycle that is
//! already running is allowed to finish.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::rebuilder::Rebuilder;

pub const SCHEDULER_THREAD_NAME: &str = "sidindex-rebuilder";

pub struct ScanScheduler {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ScanScheduler {
    /// Spawn the rescan thread.
    ///
    /// `ready` is set after every completed cycle and never cleared.
    pub fn start(
        rebuilder: Arc<Rebuilder>,
        interval: Duration,
        ready: Arc<AtomicBool>,
    ) -> io::Result<Self> {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.into())
            .spawn(move || loop {
                rebuilder.run_cycle();
                ready.store(true, Ordering::Release);

                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => continue,
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    /// Stop the thread and wait for it to exit. Calling it again does nothing.
    pub fn stop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for ScanScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    use tempfile::TempDir;

    use crate::bucket::BucketStore;
    use crate::observability::IndexMetrics;
    use crate::record::SidFileDecoder;
    use crate::scanner::MonitorSet;

    fn rebuilder(dir: &TempDir, metrics: Arc<IndexMetrics>) -> Arc<Rebuilder> {
        let store = BucketStore::open(dir.path().join("index"), 4, Arc::clone(&metrics)).unwrap();
        Arc::new(Rebuilder::new(
            dir.path().join("data"),
            dir.path().join("logs"),
            Arc::new(SidFileDecoder::new()),
            Arc::new(store),
            Arc::new(MonitorSet::new()),
            metrics,
        ))
    }

    fn wait_for(flag: &AtomicBool) {
        let deadline = Instant::now() + Duration::from_secs(10);
        while !flag.load(Ordering::Acquire) {
            assert!(Instant::now() < deadline, "first cycle never finished");
            thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_first_cycle_runs_immediately() {
        let dir = TempDir::new().unwrap();
        let metrics = Arc::new(IndexMetrics::new());
        let ready = Arc::new(AtomicBool::new(false));

        let mut scheduler = ScanScheduler::start(
            rebuilder(&dir, Arc::clone(&metrics)),
            Duration::from_secs(3600),
            Arc::clone(&ready),
        )
        .unwrap();

        wait_for(&ready);
        assert_eq!(metrics.snapshot().scan_cycles, 1);
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_stop_wakes_a_long_wait() {
        let dir = TempDir::new().unwrap();
        let ready = Arc::new(AtomicBool::new(false));
        let mut scheduler = ScanScheduler::start(
            rebuilder(&dir, Arc::new(IndexMetrics::new())),
            Duration::from_secs(3600),
            Arc::clone(&ready),
        )
        .unwrap();
        wait_for(&ready);

        let started = Instant::now();
        scheduler.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
        scheduler.stop();
    }

    #[test]
    fn test_short_interval_repeats() {
        let dir = TempDir::new().unwrap();
        let metrics = Arc::new(IndexMetrics::new());
        let ready = Arc::new(AtomicBool::new(false));
        let mut scheduler = ScanScheduler::start(
            rebuilder(&dir, Arc::clone(&metrics)),
            Duration::from_millis(5),
            ready,
        )
        .unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while metrics.snapshot().scan_cycles < 3 {
            assert!(Instant::now() < deadline);
            thread::sleep(Duration::from_millis(5));
        }
        scheduler.stop();
    }

    #[test]
    fn test_panicking_decoder_does_not_stop_refreshes() {
        use std::fs;
        use std::path::Path;

        use chrono::{TimeZone, Utc};

        use crate::record::{DecodeResult, Record};

        let dir = TempDir::new().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("boom.txt"), b"").unwrap();
        fs::write(data.join("fine.txt"), b"").unwrap();

        let decoder = |path: &Path| -> DecodeResult<Record> {
            if path.ends_with("boom.txt") {
                panic!("cannot decode {}", path.display());
            }
            let t = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
            Record::new(path, "SiteA", "M1", "StationX", t, t)
        };
        let metrics = Arc::new(IndexMetrics::new());
        let store = BucketStore::open(dir.path().join("index"), 4, Arc::clone(&metrics)).unwrap();
        let rebuilder = Arc::new(Rebuilder::new(
            &data,
            dir.path().join("logs"),
            Arc::new(decoder),
            Arc::new(store),
            Arc::new(MonitorSet::new()),
            Arc::clone(&metrics),
        ));

        let ready = Arc::new(AtomicBool::new(false));
        let mut scheduler =
            ScanScheduler::start(rebuilder, Duration::from_millis(20), Arc::clone(&ready)).unwrap();
        wait_for(&ready);

        let deadline = Instant::now() + Duration::from_secs(10);
        while metrics.snapshot().scan_cycles < 3 {
            assert!(Instant::now() < deadline, "refreshes stopped after a decoder panic");
            thread::sleep(Duration::from_millis(5));
        }
        assert!(scheduler.is_running());
        let snapshot = metrics.snapshot();
        assert!(snapshot.files_indexed >= 3);
        assert!(snapshot.files_skipped >= 3);
        scheduler.stop();
    }
}
