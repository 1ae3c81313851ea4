//! The filesystem-backed index
//!
//! Lifecycle: `open` → indexing (not ready) → indexing (ready, refreshed
//! periodically) → closed. Queries are answered in both indexing states;
//! results are simply partial until the first scan finishes.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, Utc};

use super::contract::RecordIndex;
use super::errors::{IndexError, IndexResult};
use super::order::MonitorOrder;
use crate::bucket::BucketStore;
use crate::cache::CacheStats;
use crate::calendar;
use crate::config::IndexConfig;
use crate::observability::{log_event_with_fields, Event, IndexMetrics};
use crate::record::{MonitorIdentity, RecordDecoder, RecordList};
use crate::scanner::{MonitorSet, Rebuilder, ScanScheduler};

const READY_POLL: Duration = Duration::from_millis(20);

pub struct FilesystemIndex {
    config: IndexConfig,
    store: Arc<BucketStore>,
    monitors: Arc<MonitorSet>,
    metrics: Arc<IndexMetrics>,
    ready: Arc<AtomicBool>,
    closed: AtomicBool,
    scheduler: Mutex<Option<ScanScheduler>>,
}

impl std::fmt::Debug for FilesystemIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilesystemIndex")
            .field("config", &self.config)
            .field("ready", &self.ready)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl FilesystemIndex {
    /// Open an index over `config.root_data_dir` and start refreshing it.
    ///
    /// Bucket files left in the index directory by an earlier process are
    /// deleted first. The first scan starts immediately on a background
    /// thread; this call does not wait for it.
    ///
    /// # Errors
    ///
    /// `IndexError::Config` if the configuration is invalid,
    /// `IndexError::Io` if the index or log directory cannot be prepared or
    /// the scan thread cannot be spawned.
    pub fn open(config: IndexConfig, decoder: Arc<dyn RecordDecoder>) -> IndexResult<Self> {
        config.validate()?;

        fs::create_dir_all(&config.log_dir).map_err(|source| IndexError::Io {
            path: config.log_dir.clone(),
            source,
        })?;

        let removed = BucketStore::cleanup_scratch(&config.index_dir)?;
        log_event_with_fields(
            Event::ScratchCleanup,
            &[
                ("index_dir", &config.index_dir.display().to_string()),
                ("removed", &removed.to_string()),
            ],
        );

        let metrics = Arc::new(IndexMetrics::new());
        let store = Arc::new(BucketStore::open(
            &config.index_dir,
            config.cache_capacity,
            Arc::clone(&metrics),
        )?);
        let monitors = Arc::new(MonitorSet::new());
        let ready = Arc::new(AtomicBool::new(false));

        let rebuilder = Arc::new(Rebuilder::new(
            &config.root_data_dir,
            &config.log_dir,
            decoder,
            Arc::clone(&store),
            Arc::clone(&monitors),
            Arc::clone(&metrics),
        ));
        let scheduler =
            ScanScheduler::start(rebuilder, config.refresh_interval(), Arc::clone(&ready))
                .map_err(|source| IndexError::Io {
                    path: config.root_data_dir.clone(),
                    source,
                })?;

        log_event_with_fields(
            Event::IndexOpen,
            &[
                ("root", &config.root_data_dir.display().to_string()),
                ("index_dir", &config.index_dir.display().to_string()),
                ("refresh_interval_ms", &config.refresh_interval_ms.to_string()),
            ],
        );

        Ok(Self {
            config,
            store,
            monitors,
            metrics,
            ready,
            closed: AtomicBool::new(false),
            scheduler: Mutex::new(Some(scheduler)),
        })
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    pub fn metrics(&self) -> &IndexMetrics {
        &self.metrics
    }

    /// Hit, miss and eviction counts of the bucket cache
    pub fn cache_stats(&self) -> CacheStats {
        self.store.cache().stats()
    }

    pub fn bucket_count(&self) -> usize {
        self.store.bucket_count()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Block until the first scan finishes or `timeout` elapses.
    ///
    /// Returns whether the index is ready.
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while !self.is_ready() {
            if self.is_closed() || Instant::now() >= deadline {
                return self.is_ready();
            }
            thread::sleep(READY_POLL);
        }
        true
    }

    /// Stop the background scan and release the cache. Idempotent.
    ///
    /// Bucket files stay on disk until the next open of the same index
    /// directory.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let scheduler = self
            .scheduler
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if let Some(mut scheduler) = scheduler {
            scheduler.stop();
        }
        self.store.cache().clear();
        log_event_with_fields(
            Event::IndexClosed,
            &[("root", &self.config.root_data_dir.display().to_string())],
        );
    }

    fn ensure_open(&self) -> IndexResult<()> {
        if self.is_closed() {
            return Err(IndexError::Closed);
        }
        Ok(())
    }

    fn check_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> IndexResult<()> {
        if end < start {
            return Err(self.reject(IndexError::InvalidRange { start, end }));
        }
        Ok(())
    }

    fn reject(&self, error: IndexError) -> IndexError {
        self.metrics.increment_queries_rejected();
        log_event_with_fields(
            Event::QueryRejected,
            &[("code", error.code()), ("reason", &error.to_string())],
        );
        error
    }
}

impl RecordIndex for FilesystemIndex {
    fn query_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> IndexResult<RecordList> {
        self.ensure_open()?;
        self.metrics.increment_queries();
        self.check_range(start, end)?;
        if calendar::exceeds_one_month(start, end) {
            return Err(self.reject(IndexError::RangeTooLarge { start, end }));
        }

        let mut found = Vec::new();
        for day in calendar::days_in_range(start, end) {
            let set = self.store.read(day);
            found.extend(
                set.iter()
                    .filter(|r| r.overlaps(start, end) && r.backing_file_exists())
                    .cloned(),
            );
        }
        Ok(RecordList::new(found))
    }

    fn list_monitors(&self, order: Option<MonitorOrder>) -> IndexResult<Vec<MonitorIdentity>> {
        self.ensure_open()?;
        let mut monitors = self.monitors.snapshot();
        if let Some(order) = order {
            order.sort(&mut monitors);
        }
        Ok(monitors)
    }

    fn days_with_data(&self, monitors: &[MonitorIdentity]) -> IndexResult<Vec<NaiveDate>> {
        self.ensure_open()?;
        let today = calendar::day_of(Utc::now());
        // Days without a bucket can never hold data, so only known days are probed.
        Ok(self
            .store
            .days()
            .into_iter()
            .filter(|day| *day >= self.config.history_start && *day <= today)
            .filter(|day| self.store.has_records(*day, monitors))
            .collect())
    }

    fn has_data(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        monitors: &[MonitorIdentity],
    ) -> IndexResult<bool> {
        self.ensure_open()?;
        self.check_range(start, end)?;
        Ok(calendar::days_in_range(start, end)
            .into_iter()
            .any(|day| self.store.has_records(day, monitors)))
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn shutdown(&self) {
        self.close();
    }
}

impl Drop for FilesystemIndex {
    fn drop(&mut self) {
        self.close();
    }
}
