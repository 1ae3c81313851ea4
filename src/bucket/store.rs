//! The day → bucket index map
//!
//! Buckets are created lazily on the first append for their day and are
//! never removed while the store lives. Lock order is always map, then
//! bucket, then cache.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::NaiveDate;

use super::day_bucket::{BucketFile, DayBucket, BUCKET_FILE_SUFFIX};
use super::errors::{BucketError, BucketResult};
use crate::cache::{BucketCache, CachedSet};
use crate::observability::{log_event_with_fields, Event, IndexMetrics};
use crate::record::{MonitorIdentity, Record};

pub struct BucketStore {
    dir: PathBuf,
    buckets: RwLock<BTreeMap<NaiveDate, Arc<DayBucket>>>,
    cache: BucketCache<NaiveDate>,
    metrics: Arc<IndexMetrics>,
}

impl BucketStore {
    /// Open an empty store writing bucket files into `dir`.
    ///
    /// The directory is created if missing. Existing bucket files are not
    /// adopted; call [`BucketStore::cleanup_scratch`] first to remove them.
    pub fn open(
        dir: impl Into<PathBuf>,
        cache_capacity: usize,
        metrics: Arc<IndexMetrics>,
    ) -> BucketResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| BucketError::io(&dir, e))?;
        Ok(Self {
            dir,
            buckets: RwLock::new(BTreeMap::new()),
            cache: BucketCache::new(cache_capacity),
            metrics,
        })
    }

    /// Delete every bucket file left in `dir` by an earlier process.
    ///
    /// Returns the number of files removed. Files that cannot be removed
    /// are left behind; they are never read again.
    pub fn cleanup_scratch(dir: &Path) -> BucketResult<usize> {
        fs::create_dir_all(dir).map_err(|e| BucketError::io(dir, e))?;
        let entries = fs::read_dir(dir).map_err(|e| BucketError::io(dir, e))?;

        let mut removed = 0;
        for entry in entries.flatten() {
            let path = entry.path();
            let is_scratch = path
                .file_name()
                .and_then(|n| n.to_str())
                .map_or(false, |n| n.ends_with(BUCKET_FILE_SUFFIX));
            if is_scratch && path.is_file() && fs::remove_file(&path).is_ok() {
                removed += 1;
            }
        }
        Ok(removed)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn cache(&self) -> &BucketCache<NaiveDate> {
        &self.cache
    }

    pub fn get(&self, day: NaiveDate) -> Option<Arc<DayBucket>> {
        self.buckets
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&day)
            .cloned()
    }

    /// The bucket for `day`, creating and persisting it if absent.
    ///
    /// Creation happens under the map's write lock, so a concurrent lookup
    /// of the same day sees either no bucket or the finished one.
    pub fn get_or_create(&self, day: NaiveDate) -> BucketResult<Arc<DayBucket>> {
        if let Some(bucket) = self.get(day) {
            return Ok(bucket);
        }

        let mut buckets = self.buckets.write().unwrap_or_else(|p| p.into_inner());
        if let Some(bucket) = buckets.get(&day) {
            return Ok(Arc::clone(bucket));
        }

        let bucket = Arc::new(DayBucket::create(&self.dir, day)?);
        buckets.insert(day, Arc::clone(&bucket));
        self.metrics.increment_buckets_created();
        log_event_with_fields(
            Event::BucketCreated,
            &[
                ("day", &day.to_string()),
                ("path", &bucket.path().display().to_string()),
            ],
        );
        Ok(bucket)
    }

    pub fn exists(&self, day: NaiveDate) -> bool {
        self.get(day).is_some()
    }

    /// Every day with a bucket, ascending
    pub fn days(&self) -> Vec<NaiveDate> {
        self.buckets
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .keys()
            .copied()
            .collect()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.read().unwrap_or_else(|p| p.into_inner()).len()
    }

    /// Records filed under `day`.
    ///
    /// Never fails: a missing bucket reads as empty, and so does one that
    /// cannot be deserialized.
    pub fn read(&self, day: NaiveDate) -> CachedSet {
        match self.get(day) {
            Some(bucket) => {
                let file = bucket.lock();
                self.read_locked(day, &file)
            }
            None => Arc::new(HashSet::new()),
        }
    }

    fn read_locked(&self, day: NaiveDate, file: &BucketFile) -> CachedSet {
        if let Some(set) = self.cache.get(&day) {
            return set;
        }

        match file.load() {
            Ok(set) => {
                let set = Arc::new(set);
                self.cache.put(day, Arc::clone(&set));
                set
            }
            Err(e) => {
                self.report_corrupt(day, &e);
                Arc::new(HashSet::new())
            }
        }
    }

    fn report_corrupt(&self, day: NaiveDate, error: &BucketError) {
        self.metrics.increment_corrupt_reads();
        log_event_with_fields(
            Event::BucketCorrupt,
            &[("day", &day.to_string()), ("reason", &error.to_string())],
        );
    }

    /// File `record` under `day`.
    ///
    /// Returns `Ok(false)` when the bucket already held a record for the
    /// same source path; nothing is rewritten and the first-filed record is
    /// kept. A bucket that fails to load is rebuilt from empty.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::Io` if the bucket cannot be created or
    /// rewritten. The bucket is reset to empty before returning.
    pub fn append(&self, day: NaiveDate, record: &Record) -> BucketResult<bool> {
        let bucket = self.get_or_create(day)?;
        let mut file = bucket.lock();
        if self.cache.peek(&day).map_or(false, |set| set.contains(record)) {
            return Ok(false);
        }
        self.cache.invalidate(&day);

        let mut set = file.load().unwrap_or_else(|e| {
            self.report_corrupt(day, &e);
            HashSet::new()
        });
        if !set.insert(record.clone()) {
            return Ok(false);
        }

        if let Err(e) = file.write(&set) {
            log_event_with_fields(
                Event::BucketAppendFailed,
                &[
                    ("day", &day.to_string()),
                    ("source", &record.source().display().to_string()),
                    ("reason", &e.to_string()),
                ],
            );
            self.reset_locked(day, &mut file, &e);
            return Err(e);
        }
        Ok(true)
    }

    /// Drop every record of `day` whose backing file no longer exists.
    ///
    /// Returns the number of records removed. A day without a bucket
    /// verifies trivially.
    ///
    /// # Errors
    ///
    /// Any failure to load or rewrite the bucket resets it to empty and is
    /// returned after the reset.
    pub fn verify(&self, day: NaiveDate) -> BucketResult<usize> {
        let Some(bucket) = self.get(day) else {
            return Ok(0);
        };
        let mut file = bucket.lock();

        let result = self.prune_locked(day, &mut file);
        if let Err(e) = &result {
            self.reset_locked(day, &mut file, e);
        }
        result
    }

    fn prune_locked(&self, day: NaiveDate, file: &mut BucketFile) -> BucketResult<usize> {
        let current = match self.cache.peek(&day) {
            Some(set) => set,
            None => Arc::new(file.load()?),
        };
        let kept: HashSet<Record> = current
            .iter()
            .filter(|r| r.backing_file_exists())
            .cloned()
            .collect();
        let removed = current.len() - kept.len();

        file.write(&kept)?;
        self.cache.put(day, Arc::new(kept));
        Ok(removed)
    }

    fn reset_locked(&self, day: NaiveDate, file: &mut BucketFile, cause: &BucketError) {
        self.cache.invalidate(&day);
        self.metrics.increment_buckets_reset();

        let day_text = day.to_string();
        let cause_text = cause.to_string();
        match file.reset() {
            Ok(()) => log_event_with_fields(
                Event::BucketReset,
                &[("day", &day_text), ("reason", &cause_text)],
            ),
            Err(reset_error) => log_event_with_fields(
                Event::BucketReset,
                &[
                    ("day", &day_text),
                    ("reason", &cause_text),
                    ("reset_error", &reset_error.to_string()),
                ],
            ),
        }
    }

    /// Whether `day` holds a record from any of `monitors`, or any record
    /// at all when `monitors` is empty
    pub fn has_records(&self, day: NaiveDate, monitors: &[MonitorIdentity]) -> bool {
        let Some(bucket) = self.get(day) else {
            return false;
        };
        let file = bucket.lock();
        if file.count() == 0 {
            return false;
        }
        let set = self.read_locked(day, &file);
        if monitors.is_empty() {
            return !set.is_empty();
        }
        set.iter()
            .any(|record| monitors.iter().any(|m| record.is_from(m)))
    }
}
