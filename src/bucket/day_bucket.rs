//! One persisted bucket per UTC day
//!
//! A bucket file is always replaced whole: the new content is written to a
//! `.partial` sibling, fsynced, then renamed over the live file. A crash
//! mid-write leaves either the old bucket or the new one, never a torn mix.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDate;
use uuid::Uuid;

use super::codec::{decode_bucket, encode_bucket};
use super::errors::{BucketError, BucketResult};
use crate::calendar;
use crate::record::Record;

/// Suffix shared by every bucket file; anything carrying it is scratch
/// space and may be deleted at startup.
pub const BUCKET_FILE_SUFFIX: &str = ".temp-index-file";

const PARTIAL_MARKER: &str = ".partial";

/// File name for a new bucket: `<day millis>.<uuid>.temp-index-file`
pub fn bucket_file_name(day: NaiveDate) -> String {
    format!(
        "{}.{}{}",
        calendar::start_of_day(day).timestamp_millis(),
        Uuid::new_v4(),
        BUCKET_FILE_SUFFIX
    )
}

/// The on-disk half of a bucket. Only reachable through [`DayBucket::lock`].
#[derive(Debug)]
pub struct BucketFile {
    path: PathBuf,
    count: usize,
}

impl BucketFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records in the last successful write
    pub fn count(&self) -> usize {
        self.count
    }

    /// Read the persisted set.
    ///
    /// A bucket whose last write held zero records is not read at all.
    pub fn load(&self) -> BucketResult<HashSet<Record>> {
        if self.count == 0 {
            return Ok(HashSet::new());
        }
        let bytes = fs::read(&self.path).map_err(|e| BucketError::io(&self.path, e))?;
        let records = decode_bucket(&bytes)
            .map_err(|e| BucketError::corrupt(&self.path, e.to_string()))?;
        Ok(records.into_iter().collect())
    }

    /// Replace the persisted set
    pub fn write(&mut self, records: &HashSet<Record>) -> BucketResult<()> {
        let bytes = encode_bucket(records.iter());
        let partial = partial_path(&self.path);

        let mut file = File::create(&partial).map_err(|e| BucketError::io(&partial, e))?;
        file.write_all(&bytes)
            .map_err(|e| BucketError::io(&partial, e))?;
        file.sync_all().map_err(|e| BucketError::io(&partial, e))?;
        drop(file);

        fs::rename(&partial, &self.path).map_err(|e| BucketError::io(&self.path, e))?;
        self.count = records.len();
        Ok(())
    }

    /// Write an empty bucket, recreating the directory and file if they
    /// have gone missing
    pub fn reset(&mut self) -> BucketResult<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).map_err(|e| BucketError::io(dir, e))?;
        }
        self.count = 0;
        self.write(&HashSet::new())
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(BUCKET_FILE_SUFFIX).unwrap_or(&name);
    path.with_file_name(format!("{}{}{}", stem, PARTIAL_MARKER, BUCKET_FILE_SUFFIX))
}

/// The bucket for one UTC calendar day.
///
/// Every read and write of the bucket goes through its mutex, so operations
/// on one day are serialized while different days proceed independently.
#[derive(Debug)]
pub struct DayBucket {
    day: NaiveDate,
    file: Mutex<BucketFile>,
}

impl DayBucket {
    /// Create the bucket and persist it empty straight away.
    ///
    /// # Errors
    ///
    /// Returns `BucketError::Io` if the empty bucket cannot be written.
    pub fn create(dir: &Path, day: NaiveDate) -> BucketResult<Self> {
        let mut file = BucketFile {
            path: dir.join(bucket_file_name(day)),
            count: 0,
        };
        file.write(&HashSet::new())?;
        Ok(Self {
            day,
            file: Mutex::new(file),
        })
    }

    pub fn day(&self) -> NaiveDate {
        self.day
    }

    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    pub fn record_count(&self) -> usize {
        self.lock().count
    }

    /// Exclusive access to the bucket's file.
    pub fn lock(&self) -> MutexGuard<'_, BucketFile> {
        // A panic mid-write leaves the old file in place and the count unchanged.
        self.file.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
