//! The decoded description of one data file

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};

use super::errors::{DecodeError, DecodeResult};
use super::monitor::MonitorIdentity;
use crate::calendar;

/// One measurement file: who recorded it and which interval it covers.
///
/// Identity is the backing file path. Two records for the same path are
/// equal even if their decoded contents differ, so a re-decoded file
/// replaces nothing and duplicates nothing in a bucket set.
#[derive(Debug, Clone)]
pub struct Record {
    source: PathBuf,
    site: String,
    monitor_id: String,
    station_id: String,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    metadata: BTreeMap<String, String>,
}

impl Record {
    /// Create a record without extra metadata.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::InvalidInterval` if `end` precedes `start`.
    pub fn new(
        source: impl Into<PathBuf>,
        site: impl Into<String>,
        monitor_id: impl Into<String>,
        station_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DecodeResult<Self> {
        Self::with_metadata(source, site, monitor_id, station_id, start, end, BTreeMap::new())
    }

    /// Create a record carrying arbitrary key/value metadata
    pub fn with_metadata(
        source: impl Into<PathBuf>,
        site: impl Into<String>,
        monitor_id: impl Into<String>,
        station_id: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        metadata: BTreeMap<String, String>,
    ) -> DecodeResult<Self> {
        if end < start {
            return Err(DecodeError::InvalidInterval { start, end });
        }
        Ok(Self {
            source: source.into(),
            site: site.into(),
            monitor_id: monitor_id.into(),
            station_id: station_id.into(),
            start,
            end,
            metadata,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn monitor_id(&self) -> &str {
        &self.monitor_id
    }

    pub fn station_id(&self) -> &str {
        &self.station_id
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn metadata(&self) -> &BTreeMap<String, String> {
        &self.metadata
    }

    /// Value of a metadata key, if present
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).map(String::as_str)
    }

    /// Strict interval overlap with `[start, end)`.
    ///
    /// Touching intervals do not overlap: a record ending exactly at
    /// `start`, or starting exactly at `end`, is excluded.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start < end && self.end > start
    }

    /// Whether the backing file still exists on disk
    pub fn backing_file_exists(&self) -> bool {
        self.source.is_file()
    }

    /// Every UTC day this record must be filed under
    pub fn days(&self) -> Vec<NaiveDate> {
        calendar::days_spanned(self.start, self.end)
    }

    /// The monitor that produced this record
    pub fn monitor(&self) -> MonitorIdentity {
        MonitorIdentity::from_record(self)
    }

    /// Whether this record was produced by `monitor`
    pub fn is_from(&self, monitor: &MonitorIdentity) -> bool {
        self.site == monitor.site()
            && self.monitor_id == monitor.monitor_id()
            && self.station_id == monitor.station_id()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for Record {}

impl Hash for Record {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.source.hash(state);
    }
}
