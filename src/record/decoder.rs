//! Turning raw files into records
//!
//! The index only needs "path in, record or error out"; [`RecordDecoder`]
//! is that seam. [`SidFileDecoder`] understands the text format written by
//! SID monitors:
//!
//! ```text
//! # Site = SiteA
//! # MonitorID = M1
//! # StationID = NAA
//! # UTC_StartTime = 2024-01-01 03:00:00
//! # UTC_EndTime = 2024-01-01 05:00:00
//! 2024-01-01 03:00:00, 0.1234
//! ...
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use super::errors::{DecodeError, DecodeResult};
use super::record::Record;

pub const KEY_SITE: &str = "Site";
pub const KEY_MONITOR: &str = "MonitorID";
pub const KEY_STATION: &str = "StationID";
pub const KEY_START: &str = "UTC_StartTime";
pub const KEY_END: &str = "UTC_EndTime";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Decodes one candidate file into a record.
///
/// Implementations must be callable from the background rebuilder thread.
pub trait RecordDecoder: Send + Sync {
    fn decode(&self, path: &Path) -> DecodeResult<Record>;
}

impl<F> RecordDecoder for F
where
    F: Fn(&Path) -> DecodeResult<Record> + Send + Sync,
{
    fn decode(&self, path: &Path) -> DecodeResult<Record> {
        self(path)
    }
}

/// Decoder for SID text data files
#[derive(Debug, Clone, Copy, Default)]
pub struct SidFileDecoder;

impl SidFileDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode file contents that were read from `path`
    pub fn decode_str(&self, path: &Path, contents: &str) -> DecodeResult<Record> {
        if contents.trim().is_empty() {
            return Err(DecodeError::Empty);
        }
        let mut metadata = BTreeMap::new();
        let mut lines = contents.lines();
        let mut last_data_line = None;

        for line in lines.by_ref() {
            if line.trim().is_empty() {
                continue;
            }
            match line.strip_prefix('#') {
                Some(entry) => {
                    if let Some((key, value)) = split_header_entry(entry) {
                        metadata.insert(key, value);
                    }
                }
                None => {
                    last_data_line = Some(line);
                    break;
                }
            }
        }
        if let Some(last) = lines.filter(|l| !l.trim().is_empty()).last() {
            last_data_line = Some(last);
        }

        if !metadata.contains_key(KEY_MONITOR) {
            if let Some(monitor) = monitor_from_file_name(path) {
                metadata.insert(KEY_MONITOR.to_string(), monitor);
            }
        }
        if !metadata.contains_key(KEY_END) {
            if let Some(line) = last_data_line {
                let first_column = line.split(',').next().unwrap_or("").trim();
                if !first_column.is_empty() {
                    metadata.insert(KEY_END.to_string(), first_column.to_string());
                }
            }
        }

        let site = required(&metadata, KEY_SITE)?.to_string();
        let monitor = required(&metadata, KEY_MONITOR)?.to_string();
        let station = required(&metadata, KEY_STATION)?.to_string();
        let start = parse_timestamp(KEY_START, required(&metadata, KEY_START)?)?;
        let end = parse_timestamp(KEY_END, required(&metadata, KEY_END)?)?;

        Record::with_metadata(path, site, monitor, station, start, end, metadata)
    }
}

impl RecordDecoder for SidFileDecoder {
    fn decode(&self, path: &Path) -> DecodeResult<Record> {
        let bytes = fs::read(path).map_err(|source| DecodeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.decode_str(path, &String::from_utf8_lossy(&bytes))
    }
}

/// `# Key = Value` with exactly one `=` and a non-empty value
fn split_header_entry(entry: &str) -> Option<(String, String)> {
    let mut parts = entry.split('=');
    let key = parts.next()?.trim();
    let value = parts.next()?.trim();
    if parts.next().is_some() || key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key.to_string(), value.to_string()))
}

/// Files named like `SiteA_NAA_2024-01-01_M1.txt` carry the monitor ID in
/// the fourth `_`/`.`-separated component.
fn monitor_from_file_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    name.split(['_', '.'])
        .nth(3)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
}

fn required<'a>(metadata: &'a BTreeMap<String, String>, key: &'static str) -> DecodeResult<&'a str> {
    metadata
        .get(key)
        .map(String::as_str)
        .ok_or(DecodeError::MissingField(key))
}

fn parse_timestamp(field: &'static str, value: &str) -> DecodeResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim(), TIMESTAMP_FORMAT)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .map_err(|_| DecodeError::BadTimestamp {
            field,
            value: value.to_string(),
        })
}
