//! Index errors
//!
//! Only structurally invalid requests and lifecycle misuse reach a caller.
//! Per-file and per-bucket failures are absorbed by the scanner and the
//! bucket store.
//!
//! Error codes:
//! - SIDX_RANGE_TOO_LARGE
//! - SIDX_INVALID_RANGE
//! - SIDX_CLOSED
//! - SIDX_CONFIG
//! - SIDX_IO

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::bucket::BucketError;
use crate::config::ConfigError;

pub type IndexResult<T> = Result<T, IndexError>;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("range {start} .. {end} spans more than one month")]
    RangeTooLarge {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("range end {end} precedes start {start}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("index is closed; open a new one")]
    Closed,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl IndexError {
    pub fn code(&self) -> &'static str {
        match self {
            IndexError::RangeTooLarge { .. } => "SIDX_RANGE_TOO_LARGE",
            IndexError::InvalidRange { .. } => "SIDX_INVALID_RANGE",
            IndexError::Closed => "SIDX_CLOSED",
            IndexError::Config(_) => "SIDX_CONFIG",
            IndexError::Io { .. } => "SIDX_IO",
        }
    }

    /// Whether the caller sent a bad request, as opposed to the index
    /// being unusable
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            IndexError::RangeTooLarge { .. } | IndexError::InvalidRange { .. }
        )
    }
}

impl From<ConfigError> for IndexError {
    fn from(e: ConfigError) -> Self {
        IndexError::Config(e.to_string())
    }
}

impl From<BucketError> for IndexError {
    fn from(e: BucketError) -> Self {
        match e {
            BucketError::Io { path, source } => IndexError::Io { path, source },
            BucketError::Corrupt { path, reason } => IndexError::Io {
                path,
                source: io::Error::new(io::ErrorKind::InvalidData, reason),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_codes_are_distinct() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let errors = [
            IndexError::RangeTooLarge { start: t, end: t },
            IndexError::InvalidRange { start: t, end: t },
            IndexError::Closed,
            IndexError::Config("x".into()),
            IndexError::Io {
                path: PathBuf::from("/idx"),
                source: io::Error::new(io::ErrorKind::Other, "boom"),
            },
        ];
        let mut codes: Vec<_> = errors.iter().map(IndexError::code).collect();
        codes.dedup();
        assert_eq!(codes.len(), 5);
    }

    #[test]
    fn test_request_errors() {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(IndexError::RangeTooLarge { start: t, end: t }.is_request_error());
        assert!(!IndexError::Closed.is_request_error());
    }

    #[test]
    fn test_config_error_converts() {
        let err: IndexError = ConfigError::Invalid("refresh_interval_ms must be > 0".into()).into();
        assert!(matches!(err, IndexError::Config(_)));
        assert!(err.to_string().contains("refresh_interval_ms"));
    }
}
