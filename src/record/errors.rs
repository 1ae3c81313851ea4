//! Record decoding errors
//!
//! A decode error is always local to one candidate file: the scanner logs
//! it and moves on.

use std::io;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Result type for record construction and decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Why a candidate file is not a valid data record
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("file has no content")]
    Empty,

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("bad {field} timestamp: {value:?}")]
    BadTimestamp { field: &'static str, value: String },

    #[error("record ends before it starts: {start} > {end}")]
    InvalidInterval {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
}

impl DecodeError {
    /// Short machine-friendly reason, used in log fields
    pub fn reason(&self) -> &'static str {
        match self {
            DecodeError::Io { .. } => "io",
            DecodeError::Empty => "empty",
            DecodeError::MissingField(_) => "missing_field",
            DecodeError::BadTimestamp { .. } => "bad_timestamp",
            DecodeError::InvalidInterval { .. } => "invalid_interval",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_the_field() {
        let err = DecodeError::MissingField("StationID");
        assert_eq!(err.to_string(), "missing required field: StationID");
        assert_eq!(err.reason(), "missing_field");
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let err = DecodeError::Io {
            path: PathBuf::from("/data/x.txt"),
            source: io::Error::new(io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("/data/x.txt"));
    }
}
