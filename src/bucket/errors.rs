//! Bucket store errors
//!
//! Neither variant ever reaches a query caller: reads degrade to an empty
//! set and verify resets the bucket. They surface to the rebuilder, which
//! logs them and moves on.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for bucket operations
pub type BucketResult<T> = Result<T, BucketError>;

#[derive(Debug, Error)]
pub enum BucketError {
    #[error("bucket I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("bucket {path} is corrupt: {reason}")]
    Corrupt { path: PathBuf, reason: String },
}

impl BucketError {
    pub fn io(path: &Path, source: io::Error) -> Self {
        BucketError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        BucketError::Corrupt {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub fn is_corrupt(&self) -> bool {
        matches!(self, BucketError::Corrupt { .. })
    }
}
