//! Day bucket store
//!
//! One persisted file per UTC calendar day, each holding the set of records
//! whose interval touches that day. A record spanning several days is filed
//! in every one of them.
//!
//! Bucket files are scratch space. They are rebuilt by the next scan after
//! a restart, and anything left behind by an earlier process is deleted by
//! [`BucketStore::cleanup_scratch`] before scanning begins.
//!
//! Failures never reach a query: an unreadable bucket reads as empty and a
//! bucket that cannot be verified is reset to empty.

mod checksum;
mod codec;
mod day_bucket;
mod errors;
mod store;

pub use codec::{decode_bucket, encode_bucket, FORMAT_VERSION, MAGIC};
pub use day_bucket::{bucket_file_name, BucketFile, DayBucket, BUCKET_FILE_SUFFIX};
pub use errors::{BucketError, BucketResult};
pub use store::BucketStore;
