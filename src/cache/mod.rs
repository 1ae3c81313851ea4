//! Cache of deserialized day buckets
//!
//! Shared by the query path and the background rebuilder. See
//! [`BucketCache`] for the eviction policy.

mod fifo;

pub use fifo::{BucketCache, CacheStats, CachedSet, DEFAULT_CACHE_CAPACITY};
