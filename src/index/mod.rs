//! Query surface
//!
//! [`RecordIndex`] is the contract outer layers consume. [`FilesystemIndex`]
//! implements it over a bucket store kept fresh by a background scanner.
//! [`IndexRegistry`] holds one index per host context.
//!
//! # Guarantees
//!
//! - A record is returned iff `record.start < end && record.end > start`
//!   and its file still exists
//! - A record spanning several days is returned once
//! - Ranges longer than one calendar month are rejected before any bucket
//!   is read
//! - Once ready, an index stays ready

mod contract;
mod errors;
mod facade;
mod order;
mod registry;

pub use contract::RecordIndex;
pub use errors::{IndexError, IndexResult};
pub use facade::FilesystemIndex;
pub use order::MonitorOrder;
pub use registry::IndexRegistry;
