//! The query contract consumed by outer layers

use chrono::{DateTime, NaiveDate, Utc};

use super::errors::IndexResult;
use super::order::MonitorOrder;
use crate::record::{MonitorIdentity, RecordList};

/// A queryable index of data files.
///
/// Results may be partial until [`RecordIndex::is_ready`] first returns
/// `true`. Every query fails with `IndexError::Closed` after
/// [`RecordIndex::shutdown`].
pub trait RecordIndex: Send + Sync {
    /// Every record overlapping `[start, end)`.
    ///
    /// Ranges longer than one calendar month are rejected with
    /// `IndexError::RangeTooLarge`.
    fn query_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> IndexResult<RecordList>;

    /// Every monitor seen so far, sorted when `order` is given
    fn list_monitors(&self, order: Option<MonitorOrder>) -> IndexResult<Vec<MonitorIdentity>>;

    /// Days holding at least one record from `monitors` (any monitor when
    /// empty), ascending
    fn days_with_data(&self, monitors: &[MonitorIdentity]) -> IndexResult<Vec<NaiveDate>>;

    /// Whether any day touched by `[start, end)` holds a record from
    /// `monitors` (any monitor when empty)
    fn has_data(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        monitors: &[MonitorIdentity],
    ) -> IndexResult<bool>;

    /// Whether at least one full scan has finished
    fn is_ready(&self) -> bool;

    fn shutdown(&self);
}
