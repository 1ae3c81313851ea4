//! UTC calendar-day arithmetic
//!
//! Buckets are keyed by `NaiveDate` interpreted in UTC. Every timestamp is
//! normalized to the day it falls on before it touches the index map.

use chrono::{DateTime, Months, NaiveDate, NaiveTime, TimeZone, Utc};

/// The UTC day a timestamp falls on
pub fn day_of(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// Midnight UTC at the start of `day`
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}

/// Days overlapping the half-open range `[start, end)`.
///
/// A range ending exactly at midnight does not include the day that begins
/// at that midnight. An empty or inverted range yields no days.
pub fn days_in_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<NaiveDate> {
    let mut days = Vec::new();
    let mut day = day_of(start);
    while start_of_day(day) < end {
        days.push(day);
        match day.succ_opt() {
            Some(next) => day = next,
            None => break,
        }
    }
    days
}

/// Every day from the day of `start` through the day of `end`, inclusive.
///
/// Used to place a record into buckets: both endpoint days are included so
/// a record is always reachable from the day it ends on.
pub fn days_spanned(start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<NaiveDate> {
    let last = day_of(end);
    day_of(start)
        .iter_days()
        .take_while(|day| *day <= last)
        .collect()
}

/// True when `[start, end)` is longer than one calendar month.
///
/// Exactly one month is allowed; one month plus any positive amount is not.
pub fn exceeds_one_month(start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    start
        .checked_add_months(Months::new(1))
        .map_or(false, |limit| limit < end)
}
