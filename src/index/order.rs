//! Orders for monitor listings
//!
//! Each order compares one field case-insensitively and falls back to the
//! next order in its chain on a tie:
//!
//! ```text
//! Station  ─┐
//! Location ─┴─> Site ──> Monitor
//! ```
//!
//! The literal `unknown` sorts before every real site or monitor ID, and
//! an empty station or location sorts before every non-empty one.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::record::MonitorIdentity;

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonitorOrder {
    Station,
    Monitor,
    Site,
    Location,
}

impl MonitorOrder {
    pub const ALL: [MonitorOrder; 4] = [
        MonitorOrder::Station,
        MonitorOrder::Monitor,
        MonitorOrder::Site,
        MonitorOrder::Location,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            MonitorOrder::Station => "station",
            MonitorOrder::Monitor => "monitor",
            MonitorOrder::Site => "site",
            MonitorOrder::Location => "location",
        }
    }

    /// Look up an order by id; anything unrecognized sorts by site
    pub fn from_id(id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|order| order.id() == id)
            .unwrap_or(MonitorOrder::Site)
    }

    pub fn compare(&self, a: &MonitorIdentity, b: &MonitorIdentity) -> Ordering {
        match self {
            MonitorOrder::Station => {
                empty_first(a.station_id(), b.station_id()).then_with(|| by_site(a, b))
            }
            MonitorOrder::Location => {
                empty_first(a.location(), b.location()).then_with(|| by_site(a, b))
            }
            MonitorOrder::Site => by_site(a, b),
            MonitorOrder::Monitor => by_monitor(a, b),
        }
    }

    /// Sort `monitors` in place
    pub fn sort(&self, monitors: &mut [MonitorIdentity]) {
        monitors.sort_by(|a, b| self.compare(a, b));
    }
}

fn by_site(a: &MonitorIdentity, b: &MonitorIdentity) -> Ordering {
    unknown_first(a.site(), b.site()).then_with(|| by_monitor(a, b))
}

fn by_monitor(a: &MonitorIdentity, b: &MonitorIdentity) -> Ordering {
    unknown_first(a.monitor_id(), b.monitor_id())
}

fn unknown_first(a: &str, b: &str) -> Ordering {
    match (a == UNKNOWN, b == UNKNOWN) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => ignore_case(a, b),
    }
}

fn empty_first(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => ignore_case(a, b),
    }
}

fn ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

impl fmt::Display for MonitorOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for MonitorOrder {
    type Err = String;

    /// Strict parse for user input; unlike [`MonitorOrder::from_id`] an
    /// unknown id is an error
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|order| order.id() == lower)
            .ok_or_else(|| {
                format!(
                    "unknown monitor order '{}', expected one of station, monitor, site, location",
                    s
                )
            })
    }
}
