//! Observability for the index
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Lock-free counters
//!
//! Observability is read-only: nothing here influences indexing or query
//! results, and no failure in it is ever surfaced to a caller.
//!
//! ```ignore
//! use sidindex::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ScratchCleanup, &[("removed", "3")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{IndexMetrics, MetricsSnapshot};

/// Severity an event is logged at
pub fn severity_for(event: Event) -> Severity {
    if event.is_warning() {
        Severity::Warn
    } else if event == Event::FileIndexed {
        Severity::Trace
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_for(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_events_log_at_warn() {
        assert_eq!(severity_for(Event::BucketCorrupt), Severity::Warn);
        assert_eq!(severity_for(Event::ScanComplete), Severity::Info);
        assert_eq!(severity_for(Event::FileIndexed), Severity::Trace);
    }
}
