//! Query results

use std::collections::HashSet;

use super::monitor::MonitorIdentity;
use super::record::Record;

/// The deduplicated result of a range query.
///
/// Records are ordered by start time, then by path, so repeated queries
/// over an unchanged index print identically.
#[derive(Debug, Clone, Default)]
pub struct RecordList {
    records: Vec<Record>,
}

impl RecordList {
    /// Build a list from any collection of records, dropping duplicates
    pub fn new(records: impl IntoIterator<Item = Record>) -> Self {
        let unique: HashSet<Record> = records.into_iter().collect();
        let mut records: Vec<Record> = unique.into_iter().collect();
        records.sort_by(|a, b| {
            a.start()
                .cmp(&b.start())
                .then_with(|| a.source().cmp(b.source()))
        });
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn into_records(self) -> Vec<Record> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    /// Records produced by any of `monitors`; an empty filter keeps everything
    pub fn filter_by_monitors(&self, monitors: &[MonitorIdentity]) -> RecordList {
        if monitors.is_empty() {
            return self.clone();
        }
        Self::new(
            self.records
                .iter()
                .filter(|r| monitors.iter().any(|m| r.is_from(m)))
                .cloned(),
        )
    }

    /// Records whose monitor ID starts with any of `prefixes`, ignoring case.
    ///
    /// Unlike [`RecordList::filter_by_monitors`], an empty slice matches
    /// nothing.
    pub fn filter_by_monitor_prefix(&self, prefixes: &[&str]) -> RecordList {
        let prefixes: Vec<String> = prefixes.iter().map(|p| p.to_lowercase()).collect();
        Self::new(
            self.records
                .iter()
                .filter(|r| {
                    let monitor = r.monitor_id().to_lowercase();
                    prefixes.iter().any(|p| monitor.starts_with(p.as_str()))
                })
                .cloned(),
        )
    }

    /// Distinct monitors present in this list
    pub fn monitors(&self) -> Vec<MonitorIdentity> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(Record::monitor)
            .filter(|m| seen.insert(m.clone()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a RecordList {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    fn record(path: &str, monitor: &str, h: u32) -> Record {
        Record::new(path, "SiteA", monitor, "NAA", ts(h), ts(h + 1)).unwrap()
    }

    #[test]
    fn test_new_deduplicates_and_orders() {
        let list = RecordList::new(vec![
            record("/b", "M1", 5),
            record("/a", "M1", 3),
            record("/b", "M1", 5),
        ]);
        assert_eq!(list.len(), 2);
        assert_eq!(list.records()[0].source().to_str(), Some("/a"));
    }

    #[test]
    fn test_filter_by_monitors() {
        let list = RecordList::new(vec![record("/a", "M1", 1), record("/b", "M2", 2)]);

        let only_m2 = list.filter_by_monitors(&[MonitorIdentity::new("SiteA", "M2", "NAA")]);
        assert_eq!(only_m2.len(), 1);
        assert_eq!(list.filter_by_monitors(&[]).len(), 2);
    }

    #[test]
    fn test_filter_by_monitor_prefix_ignores_case() {
        let list = RecordList::new(vec![record("/a", "S-0012", 1), record("/b", "T-0001", 2)]);
        assert_eq!(list.filter_by_monitor_prefix(&["s-00"]).len(), 1);
    }

    #[test]
    fn test_empty_prefix_list_matches_nothing() {
        let list = RecordList::new(vec![record("/a", "S-0012", 1)]);
        assert!(list.filter_by_monitor_prefix(&[]).is_empty());
        assert_eq!(list.filter_by_monitor_prefix(&[""]).len(), 1);
    }

    #[test]
    fn test_monitors_are_distinct() {
        let list = RecordList::new(vec![
            record("/a", "M1", 1),
            record("/b", "M1", 2),
            record("/c", "M2", 3),
        ]);
        assert_eq!(list.monitors().len(), 2);
    }
}
