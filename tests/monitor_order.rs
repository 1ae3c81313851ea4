//! Monitor Listing Order Tests

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use sidindex::config::IndexConfig;
use sidindex::index::{FilesystemIndex, MonitorOrder, RecordIndex};
use sidindex::record::{MonitorIdentity, SidFileDecoder};
use tempfile::TempDir;

fn ids(monitors: &[MonitorIdentity]) -> Vec<(&str, &str)> {
    monitors
        .iter()
        .map(|m| (m.site(), m.monitor_id()))
        .collect()
}

#[test]
fn test_site_tie_broken_by_monitor_ignoring_case() {
    let mut monitors = vec![
        MonitorIdentity::new("siteB", "m1", "S"),
        MonitorIdentity::new("SiteA", "m2", "S"),
        MonitorIdentity::new("sitea", "M1", "S"),
    ];
    MonitorOrder::Site.sort(&mut monitors);

    assert_eq!(
        ids(&monitors),
        vec![("sitea", "M1"), ("SiteA", "m2"), ("siteB", "m1")]
    );
}

#[test]
fn test_unknown_site_sorts_first() {
    let mut monitors = vec![
        MonitorIdentity::new("Aardvark", "M1", "S"),
        MonitorIdentity::new("unknown", "M9", "S"),
        MonitorIdentity::new("Zebra", "M1", "S"),
    ];
    MonitorOrder::Site.sort(&mut monitors);

    assert_eq!(monitors[0].site(), "unknown");
    assert_eq!(monitors[1].site(), "Aardvark");
}

#[test]
fn test_station_order_puts_empty_station_first() {
    let mut monitors = vec![
        MonitorIdentity::new("SiteA", "M1", "NAA"),
        MonitorIdentity::new("SiteB", "M2", ""),
        MonitorIdentity::new("SiteC", "M3", "DHO"),
    ];
    MonitorOrder::Station.sort(&mut monitors);

    let stations: Vec<&str> = monitors.iter().map(|m| m.station_id()).collect();
    assert_eq!(stations, vec!["", "DHO", "NAA"]);
}

#[test]
fn test_unknown_order_id_falls_back_to_site() {
    assert_eq!(MonitorOrder::from_id("nonsense"), MonitorOrder::Site);
    assert!("nonsense".parse::<MonitorOrder>().is_err());
    assert_eq!("Location".parse::<MonitorOrder>().unwrap(), MonitorOrder::Location);
}

#[test]
fn test_index_lists_monitors_in_requested_order() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    for (name, site, monitor) in [("a.txt", "Zulu", "M1"), ("b.txt", "alpha", "M2")] {
        fs::write(
            data.join(name),
            format!(
                "# Site = {}\n# MonitorID = {}\n# StationID = NAA\n\
                 # UTC_StartTime = 2024-01-01 03:00:00\n# UTC_EndTime = 2024-01-01 05:00:00\n",
                site, monitor
            ),
        )
        .unwrap();
    }

    let config = IndexConfig::new(&data, temp.path().join("index"), temp.path().join("logs"))
        .with_refresh_interval(Duration::from_secs(3600));
    let index = FilesystemIndex::open(config, Arc::new(SidFileDecoder::new())).unwrap();
    assert!(index.wait_until_ready(Duration::from_secs(10)));

    let sorted = index.list_monitors(Some(MonitorOrder::Site)).unwrap();
    assert_eq!(ids(&sorted), vec![("alpha", "M2"), ("Zulu", "M1")]);
    assert_eq!(index.list_monitors(None).unwrap().len(), 2);
}
