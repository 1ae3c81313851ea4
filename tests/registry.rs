//! Index Registry Tests
//!
//! One index per context token, closed explicitly.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use sidindex::config::IndexConfig;
use sidindex::index::{IndexError, IndexRegistry, RecordIndex};
use sidindex::record::{RecordDecoder, SidFileDecoder};
use tempfile::TempDir;

fn config(root: &Path, name: &str) -> IndexConfig {
    let data = root.join(name).join("data");
    fs::create_dir_all(&data).unwrap();
    IndexConfig::new(data, root.join(name).join("index"), root.join(name).join("logs"))
        .with_refresh_interval(Duration::from_secs(3600))
}

fn decoder() -> Arc<dyn RecordDecoder> {
    Arc::new(SidFileDecoder::new())
}

#[test]
fn test_open_or_get_returns_same_index() {
    let temp = TempDir::new().unwrap();
    let registry = IndexRegistry::new();

    let a = registry
        .open_or_get("ctx", config(temp.path(), "a"), decoder())
        .unwrap();
    let again = registry
        .open_or_get("ctx", config(temp.path(), "other"), decoder())
        .unwrap();

    assert!(Arc::ptr_eq(&a, &again));
    assert_eq!(registry.len(), 1);
    assert!(registry.get("ctx").is_some());
    assert!(registry.get("missing").is_none());
}

#[test]
fn test_close_invalidates_handles() {
    let temp = TempDir::new().unwrap();
    let registry = IndexRegistry::new();
    let index = registry
        .open_or_get("ctx", config(temp.path(), "a"), decoder())
        .unwrap();

    assert!(registry.close("ctx"));
    assert!(!registry.close("ctx"));
    assert!(registry.is_empty());

    let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert!(matches!(index.query_range(t, t), Err(IndexError::Closed)));
}

#[test]
fn test_reopen_after_close_gives_fresh_index() {
    let temp = TempDir::new().unwrap();
    let registry = IndexRegistry::new();
    let first = registry
        .open_or_get("ctx", config(temp.path(), "a"), decoder())
        .unwrap();
    registry.close("ctx");

    let second = registry
        .open_or_get("ctx", config(temp.path(), "a"), decoder())
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(second.wait_until_ready(Duration::from_secs(10)));
    assert!(first.is_closed());
    assert!(!second.is_closed());
}

#[test]
fn test_shared_index_dir_is_rejected() {
    let temp = TempDir::new().unwrap();
    let registry = IndexRegistry::new();
    registry
        .open_or_get("one", config(temp.path(), "a"), decoder())
        .unwrap();

    let err = registry
        .open_or_get("two", config(temp.path(), "a"), decoder())
        .unwrap_err();
    assert!(matches!(err, IndexError::Config(_)));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_close_all_closes_every_context() {
    let temp = TempDir::new().unwrap();
    let registry = IndexRegistry::new();
    let a = registry
        .open_or_get("a", config(temp.path(), "a"), decoder())
        .unwrap();
    let b = registry
        .open_or_get("b", config(temp.path(), "b"), decoder())
        .unwrap();

    registry.close_all();
    assert!(registry.is_empty());
    assert!(a.is_closed());
    assert!(b.is_closed());
}
