//! CLI command implementations
//!
//! Bucket files are scratch space, so every one-shot command opens a fresh
//! index, waits for the first scan, answers, and closes it again. `watch`
//! keeps an index refreshing until interrupted.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{record_json, write_json_line, write_line, write_response};
use crate::config::IndexConfig;
use crate::index::{FilesystemIndex, MonitorOrder, RecordIndex};
use crate::observability::{Logger, Severity};
use crate::record::{MonitorIdentity, SidFileDecoder};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    if cli.verbose {
        Logger::set_min_severity(Severity::Trace);
    }
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Scan { config, timeout } => scan(&config, timeout),
        Command::Query {
            config,
            start,
            end,
            monitors,
            timeout,
        } => query(&config, start, end, &monitors, timeout),
        Command::Monitors {
            config,
            order,
            timeout,
        } => monitors(&config, order, timeout),
        Command::Days {
            config,
            monitors,
            timeout,
        } => days(&config, &monitors, timeout),
        Command::Watch { config } => watch(&config),
    }
}

fn open(config_path: &Path) -> CliResult<FilesystemIndex> {
    let config = IndexConfig::load(config_path)?;
    Ok(FilesystemIndex::open(config, Arc::new(SidFileDecoder::new()))?)
}

fn open_ready(config_path: &Path, timeout_secs: u64) -> CliResult<FilesystemIndex> {
    let index = open(config_path)?;
    if !index.wait_until_ready(Duration::from_secs(timeout_secs)) {
        index.close();
        return Err(CliError::not_ready(timeout_secs));
    }
    Ok(index)
}

/// Parse `monitor$site$station` (or `monitor$site`) identifiers
pub fn parse_monitors(ids: &[String]) -> CliResult<Vec<MonitorIdentity>> {
    ids.iter()
        .map(|id| {
            MonitorIdentity::from_identifier(id).ok_or_else(|| {
                CliError::invalid_argument(format!(
                    "invalid monitor id '{}', expected monitor$site$station",
                    id
                ))
            })
        })
        .collect()
}

/// Run one scan and print what it found
pub fn scan(config_path: &Path, timeout_secs: u64) -> CliResult<()> {
    let index = open_ready(config_path, timeout_secs)?;
    let monitors = index.list_monitors(None)?.len();
    write_response(json!({
        "buckets": index.bucket_count(),
        "monitors": monitors,
        "metrics": index.metrics().snapshot(),
        "cache": index.cache_stats(),
    }))?;
    index.close();
    Ok(())
}

pub fn query(
    config_path: &Path,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    monitor_ids: &[String],
    timeout_secs: u64,
) -> CliResult<()> {
    let filter = parse_monitors(monitor_ids)?;
    let index = open_ready(config_path, timeout_secs)?;

    let records = index.query_range(start, end)?.filter_by_monitors(&filter);
    for record in &records {
        write_json_line(&record_json(record))?;
    }
    index.close();
    Ok(())
}

pub fn monitors(
    config_path: &Path,
    order: Option<MonitorOrder>,
    timeout_secs: u64,
) -> CliResult<()> {
    let index = open_ready(config_path, timeout_secs)?;
    for monitor in index.list_monitors(order)? {
        write_json_line(&serde_json::to_value(&monitor)?)?;
    }
    index.close();
    Ok(())
}

pub fn days(config_path: &Path, monitor_ids: &[String], timeout_secs: u64) -> CliResult<()> {
    let filter = parse_monitors(monitor_ids)?;
    let index = open_ready(config_path, timeout_secs)?;
    for day in index.days_with_data(&filter)? {
        write_line(&day.format("%Y-%m-%d").to_string())?;
    }
    index.close();
    Ok(())
}

/// Keep the index refreshing until Ctrl-C
pub fn watch(config_path: &Path) -> CliResult<()> {
    let index = open(config_path)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::io_error(format!("Failed to create tokio runtime: {}", e)))?;
    rt.block_on(async {
        tokio::signal::ctrl_c()
            .await
            .map_err(|e| CliError::io_error(format!("Failed to wait for Ctrl-C: {}", e)))
    })?;

    index.close();
    write_response(json!({
        "ready": index.is_ready(),
        "buckets": index.bucket_count(),
        "metrics": index.metrics().snapshot(),
        "cache": index.cache_stats(),
    }))
}
