//! CLI module for sidindex
//!
//! Provides command-line interface for:
//! - scan: Run one scan and report
//! - query: Records overlapping a time range
//! - monitors: Known monitors, optionally sorted
//! - days: Days with data
//! - watch: Keep the index refreshing until Ctrl-C

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{days, monitors, parse_monitors, query, run, run_command, scan, watch};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{record_json, write_json_line, write_line, write_response};
