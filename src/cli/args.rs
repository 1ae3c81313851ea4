//! CLI argument definitions using clap
//!
//! Commands:
//! - sidindex scan --config <path>
//! - sidindex query --config <path> --start <rfc3339> --end <rfc3339> [--monitor <id>]...
//! - sidindex monitors --config <path> [--order station|monitor|site|location]
//! - sidindex days --config <path> [--monitor <id>]...
//! - sidindex watch --config <path>

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::index::MonitorOrder;

/// sidindex - time-partitioned index of SID data files
#[derive(Parser, Debug)]
#[command(name = "sidindex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Log per-file detail to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run one scan and print the index metrics
    Scan {
        /// Path to configuration file
        #[arg(long, default_value = "./sidindex.json")]
        config: PathBuf,

        /// Seconds to wait for the first scan
        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Print every record overlapping [start, end) as JSON lines
    Query {
        #[arg(long, default_value = "./sidindex.json")]
        config: PathBuf,

        /// Range start, RFC 3339
        #[arg(long)]
        start: DateTime<Utc>,

        /// Range end (exclusive), RFC 3339
        #[arg(long)]
        end: DateTime<Utc>,

        /// Only records from this monitor (`monitor$site$station`); repeatable
        #[arg(long = "monitor")]
        monitors: Vec<String>,

        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Print every known monitor as JSON lines
    Monitors {
        #[arg(long, default_value = "./sidindex.json")]
        config: PathBuf,

        /// Sort order
        #[arg(long)]
        order: Option<MonitorOrder>,

        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Print every day with data, one `YYYY-MM-DD` per line
    Days {
        #[arg(long, default_value = "./sidindex.json")]
        config: PathBuf,

        /// Only days with data from this monitor; repeatable
        #[arg(long = "monitor")]
        monitors: Vec<String>,

        #[arg(long, default_value_t = 300)]
        timeout: u64,
    },

    /// Keep the index refreshing until Ctrl-C
    Watch {
        #[arg(long, default_value = "./sidindex.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
