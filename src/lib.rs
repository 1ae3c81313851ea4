//! sidindex - a time-partitioned index of SID measurement files
//!
//! Scans a directory tree of data files, files each one under every UTC
//! day it covers, and answers range queries from per-day buckets instead
//! of re-walking the tree.

pub mod bucket;
pub mod cache;
pub mod calendar;
pub mod cli;
pub mod config;
pub mod index;
pub mod observability;
pub mod record;
pub mod scanner;
