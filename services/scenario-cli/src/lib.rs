//! Library half of `scenario-cli`: file loading and subcommand logic.

pub mod commands;
pub mod config;

pub use commands::{ApplyOptions, OutputFormat, StatsOptions};
