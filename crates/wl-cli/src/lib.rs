//! Work log CLI library.
//!
//! This crate reads action logs and schedules from disk, layers
//! configuration, and renders the reports computed by `wl-core`.

mod cli;
pub mod commands;
mod config;
pub mod input;

pub use cli::{Cli, Commands, StatsArgs, SummaryArgs};
pub use config::Config;
