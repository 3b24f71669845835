//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Work log statistics.
///
/// Replays a month of recorded work actions and reports balances, goal
/// projections and how the month compares with a schedule.
#[derive(Debug, Parser)]
#[command(name = "wl", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show month statistics and goal projections.
    Stats(StatsArgs),

    /// Show the ledger of a single day.
    Summary(SummaryArgs),
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    /// Action log file (defaults to the configured `log_path`).
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Day of the month to report on (defaults to the log's `today`, then the
    /// current day).
    #[arg(long)]
    pub today: Option<u32>,

    /// Month goal, e.g. `160h`. Repeatable; overrides configured goals.
    #[arg(long = "goal", value_name = "DURATION")]
    pub goals: Vec<String>,

    /// Remaining work days, counting today. Repeatable.
    #[arg(long, value_name = "DAYS")]
    pub remaining_days: Vec<u32>,

    /// Remaining work days, not counting today. Repeatable.
    #[arg(long, value_name = "DAYS")]
    pub remaining_days_next: Vec<u32>,

    /// Work still planned for today, e.g. `2h 30m`.
    #[arg(long, value_name = "DURATION")]
    pub plan: Option<String>,

    /// Schedule file to compare the month against.
    #[arg(long)]
    pub schedule: Option<PathBuf>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SummaryArgs {
    /// Action log file (defaults to the configured `log_path`).
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// Day of the month to summarize (defaults to the log's `today`, then the
    /// current day).
    #[arg(long)]
    pub day: Option<u32>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}
