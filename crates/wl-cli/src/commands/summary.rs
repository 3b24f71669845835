//! `wl summary`: the ledger of a single day.

use std::fmt::Write;

use anyhow::{Context, Result};
use serde::Serialize;
use wl_core::{
    Balances, Day, LedgerSummary, LedgerWarning, format_signed_duration, replay_day,
};

use crate::cli::SummaryArgs;
use crate::config::Config;
use crate::input::{LogFile, load_log, local_today};

/// One replayed day, ready for display.
#[derive(Debug, Serialize)]
pub struct DaySummary {
    pub day: Day,
    pub warnings: Vec<LedgerWarning>,
    pub ledger: LedgerSummary,
}

/// Replays `day` from `log`.
pub fn summarize(log: &LogFile, day: Day) -> Result<DaySummary> {
    let actions = log
        .days
        .get(&day)
        .with_context(|| format!("no actions recorded for day {day}"))?;
    let ledger = replay_day(actions).with_context(|| format!("failed to replay day {day}"))?;
    Ok(DaySummary {
        day,
        warnings: ledger.warnings(),
        ledger: LedgerSummary::of(&ledger),
    })
}

fn write_balances(output: &mut String, title: &str, balances: &Balances) {
    writeln!(output, "{title}:").unwrap();
    for (label, minutes) in balances.iter() {
        writeln!(output, "{label} - {}", format_signed_duration(minutes, false)).unwrap();
    }
    writeln!(output).unwrap();
}

/// Writes pending and checked-out balances followed by the totals.
pub(crate) fn write_ledger(output: &mut String, ledger: &LedgerSummary) {
    if !ledger.checked_in.is_empty() {
        write_balances(output, "Pending tasks", &ledger.checked_in);
    }
    if !ledger.checked_out.is_empty() {
        write_balances(output, "Checked out tasks", &ledger.checked_out);
    }

    writeln!(
        output,
        "Checked out: {}",
        format_signed_duration(ledger.checked_out_time, false)
    )
    .unwrap();
    writeln!(
        output,
        "Pending time: {}",
        format_signed_duration(ledger.pending_time, false)
    )
    .unwrap();
    writeln!(
        output,
        "Total time: {}",
        format_signed_duration(ledger.total_time, false)
    )
    .unwrap();
}

/// Formats the human-readable day summary.
pub fn format_summary(summary: &DaySummary) -> String {
    let mut output = String::new();

    if !summary.warnings.is_empty() {
        for warning in &summary.warnings {
            writeln!(output, "{warning}").unwrap();
        }
        writeln!(output).unwrap();
    }

    write_ledger(&mut output, &summary.ledger);
    output
}

/// Runs the summary command.
pub fn run(args: &SummaryArgs, config: &Config) -> Result<()> {
    let path = args.log.as_deref().unwrap_or(&config.log_path);
    let log = load_log(path)?;
    let day = super::resolve_day(args.day, &log, local_today())?;
    let summary = summarize(&log, day)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", format_summary(&summary));
    }
    Ok(())
}
