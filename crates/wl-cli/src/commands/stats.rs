//! `wl stats`: month totals, goal projections and schedule comparison.

use std::fmt::Write;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use wl_core::projection::Pace;
use wl_core::schedule::Estimation;
use wl_core::{
    Basis, Day, Projection, ScheduleReport, StatsReport, StatsRequest, compute_stats,
    format_duration, format_signed_duration, parse_duration, replay_month,
};

use crate::cli::StatsArgs;
use crate::config::Config;
use crate::input::{LogFile, load_log, load_schedule, local_today, month_start, parse_durations};

/// Combines command-line flags, configuration and the log into a request.
///
/// Flags win over configuration; `date` fills in what neither provides.
pub fn build_request(
    args: &StatsArgs,
    config: &Config,
    log: &LogFile,
    date: NaiveDate,
) -> Result<StatsRequest> {
    let goals = if args.goals.is_empty() {
        &config.goals
    } else {
        &args.goals
    };
    let remaining_days = if args.remaining_days.is_empty() {
        config.remaining_days.clone()
    } else {
        Some(args.remaining_days.clone())
    };
    let remaining_days_next = if args.remaining_days_next.is_empty() {
        config.remaining_days_next.clone()
    } else {
        Some(args.remaining_days_next.clone())
    };
    let today_plan = args
        .plan
        .as_deref()
        .map(|plan| parse_duration(plan).with_context(|| format!("invalid plan {plan:?}")))
        .transpose()?;
    let schedule = args
        .schedule
        .as_deref()
        .or(config.schedule_path.as_deref())
        .map(|path| load_schedule(path, month_start(date)))
        .transpose()?;

    Ok(StatsRequest {
        today: super::resolve_day(args.today, log, date)?,
        goals: parse_durations(goals).context("invalid goal")?,
        remaining_days,
        remaining_days_next,
        today_plan,
        schedule,
    })
}

fn write_projection(output: &mut String, today: Day, projection: &Projection) {
    let annotation = match projection.basis {
        Basis::DayStart => format!("At the {today} day start"),
        Basis::LeavingNow => "Leaving now".to_string(),
        Basis::LeavingAfterPlan { plan } => format!("Leaving after {}", format_duration(plan)),
    };
    let remaining = projection
        .remaining
        .iter()
        .map(|&minutes| format_signed_duration(minutes, false))
        .collect::<Vec<_>>()
        .join(" / ");
    writeln!(output, "{annotation}: {remaining} remaining for this month").unwrap();

    for pace in &projection.paces {
        write_pace(output, pace);
    }
}

fn write_pace(output: &mut String, pace: &Pace) {
    let per_goal = pace
        .goals
        .iter()
        .map(|goal| {
            let required = format_signed_duration(goal.required_per_day, false);
            match goal.left_today {
                Some(left) => format!("{required} ({} left)", format_signed_duration(left, false)),
                None => required,
            }
        })
        .collect::<Vec<_>>()
        .join(" / ");
    writeln!(
        output,
        "Average work time for {} days: {per_goal}",
        pace.remaining_days
    )
    .unwrap();
}

fn write_estimation(output: &mut String, suffix: &str, estimation: &Estimation) {
    writeln!(
        output,
        "Estimation month time{suffix}: {} -> {} / {} -> {} {}",
        format_duration(estimation.estimated_total),
        format_signed_duration(estimation.actual_total, false),
        format_duration(estimation.estimated_passed),
        format_signed_duration(estimation.actual_passed, false),
        format_signed_duration(estimation.difference, true),
    )
    .unwrap();
}

fn write_ratio(output: &mut String, suffix: &str, estimation: &Estimation) {
    if let (Some(ratio), Some(progressive)) = (estimation.ratio, estimation.progressive_estimate)
    {
        writeln!(output, "Estimation-start ratio{suffix}: {ratio:.4}").unwrap();
        writeln!(
            output,
            "Progressive estimation{suffix}: {}",
            format_duration(progressive)
        )
        .unwrap();
    }
}

fn write_schedule(output: &mut String, schedule: &ScheduleReport) {
    for row in &schedule.rows {
        let marker = if row.is_today { "> " } else { "" };
        write!(
            output,
            "{marker}Day {} ({}): {}",
            row.day,
            row.weekday,
            format_duration(row.planned)
        )
        .unwrap();
        if let (Some(actual), Some(over_time)) = (row.actual, row.over_time) {
            write!(
                output,
                " -> {} {}",
                format_signed_duration(actual, false),
                format_signed_duration(over_time, true)
            )
            .unwrap();
        }
        if !row.note.is_empty() {
            write!(output, " (note: {})", row.note).unwrap();
        }
        writeln!(output).unwrap();
    }

    write_estimation(output, "", &schedule.estimation);
    if let Some(with_today) = &schedule.with_today {
        write_estimation(output, " (with today)", with_today);
    }
    write_ratio(output, "", &schedule.estimation);
    if let Some(with_today) = &schedule.with_today {
        write_ratio(output, " (with today)", with_today);
    }
}

/// Formats the human-readable stats report.
pub fn format_stats(report: &StatsReport) -> String {
    let mut output = String::new();

    if !report.warnings.is_empty() {
        for entry in &report.warnings {
            writeln!(output, "Day {} warning: {}", entry.day, entry.warning).unwrap();
        }
        writeln!(output).unwrap();
    }

    match &report.today_summary {
        Some(ledger) => super::summary::write_ledger(&mut output, ledger),
        None => writeln!(output, "No work today").unwrap(),
    }

    #[allow(clippy::cast_precision_loss)]
    let hours = report.month_total as f64 / 60.0;
    writeln!(output).unwrap();
    writeln!(
        output,
        "Total time for month: {} ({hours:.2}h)",
        format_signed_duration(report.month_total, false)
    )
    .unwrap();

    for projection in &report.projections {
        writeln!(output).unwrap();
        write_projection(&mut output, report.today, projection);
    }

    if let Some(schedule) = &report.schedule {
        writeln!(output).unwrap();
        write_schedule(&mut output, schedule);
    }

    output
}

/// Runs the stats command.
pub fn run(args: &StatsArgs, config: &Config) -> Result<()> {
    let path = args.log.as_deref().unwrap_or(&config.log_path);
    let log = load_log(path)?;
    let request = build_request(args, config, &log, local_today())?;
    tracing::debug!(today = request.today, goals = ?request.goals, "computing stats");

    let month = replay_month(&log.days)
        .with_context(|| format!("failed to replay {}", path.display()))?;
    let report = compute_stats(&month, &request).context("failed to compute stats")?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_stats(&report));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use chrono::Weekday;
    use insta::assert_snapshot;
    use wl_core::{Schedule, ScheduleDay, record};

    use super::*;

    fn sample_log() -> LogFile {
        LogFile {
            today: Some(3),
            days: BTreeMap::from([
                (
                    1,
                    vec![
                        record!("start", "dev", "09:00"),
                        record!("switch", "review", "12:00"),
                        record!("stop", "13:00"),
                        record!("checkout-all"),
                    ],
                ),
                (
                    2,
                    vec![
                        record!("start", "dev", "10:00"),
                        record!("push", "call", "11:00"),
                        record!("pop", "11:30"),
                        record!("stop", "14:30"),
                    ],
                ),
                (
                    3,
                    vec![record!("start", "dev", "09:00"), record!("stop", "11:00")],
                ),
            ]),
        }
    }

    fn empty_args() -> StatsArgs {
        StatsArgs {
            log: None,
            today: None,
            goals: vec![],
            remaining_days: vec![],
            remaining_days_next: vec![],
            plan: None,
            schedule: None,
            json: false,
        }
    }

    fn config() -> Config {
        Config {
            log_path: PathBuf::from("log.json"),
            schedule_path: None,
            goals: vec!["100h".to_string()],
            remaining_days: Some(vec![10]),
            remaining_days_next: None,
        }
    }

    fn june() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 17).unwrap()
    }

    #[test]
    fn test_request_falls_back_to_config() {
        let request = build_request(&empty_args(), &config(), &sample_log(), june()).unwrap();
        assert_eq!(request.today, 3);
        assert_eq!(request.goals, vec![6000]);
        assert_eq!(request.remaining_days, Some(vec![10]));
        assert_eq!(request.remaining_days_next, None);
        assert_eq!(request.today_plan, None);
        assert!(request.schedule.is_none());
    }

    #[test]
    fn test_flags_override_config() {
        let args = StatsArgs {
            today: Some(2),
            goals: vec!["20h".to_string(), "1h 30m".to_string()],
            remaining_days: vec![3, 2],
            remaining_days_next: vec![1],
            plan: Some("2h".to_string()),
            ..empty_args()
        };
        let request = build_request(&args, &config(), &sample_log(), june()).unwrap();
        assert_eq!(request.today, 2);
        assert_eq!(request.goals, vec![1200, 90]);
        assert_eq!(request.remaining_days, Some(vec![3, 2]));
        assert_eq!(request.remaining_days_next, Some(vec![1]));
        assert_eq!(request.today_plan, Some(120));
    }

    #[test]
    fn test_bad_goal_is_reported() {
        let args = StatsArgs {
            goals: vec!["lots".to_string()],
            ..empty_args()
        };
        let err = build_request(&args, &config(), &sample_log(), june()).unwrap_err();
        assert_eq!(err.to_string(), "invalid goal");
    }

    #[test]
    fn test_stats_full_report() {
        let request = StatsRequest {
            today: 3,
            goals: vec![1200],
            remaining_days: Some(vec![3]),
            remaining_days_next: Some(vec![2]),
            today_plan: Some(60),
            schedule: Some(Schedule {
                first_weekday: Weekday::Wed,
                days: vec![
                    ScheduleDay::new(240, ""),
                    ScheduleDay::new(300, "dentist"),
                    ScheduleDay::new(240, ""),
                    ScheduleDay::new(240, ""),
                ],
            }),
        };
        let month = replay_month(&sample_log().days).unwrap();
        let report = compute_stats(&month, &request).unwrap();

        assert_snapshot!(format_stats(&report), @r"
        Pending tasks:
        dev - 2h 0m

        Checked out: 0m
        Pending time: 2h 0m
        Total time: 2h 0m

        Total time for month: 10h 30m (10.50h)

        At the 3 day start: 11h 30m remaining for this month
        Average work time for 3 days: 3h 50m (1h 50m left)

        Leaving now: 9h 30m remaining for this month
        Average work time for 2 days: 4h 45m

        Leaving after 1h 0m: 10h 30m remaining for this month
        Average work time for 2 days: 5h 15m

        Day 1 (Wed): 4h 0m -> 4h 0m +(0m)
        Day 2 (Thu): 5h 0m -> 4h 30m -(30m) (note: dentist)
        > Day 3 (Fri): 4h 0m -> 2h 0m -(2h 0m)
        Day 4 (Sat): 4h 0m
        Estimation month time: 17h 0m -> 16h 30m / 9h 0m -> 8h 30m -(30m)
        Estimation month time (with today): 17h 0m -> 14h 30m / 13h 0m -> 10h 30m -(2h 30m)
        Estimation-start ratio: 0.9444
        Progressive estimation: 16h 4m
        Estimation-start ratio (with today): 0.8077
        Progressive estimation (with today): 13h 44m
        ");
    }

    #[test]
    fn test_stats_warnings_and_no_work_today() {
        let days = BTreeMap::from([(1, vec![record!("start", "dev", "09:00")])]);
        let month = replay_month(&days).unwrap();
        let request = StatsRequest {
            today: 2,
            ..StatsRequest::default()
        };
        let report = compute_stats(&month, &request).unwrap();

        assert_snapshot!(format_stats(&report), @r"
        Day 1 warning: Active task (since 09:00): dev

        No work today

        Total time for month: 0m (0.00h)
        ");
    }

    #[test]
    fn test_stats_json_has_projection_bases() {
        let request = StatsRequest {
            today: 3,
            goals: vec![1200],
            remaining_days: Some(vec![3]),
            remaining_days_next: Some(vec![2]),
            ..StatsRequest::default()
        };
        let month = replay_month(&sample_log().days).unwrap();
        let report = compute_stats(&month, &request).unwrap();
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();

        assert_eq!(json["month_total"], 630);
        assert_eq!(json["projections"][0]["basis"]["kind"], "day_start");
        assert_eq!(json["projections"][1]["basis"]["kind"], "leaving_now");
        assert_eq!(json["projections"][0]["remaining"][0], 690);
        assert_eq!(json["today_summary"]["checked_in"]["dev"], 120);
        assert!(json.get("schedule").is_none());
    }
}
