//! Reading the action log and schedule files.
//!
//! The log is a JSON object with an optional `today` and one action list per
//! day of the month:
//!
//! ```json
//! {"today": 12, "days": {"1": [["start", "dev", "09:00"], ["stop", "17:30"]]}}
//! ```
//!
//! The schedule lists planned work per day, day 1 first, with an optional
//! first weekday (0 = Monday):
//!
//! ```json
//! {"first_weekday": 0, "days": [["8h", ""], ["6h 30m", "dentist"]]}
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::Deserialize;
use wl_core::{ActionRecord, Day, Minutes, Schedule, ScheduleDay, parse_duration};

/// A parsed action log.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogFile {
    #[serde(default)]
    pub today: Option<Day>,
    pub days: BTreeMap<Day, Vec<ActionRecord>>,
}

#[derive(Debug, Deserialize)]
struct ScheduleFile {
    #[serde(default)]
    first_weekday: Option<u8>,
    days: Vec<(String, String)>,
}

/// Reads and parses the action log at `path`.
pub fn load_log(path: &Path) -> Result<LogFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read log file {}", path.display()))?;
    let log: LogFile = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse log file {}", path.display()))?;
    tracing::debug!(path = %path.display(), days = log.days.len(), "loaded log");
    Ok(log)
}

/// Reads the schedule at `path`.
///
/// `month_start` supplies the first weekday when the file does not.
pub fn load_schedule(path: &Path, month_start: NaiveDate) -> Result<Schedule> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read schedule file {}", path.display()))?;
    parse_schedule(&content, month_start)
        .with_context(|| format!("invalid schedule file {}", path.display()))
}

fn parse_schedule(content: &str, month_start: NaiveDate) -> Result<Schedule> {
    let file: ScheduleFile = serde_json::from_str(content)?;

    let first_weekday = match file.first_weekday {
        Some(index) => weekday_from_index(index)?,
        None => month_start.weekday(),
    };
    let days = file
        .days
        .into_iter()
        .enumerate()
        .map(|(index, (planned, note))| {
            let planned = parse_duration(&planned)
                .with_context(|| format!("bad planned time for day {}", index + 1))?;
            Ok(ScheduleDay::new(planned, note))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Schedule {
        first_weekday,
        days,
    })
}

fn weekday_from_index(index: u8) -> Result<Weekday> {
    if index >= 7 {
        anyhow::bail!("first_weekday must be between 0 (Monday) and 6 (Sunday), got {index}");
    }
    Ok((0..index).fold(Weekday::Mon, |weekday, _| weekday.succ()))
}

/// Parses a list of duration texts such as `["160h", "150h 30m"]`.
pub fn parse_durations(texts: &[String]) -> Result<Vec<Minutes>> {
    texts
        .iter()
        .map(|text| parse_duration(text).with_context(|| format!("invalid duration {text:?}")))
        .collect()
}

/// Today's local date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use wl_core::record;

    use super::*;

    #[test]
    fn parses_log_with_numeric_day_keys() {
        let log: LogFile = serde_json::from_str(
            r#"{
                "today": 2,
                "days": {
                    "1": [["start", "dev", "09:00"], ["stop", "10:00"]],
                    "2": [["checkin", "review", 45]]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(log.today, Some(2));
        assert_eq!(
            log.days[&1],
            vec![record!("start", "dev", "09:00"), record!("stop", "10:00")]
        );
        assert_eq!(log.days[&2], vec![record!("checkin", "review", 45_i64)]);
    }

    #[test]
    fn today_is_optional() {
        let log: LogFile = serde_json::from_str(r#"{"days": {}}"#).unwrap();
        assert_eq!(log.today, None);
        assert!(log.days.is_empty());
    }

    #[test]
    fn schedule_weekday_comes_from_file_or_month() {
        let june = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let schedule = parse_schedule(
            r#"{"first_weekday": 2, "days": [["8h", ""], ["6h 30m", "dentist"]]}"#,
            june,
        )
        .unwrap();
        assert_eq!(schedule.first_weekday, Weekday::Wed);
        assert_eq!(
            schedule.days,
            vec![ScheduleDay::new(480, ""), ScheduleDay::new(390, "dentist")]
        );

        let schedule = parse_schedule(r#"{"days": []}"#, june).unwrap();
        assert_eq!(schedule.first_weekday, Weekday::Sun);
    }

    #[test]
    fn schedule_rejects_bad_entries() {
        let june = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(parse_schedule(r#"{"first_weekday": 7, "days": []}"#, june).is_err());

        let err = parse_schedule(r#"{"days": [["8h", ""], ["8x", ""]]}"#, june).unwrap_err();
        assert_eq!(err.to_string(), "bad planned time for day 2");
    }

    #[test]
    fn month_start_is_the_first() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        assert_eq!(month_start(date), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn durations_are_parsed_in_order() {
        let texts = vec!["160h".to_string(), "2h 30m".to_string()];
        assert_eq!(parse_durations(&texts).unwrap(), vec![9600, 150]);
        assert!(parse_durations(&["soon".to_string()]).is_err());
    }
}
