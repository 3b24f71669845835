//! CLI subcommand implementations.

pub mod stats;
pub mod summary;

use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDate};
use wl_core::Day;

use crate::input::LogFile;

/// Picks the day to report on: an explicit flag, then the log's `today`,
/// then the current day of the month.
fn resolve_day(explicit: Option<Day>, log: &LogFile, date: NaiveDate) -> Result<Day> {
    let day = explicit.or(log.today).unwrap_or_else(|| date.day());
    if !(1..=31).contains(&day) {
        bail!("day {day} is not a day of the month");
    }
    Ok(day)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn test_explicit_day_wins_over_log_and_calendar() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        let mut log = LogFile {
            today: Some(9),
            days: BTreeMap::new(),
        };

        assert_eq!(resolve_day(Some(3), &log, date).unwrap(), 3);
        assert_eq!(resolve_day(None, &log, date).unwrap(), 9);
        log.today = None;
        assert_eq!(resolve_day(None, &log, date).unwrap(), 17);
    }

    #[test]
    fn test_days_outside_the_month_are_rejected() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 17).unwrap();
        let log = LogFile {
            today: Some(u32::MAX),
            days: BTreeMap::new(),
        };

        assert!(resolve_day(Some(0), &log, date).is_err());
        assert!(resolve_day(Some(32), &log, date).is_err());
        let err = resolve_day(None, &log, date).unwrap_err();
        assert_eq!(err.to_string(), "day 4294967295 is not a day of the month");
        assert_eq!(resolve_day(Some(31), &log, date).unwrap(), 31);
    }
}
