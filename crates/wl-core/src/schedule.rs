//! Planned-vs-actual comparison against a per-day schedule.

use chrono::Weekday;
use serde::Serialize;

use crate::replay::{Day, MonthView};
use crate::stats::StatsError;
use crate::time::Minutes;

/// Planned work for one day of the month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleDay {
    pub planned: Minutes,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
}

impl ScheduleDay {
    pub fn new(planned: Minutes, note: impl Into<String>) -> Self {
        Self {
            planned,
            note: note.into(),
        }
    }
}

/// A month schedule: `days[0]` is day 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schedule {
    /// Weekday of day 1.
    pub first_weekday: Weekday,
    pub days: Vec<ScheduleDay>,
}

impl Schedule {
    /// Planned minutes for `day`, if the schedule covers it.
    #[must_use]
    pub fn planned(&self, day: Day) -> Option<Minutes> {
        let index = usize::try_from(day.checked_sub(1)?).ok()?;
        self.days.get(index).map(|entry| entry.planned)
    }

    /// Sum of all planned minutes.
    #[must_use]
    pub fn total_planned(&self) -> Minutes {
        self.days.iter().map(|entry| entry.planned).sum()
    }

    /// Schedule days with their day numbers and weekdays.
    pub fn iter(&self) -> impl Iterator<Item = (Day, Weekday, &ScheduleDay)> {
        let mut weekday = self.first_weekday;
        (1..).zip(self.days.iter()).map(move |(day, entry)| {
            let current = weekday;
            weekday = weekday.succ();
            (day, current, entry)
        })
    }
}

/// One schedule day next to what was actually recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleRow {
    pub day: Day,
    pub weekday: Weekday,
    pub planned: Minutes,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub note: String,
    /// Recorded total, when the day has a ledger.
    pub actual: Option<Minutes>,
    /// `actual - planned`, when the day has a ledger.
    pub over_time: Option<Minutes>,
    pub is_today: bool,
}

/// Month-level estimate versus actual figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Estimation {
    /// Sum of every planned day.
    pub estimated_total: Minutes,
    /// Actual time of passed days plus the plan for the rest.
    pub actual_total: Minutes,
    pub estimated_passed: Minutes,
    pub actual_passed: Minutes,
    /// `actual_passed - estimated_passed`.
    pub difference: Minutes,
    /// `actual_passed / estimated_passed`; absent when nothing was planned.
    pub ratio: Option<f64>,
    /// `estimated_total * ratio`, rounded up.
    pub progressive_estimate: Option<Minutes>,
}

impl Estimation {
    fn new(
        estimated_total: Minutes,
        actual_total: Minutes,
        estimated_passed: Minutes,
        actual_passed: Minutes,
    ) -> Self {
        let ratio = estimate_ratio(actual_passed, estimated_passed).ok();
        Self {
            estimated_total,
            actual_total,
            estimated_passed,
            actual_passed,
            difference: actual_passed.saturating_sub(estimated_passed),
            ratio,
            progressive_estimate: ratio.map(|ratio| progressive_estimate(estimated_total, ratio)),
        }
    }
}

/// The schedule section of a stats report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleReport {
    pub rows: Vec<ScheduleRow>,
    /// Passed days are the ones before today that have a ledger.
    pub estimation: Estimation,
    /// Same figures with today counted as passed; present when today has a
    /// ledger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub with_today: Option<Estimation>,
}

/// Ratio of actual to estimated time.
#[allow(clippy::cast_precision_loss)]
pub fn estimate_ratio(actual: Minutes, estimated: Minutes) -> Result<f64, StatsError> {
    if estimated == 0 {
        return Err(StatsError::UndefinedRatio);
    }
    Ok(actual as f64 / estimated as f64)
}

/// Projects the month total assuming the observed ratio holds, rounded up.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
#[must_use]
pub fn progressive_estimate(estimated_total: Minutes, ratio: f64) -> Minutes {
    (estimated_total as f64 * ratio).ceil() as Minutes
}

/// Compares `schedule` with the recorded month as of `today`.
pub fn compare(
    month: &MonthView,
    schedule: &Schedule,
    today: Day,
) -> Result<ScheduleReport, StatsError> {
    let rows = schedule
        .iter()
        .map(|(day, weekday, entry)| {
            let actual = month.get(day).map(crate::Ledger::total_time);
            ScheduleRow {
                day,
                weekday,
                planned: entry.planned,
                note: entry.note.clone(),
                actual,
                over_time: actual.map(|actual| actual.saturating_sub(entry.planned)),
                is_today: day == today,
            }
        })
        .collect::<Vec<_>>();

    let mut estimated_passed: Minutes = 0;
    let mut actual_passed: Minutes = 0;
    for row in &rows {
        if let Some(actual) = row.actual.filter(|_| row.day < today) {
            actual_passed = actual_passed.saturating_add(actual);
            estimated_passed += row.planned;
        }
    }
    let estimated_total = schedule.total_planned();
    let actual_total = actual_passed.saturating_add(estimated_total - estimated_passed);
    let estimation = Estimation::new(
        estimated_total,
        actual_total,
        estimated_passed,
        actual_passed,
    );

    let with_today = match month.get(today) {
        Some(ledger) => {
            let planned_today = schedule
                .planned(today)
                .ok_or(StatsError::ScheduleMissingDay { day: today })?;
            let worked_today = ledger.total_time();
            Some(Estimation::new(
                estimated_total,
                actual_total
                    .saturating_add(worked_today)
                    .saturating_sub(planned_today),
                estimated_passed + planned_today,
                actual_passed.saturating_add(worked_today),
            ))
        }
        None => None,
    };

    Ok(ScheduleReport {
        rows,
        estimation,
        with_today,
    })
}
