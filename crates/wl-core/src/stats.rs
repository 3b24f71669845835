//! Month statistics built from replayed ledgers.
//!
//! [`compute_stats`] folds a [`MonthView`] into a [`StatsReport`]: warnings,
//! today's ledger, the month total, goal projections and the optional
//! schedule comparison. The report holds numbers only; rendering it is up to
//! the caller.

use serde::Serialize;
use thiserror::Error;

use crate::ledger::{Balances, Ledger, Ongoing};
use crate::projection::{Basis, Projection, project};
use crate::replay::{Day, DayWarning, MonthView};
use crate::schedule::{Schedule, ScheduleReport, compare};
use crate::time::Minutes;

/// Errors from computing statistics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StatsError {
    /// A ratio was requested with nothing estimated to divide by.
    #[error("estimate/actual ratio is undefined: nothing estimated yet")]
    UndefinedRatio,

    /// A daily pace was requested over zero remaining days.
    #[error("remaining days must be at least 1")]
    ZeroRemainingDays,

    /// Today has recorded time but the schedule does not cover it.
    #[error("schedule has no entry for day {day}")]
    ScheduleMissingDay { day: Day },
}

/// Inputs of a stats computation besides the ledgers themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsRequest {
    pub today: Day,
    /// Month goals, in minutes.
    pub goals: Vec<Minutes>,
    /// Remaining work day counts, counting today.
    pub remaining_days: Option<Vec<u32>>,
    /// Remaining work day counts, not counting today.
    pub remaining_days_next: Option<Vec<u32>>,
    /// Work still planned for today.
    pub today_plan: Option<Minutes>,
    pub schedule: Option<Schedule>,
}

/// Read-only view of one ledger's balances and totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub checked_in: Balances,
    pub checked_out: Balances,
    pub pending_time: Minutes,
    pub checked_out_time: Minutes,
    pub total_time: Minutes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ongoing: Option<Ongoing>,
}

impl LedgerSummary {
    #[must_use]
    pub fn of(ledger: &Ledger) -> Self {
        Self {
            checked_in: ledger.checked_in().clone(),
            checked_out: ledger.checked_out().clone(),
            pending_time: ledger.pending_time(),
            checked_out_time: ledger.checked_out_time(),
            total_time: ledger.total_time(),
            ongoing: ledger.ongoing().cloned(),
        }
    }
}

/// Everything derived from a month of ledgers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    pub today: Day,
    pub warnings: Vec<DayWarning>,
    /// Today's ledger, absent when nothing was recorded today.
    pub today_summary: Option<LedgerSummary>,
    pub month_total: Minutes,
    pub projections: Vec<Projection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleReport>,
}

/// Computes the full report for `month` as of `request.today`.
///
/// Projections need at least one goal and `remaining_days`; the leaving-now
/// projection additionally needs `remaining_days_next`, and the
/// leaving-after-plan one needs `today_plan` on top of that.
pub fn compute_stats(
    month: &MonthView,
    request: &StatsRequest,
) -> Result<StatsReport, StatsError> {
    let today = request.today;
    let mut projections = Vec::new();

    let remaining_days = request
        .remaining_days
        .as_ref()
        .filter(|_| !request.goals.is_empty());
    if let Some(remaining_days) = remaining_days {
        projections.push(project(
            month,
            Basis::DayStart,
            today,
            &request.goals,
            remaining_days,
        )?);

        if let Some(remaining_days_next) = &request.remaining_days_next {
            projections.push(project(
                month,
                Basis::LeavingNow,
                today,
                &request.goals,
                remaining_days_next,
            )?);

            if let Some(plan) = request.today_plan {
                projections.push(project(
                    month,
                    Basis::LeavingAfterPlan { plan },
                    today,
                    &request.goals,
                    remaining_days_next,
                )?);
            }
        }
    }

    let schedule = request
        .schedule
        .as_ref()
        .map(|schedule| compare(month, schedule, today))
        .transpose()?;

    Ok(StatsReport {
        today,
        warnings: month.warnings(),
        today_summary: month.get(today).map(LedgerSummary::of),
        month_total: month.total_where(|_| true),
        projections,
        schedule,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::Weekday;

    use super::*;
    use crate::ledger::LedgerWarning;
    use crate::record;
    use crate::replay::replay_month;
    use crate::schedule::ScheduleDay;

    fn sample_month() -> MonthView {
        let mut days = BTreeMap::new();
        days.insert(
            1,
            vec![
                record!("start", "dev", "09:00"),
                record!("switch", "review", "12:00"),
                record!("stop", "13:00"),
                record!("checkout-all"),
            ],
        );
        days.insert(
            2,
            vec![
                record!("start", "dev", "10:00"),
                record!("push", "call", "11:00"),
                record!("pop", "11:30"),
                record!("stop", "14:30"),
            ],
        );
        days.insert(3, vec![record!("start", "dev", "09:00"), record!("stop", "11:00")]);
        replay_month(&days).unwrap()
    }

    #[test]
    fn test_month_total_and_today_summary() {
        let month = sample_month();
        let report = compute_stats(
            &month,
            &StatsRequest {
                today: 3,
                ..StatsRequest::default()
            },
        )
        .unwrap();

        assert_eq!(report.month_total, 240 + 270 + 120);
        assert!(report.warnings.is_empty());
        assert!(report.projections.is_empty());
        assert!(report.schedule.is_none());

        let today = report.today_summary.unwrap();
        assert_eq!(today.pending_time, 120);
        assert_eq!(today.checked_out_time, 0);
        assert_eq!(today.total_time, 120);
        assert_eq!(today.checked_in.get("dev"), Some(120));
    }

    #[test]
    fn test_no_work_today_has_no_summary() {
        let month = sample_month();
        let report = compute_stats(
            &month,
            &StatsRequest {
                today: 4,
                ..StatsRequest::default()
            },
        )
        .unwrap();
        assert!(report.today_summary.is_none());
    }

    #[test]
    fn test_projections_follow_available_inputs() {
        let month = sample_month();
        let mut request = StatsRequest {
            today: 3,
            goals: vec![20 * 60],
            remaining_days: Some(vec![3]),
            ..StatsRequest::default()
        };

        let report = compute_stats(&month, &request).unwrap();
        assert_eq!(report.projections.len(), 1);
        assert_eq!(report.projections[0].basis, Basis::DayStart);
        assert_eq!(report.projections[0].remaining, vec![1200 - 510]);
        assert_eq!(report.projections[0].paces[0].goals[0].required_per_day, 230);
        assert_eq!(report.projections[0].paces[0].goals[0].left_today, Some(110));

        request.today_plan = Some(60);
        assert_eq!(compute_stats(&month, &request).unwrap().projections.len(), 1);

        request.remaining_days_next = Some(vec![2]);
        let report = compute_stats(&month, &request).unwrap();
        let bases: Vec<_> = report.projections.iter().map(|p| p.basis).collect();
        assert_eq!(
            bases,
            vec![
                Basis::DayStart,
                Basis::LeavingNow,
                Basis::LeavingAfterPlan { plan: 60 },
            ]
        );
        assert_eq!(report.projections[1].remaining, vec![1200 - 630]);
        assert_eq!(report.projections[2].remaining, vec![1200 - 570]);

        request.goals.clear();
        assert!(compute_stats(&month, &request).unwrap().projections.is_empty());
    }

    #[test]
    fn test_schedule_is_compared_when_given() {
        let month = sample_month();
        let request = StatsRequest {
            today: 3,
            schedule: Some(Schedule {
                first_weekday: Weekday::Wed,
                days: vec![
                    ScheduleDay::new(240, ""),
                    ScheduleDay::new(300, "dentist"),
                    ScheduleDay::new(240, ""),
                    ScheduleDay::new(240, ""),
                ],
            }),
            ..StatsRequest::default()
        };

        let report = compute_stats(&month, &request).unwrap();
        let schedule = report.schedule.unwrap();
        assert_eq!(schedule.rows[1].note, "dentist");
        assert_eq!(schedule.rows[1].over_time, Some(-30));
        assert_eq!(schedule.estimation.estimated_passed, 540);
        assert_eq!(schedule.estimation.actual_passed, 510);
        assert!(schedule.with_today.is_some());
    }

    #[test]
    fn test_warnings_are_collected_per_day() {
        let mut days = BTreeMap::new();
        days.insert(1, vec![record!("start", "dev", "09:00")]);
        days.insert(2, vec![record!("dayleap")]);
        let month = replay_month(&days).unwrap();

        let report = compute_stats(
            &month,
            &StatsRequest {
                today: 2,
                ..StatsRequest::default()
            },
        )
        .unwrap();
        assert_eq!(
            report.warnings,
            vec![
                DayWarning {
                    day: 1,
                    warning: LedgerWarning::ActiveTask {
                        label: "dev".to_string(),
                        since: "09:00".parse().unwrap(),
                    },
                },
                DayWarning {
                    day: 2,
                    warning: LedgerWarning::UnusedLeaps { count: 1 },
                },
            ]
        );
    }

    #[test]
    fn test_stats_errors_abort_the_report() {
        let month = sample_month();
        let request = StatsRequest {
            today: 3,
            goals: vec![600],
            remaining_days: Some(vec![0]),
            ..StatsRequest::default()
        };
        assert_eq!(
            compute_stats(&month, &request),
            Err(StatsError::ZeroRemainingDays)
        );
    }
}
