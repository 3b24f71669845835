//! Remaining-time-to-goal projections.
//!
//! A projection counts the month's recorded time up to a cut-off day, takes
//! it away from each goal, and spreads what is left over a number of
//! remaining work days. Daily paces always round up so the projected pace
//! never falls short of the goal.

use serde::Serialize;

use crate::replay::{Day, MonthView};
use crate::stats::StatsError;
use crate::time::{Minutes, div_ceil};

/// Which moment of the day a projection is made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Basis {
    /// Before any work today: days strictly before today count.
    DayStart,
    /// Stopping now: today counts in full.
    LeavingNow,
    /// Stopping after `plan` more minutes of work today.
    LeavingAfterPlan { plan: Minutes },
}

impl Basis {
    /// The days that count, the day a pace applies to, and extra minutes
    /// treated as already worked.
    const fn window(self, today: Day) -> Window {
        match self {
            Self::DayStart => Window {
                day_limit: today,
                reference_day: today,
                extra: 0,
            },
            Self::LeavingNow => Window {
                day_limit: today.saturating_add(1),
                reference_day: today.saturating_add(1),
                extra: 0,
            },
            Self::LeavingAfterPlan { plan } => Window {
                day_limit: today,
                reference_day: today.saturating_add(1),
                extra: plan,
            },
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    /// Days strictly before this one are counted.
    day_limit: Day,
    reference_day: Day,
    extra: Minutes,
}

/// Daily pace needed to reach one goal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GoalPace {
    pub required_per_day: Minutes,
    /// What is still missing on the reference day, when it has recorded time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left_today: Option<Minutes>,
}

/// Paces for every goal over one remaining-days count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pace {
    pub remaining_days: u32,
    pub goals: Vec<GoalPace>,
}

/// One projection of the month towards its goals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Projection {
    pub basis: Basis,
    /// Recorded (plus planned) time that counts towards the goals.
    pub counted: Minutes,
    /// `goal - counted`, one entry per goal.
    pub remaining: Vec<Minutes>,
    pub paces: Vec<Pace>,
}

/// Minutes per day needed to cover `remaining` in `days` days, rounded up.
pub fn required_per_day(remaining: Minutes, days: u32) -> Result<Minutes, StatsError> {
    if days == 0 {
        return Err(StatsError::ZeroRemainingDays);
    }
    Ok(div_ceil(remaining, Minutes::from(days)))
}

/// Projects `month` towards `goals` from the point of view of `basis`.
pub fn project(
    month: &MonthView,
    basis: Basis,
    today: Day,
    goals: &[Minutes],
    remaining_days: &[u32],
) -> Result<Projection, StatsError> {
    let window = basis.window(today);
    let counted = month
        .total_where(|day| day < window.day_limit)
        .saturating_add(window.extra);
    let remaining: Vec<Minutes> = goals.iter().map(|goal| goal.saturating_sub(counted)).collect();

    let worked = month.day_total(window.reference_day);
    let paces = remaining_days
        .iter()
        .map(|&days| -> Result<Pace, StatsError> {
            let goals = remaining
                .iter()
                .map(|&left| -> Result<GoalPace, StatsError> {
                    let required_per_day = required_per_day(left, days)?;
                    Ok(GoalPace {
                        required_per_day,
                        left_today: (worked != 0).then(|| required_per_day.saturating_sub(worked)),
                    })
                })
                .collect::<Result<Vec<_>, StatsError>>()?;
            Ok(Pace {
                remaining_days: days,
                goals,
            })
        })
        .collect::<Result<Vec<_>, StatsError>>()?;

    tracing::debug!(?basis, counted, "projected month");
    Ok(Projection {
        basis,
        counted,
        remaining,
        paces,
    })
}
