//! Replaying action logs into ledgers.
//!
//! Each day is replayed into its own fresh [`Ledger`], in the order the
//! actions were recorded. Days never share state, so a month is replayed on
//! the rayon pool with one worker owning each ledger until it is published
//! into the [`MonthView`].

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::action::{Action, ActionError, ActionKind, ActionRecord};
use crate::ledger::{Ledger, LedgerError, LedgerWarning};
use crate::time::Minutes;

/// Day number within a month, starting at 1.
pub type Day = u32;

/// Errors from replaying an action log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReplayError {
    /// The record at `index` is malformed.
    #[error("invalid action at index {index}")]
    InvalidAction {
        index: usize,
        #[source]
        source: ActionError,
    },

    /// The ledger rejected the action at `index`.
    #[error("{kind} at index {index} failed")]
    Rejected {
        index: usize,
        kind: ActionKind,
        #[source]
        source: LedgerError,
    },

    /// Replaying one day of a month failed.
    #[error("day {day} could not be replayed")]
    Day {
        day: Day,
        #[source]
        source: Box<ReplayError>,
    },
}

/// Replays one ordered action list into a fresh ledger.
///
/// Any invalid or rejected action aborts the whole replay; the partially
/// built ledger is dropped.
pub fn replay_day(actions: &[ActionRecord]) -> Result<Ledger, ReplayError> {
    let ledger = replay_actions(actions)?;
    for warning in ledger.warnings() {
        tracing::warn!(%warning, "ledger warning");
    }
    Ok(ledger)
}

/// Replays every day of a month independently.
///
/// When several days fail, the error of the earliest one is returned.
pub fn replay_month(days: &BTreeMap<Day, Vec<ActionRecord>>) -> Result<MonthView, ReplayError> {
    let replayed: Vec<(Day, Result<Ledger, ReplayError>)> = days
        .par_iter()
        .map(|(day, actions)| (*day, replay_actions(actions)))
        .collect();

    let mut ledgers = BTreeMap::new();
    for (day, result) in replayed {
        let ledger = result.map_err(|source| ReplayError::Day {
            day,
            source: Box::new(source),
        })?;
        for warning in ledger.warnings() {
            tracing::warn!(day, %warning, "ledger warning");
        }
        ledgers.insert(day, ledger);
    }
    tracing::debug!(days = ledgers.len(), "replayed month");
    Ok(MonthView { ledgers })
}

fn replay_actions(actions: &[ActionRecord]) -> Result<Ledger, ReplayError> {
    tracing::debug!(actions = actions.len(), "replaying actions");
    let mut ledger = Ledger::new();
    for (index, record) in actions.iter().enumerate() {
        let action = Action::try_from(record)
            .map_err(|source| ReplayError::InvalidAction { index, source })?;
        action
            .apply(&mut ledger)
            .map_err(|source| ReplayError::Rejected {
                index,
                kind: action.kind(),
                source,
            })?;
    }
    Ok(ledger)
}

/// A warning raised by one day's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayWarning {
    pub day: Day,
    pub warning: LedgerWarning,
}

/// Read-only per-day ledgers for a month, ordered by day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonthView {
    ledgers: BTreeMap<Day, Ledger>,
}

impl MonthView {
    #[must_use]
    pub fn get(&self, day: Day) -> Option<&Ledger> {
        self.ledgers.get(&day)
    }

    /// Iterates in day order.
    pub fn iter(&self) -> impl Iterator<Item = (Day, &Ledger)> {
        self.ledgers.iter().map(|(day, ledger)| (*day, ledger))
    }

    /// Total recorded time of one day, zero when the day has no ledger.
    #[must_use]
    pub fn day_total(&self, day: Day) -> Minutes {
        self.get(day).map_or(0, Ledger::total_time)
    }

    /// Sum of the totals of every day matching `filter`.
    pub fn total_where(&self, filter: impl Fn(Day) -> bool) -> Minutes {
        self.iter()
            .filter(|(day, _)| filter(*day))
            .map(|(_, ledger)| ledger.total_time())
            .fold(0, Minutes::saturating_add)
    }

    /// Every ledger warning, tagged with its day, in day order.
    #[must_use]
    pub fn warnings(&self) -> Vec<DayWarning> {
        self.iter()
            .flat_map(|(day, ledger)| {
                ledger
                    .warnings()
                    .into_iter()
                    .map(move |warning| DayWarning { day, warning })
            })
            .collect()
    }
}

impl FromIterator<(Day, Ledger)> for MonthView {
    fn from_iter<T: IntoIterator<Item = (Day, Ledger)>>(iter: T) -> Self {
        Self {
            ledgers: iter.into_iter().collect(),
        }
    }
}
