//! Per-day accounting state machine.
//!
//! A [`Ledger`] tracks pending ("checked in") and finalized ("checked out")
//! minutes per label, the single ongoing task, the number of pre-authorized
//! midnight crossings, and a stack of suspended tasks.
//!
//! # State machine
//!
//! The ongoing cursor is either idle or active. `start`/`pop_stop` go
//! idle → active, `stop`/`push_stop` go active → idle, and `switch`, `touch`,
//! `push` and `pop` close the current interval and open a new one at the same
//! time point.
//!
//! Every fallible operation validates before mutating, so a failed call
//! leaves the ledger exactly as it was.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::time::{Minutes, TimePoint};

/// Errors raised by ledger operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// A task was started while another one is running.
    #[error("{running} already running (since {since}), can't start {label} at {at}")]
    AlreadyRunning {
        running: String,
        since: TimePoint,
        label: String,
        at: TimePoint,
    },

    /// An operation needing an ongoing task was called while idle.
    #[error("no ongoing task to {operation}")]
    NotRunning { operation: NotRunningOp },

    /// A stop went backwards in time with no day leap available.
    #[error("not enough day leaps for period {since} - {until}")]
    UnauthorizedLeap { since: TimePoint, until: TimePoint },

    /// A pop found no suspended task.
    #[error("task stack is empty, nothing to resume at {at}")]
    EmptyStack { at: TimePoint },

    /// A label has no checked-in balance to act on.
    #[error("{label} has no checked-in time")]
    MissingLabel { label: String },

    /// A balance of `label` would leave the representable range.
    #[error("balance of {label} overflows")]
    Overflow { label: String },
}

/// The idle-state operation that failed, carrying its argument for
/// diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotRunningOp {
    Stop(TimePoint),
    Touch(TimePoint),
    Suspend(TimePoint),
    RemoveOngoing(Minutes),
    TransferOngoing(Minutes),
}

impl fmt::Display for NotRunningOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stop(at) => write!(f, "stop at {at}"),
            Self::Touch(at) => write!(f, "touch at {at}"),
            Self::Suspend(at) => write!(f, "suspend at {at}"),
            Self::RemoveOngoing(minutes) => write!(
                f,
                "remove {} from",
                crate::time::format_signed_duration(*minutes, false)
            ),
            Self::TransferOngoing(minutes) => write!(
                f,
                "transfer {} from",
                crate::time::format_signed_duration(*minutes, false)
            ),
        }
    }
}

/// Label-ordered minute balances with no zero entries.
///
/// A label absent from the map has a balance of zero; an update that lands
/// on exactly zero removes the entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Balances(BTreeMap<String, Minutes>);

impl Balances {
    /// Adds `delta` to `label`, dropping the entry if it becomes zero.
    pub fn add(&mut self, label: &str, delta: Minutes) -> Result<(), LedgerError> {
        let value = self.after(label, delta)?;
        self.set(label, value);
        Ok(())
    }

    /// The balance `label` would have after adding `delta`.
    fn after(&self, label: &str, delta: Minutes) -> Result<Minutes, LedgerError> {
        self.get(label)
            .unwrap_or(0)
            .checked_add(delta)
            .ok_or_else(|| overflow(label))
    }

    fn set(&mut self, label: &str, value: Minutes) {
        if value == 0 {
            self.0.remove(label);
        } else {
            self.0.insert(label.to_string(), value);
        }
    }

    /// The balance for `label`, if it is non-zero.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<Minutes> {
        self.0.get(label).copied()
    }

    /// Sum over all labels, saturating at the `Minutes` bounds.
    #[must_use]
    pub fn total(&self) -> Minutes {
        self.0
            .values()
            .fold(0, |total, &minutes| total.saturating_add(minutes))
    }

    /// Iterates in label order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Minutes)> {
        self.0.iter().map(|(label, minutes)| (label.as_str(), *minutes))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn overflow(label: &str) -> LedgerError {
    LedgerError::Overflow {
        label: label.to_string(),
    }
}

fn negated(label: &str, minutes: Minutes) -> Result<Minutes, LedgerError> {
    minutes.checked_neg().ok_or_else(|| overflow(label))
}

/// The task currently running and when it started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ongoing {
    pub label: String,
    pub since: TimePoint,
}

/// A likely operator mistake noticed at the end of a replay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerWarning {
    /// A task was never stopped.
    ActiveTask { label: String, since: TimePoint },
    /// Day leaps were authorized but not consumed.
    UnusedLeaps { count: u32 },
    /// Suspended tasks were never resumed, bottom of the stack first.
    NonEmptyStack { labels: Vec<String> },
}

impl fmt::Display for LedgerWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActiveTask { label, since } => {
                write!(f, "Active task (since {since}): {label}")
            }
            Self::UnusedLeaps { count } => write!(f, "{count} day leaps are not used"),
            Self::NonEmptyStack { labels } => {
                write!(f, "Task stack is not empty: {}", labels.join(", "))
            }
        }
    }
}

/// Accounting state for one day or one open-ended session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    checked_in: Balances,
    checked_out: Balances,
    ongoing: Option<Ongoing>,
    allowed_leaps: u32,
    task_stack: Vec<String>,
}

impl Ledger {
    /// Creates an empty, idle ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Balance operations ==========

    /// Adds pending time to `label`.
    pub fn checkin(&mut self, label: &str, minutes: Minutes) -> Result<(), LedgerError> {
        self.checked_in.add(label, minutes)
    }

    /// Subtracts pending time from `label`. The balance may go negative.
    pub fn remove(&mut self, label: &str, minutes: Minutes) -> Result<(), LedgerError> {
        self.checked_in.add(label, negated(label, minutes)?)
    }

    /// Moves `minutes` of `label` from pending to finalized.
    pub fn checkout(&mut self, label: &str, minutes: Minutes) -> Result<(), LedgerError> {
        let pending = self.checked_in.after(label, negated(label, minutes)?)?;
        let done = self.checked_out.after(label, minutes)?;
        self.checked_in.set(label, pending);
        self.checked_out.set(label, done);
        Ok(())
    }

    /// Finalizes the whole pending balance of `label`.
    pub fn checkout_one(&mut self, label: &str) -> Result<(), LedgerError> {
        let minutes = self.pending_balance(label)?;
        self.checkout(label, minutes)
    }

    /// Finalizes every pending balance, in label order.
    pub fn checkout_all(&mut self) -> Result<(), LedgerError> {
        let finalized = self
            .checked_in
            .iter()
            .map(|(label, minutes)| Ok((label.to_string(), self.checked_out.after(label, minutes)?)))
            .collect::<Result<Vec<_>, LedgerError>>()?;
        for (label, done) in finalized {
            self.checked_in.set(&label, 0);
            self.checked_out.set(&label, done);
        }
        Ok(())
    }

    /// Moves the whole pending balance of `label` to `new_label`.
    pub fn rename(&mut self, label: &str, new_label: &str) -> Result<(), LedgerError> {
        let minutes = self.pending_balance(label)?;
        if label == new_label {
            return Ok(());
        }
        let renamed = self.checked_in.after(new_label, minutes)?;
        self.checked_in.set(label, 0);
        self.checked_in.set(new_label, renamed);
        Ok(())
    }

    /// Moves pending time from `src` to `dst`.
    pub fn transfer_time(
        &mut self,
        src: &str,
        dst: &str,
        minutes: Minutes,
    ) -> Result<(), LedgerError> {
        let taken = negated(src, minutes)?;
        if src == dst {
            return Ok(());
        }
        let src_after = self.checked_in.after(src, taken)?;
        let dst_after = self.checked_in.after(dst, minutes)?;
        self.checked_in.set(src, src_after);
        self.checked_in.set(dst, dst_after);
        Ok(())
    }

    /// Moves pending time from the ongoing task to `dst`.
    pub fn transfer_time_ongoing(&mut self, dst: &str, minutes: Minutes) -> Result<(), LedgerError> {
        let src = self
            .running_label(NotRunningOp::TransferOngoing(minutes))?
            .to_string();
        self.transfer_time(&src, dst, minutes)
    }

    /// Subtracts pending time from the ongoing task.
    pub fn remove_ongoing(&mut self, minutes: Minutes) -> Result<(), LedgerError> {
        let label = self
            .running_label(NotRunningOp::RemoveOngoing(minutes))?
            .to_string();
        self.remove(&label, minutes)
    }

    // ========== Ongoing task operations ==========

    /// Starts `label` at `at`.
    pub fn start(&mut self, label: &str, at: TimePoint) -> Result<(), LedgerError> {
        self.ensure_idle(label, at)?;
        self.ongoing = Some(Ongoing {
            label: label.to_string(),
            since: at,
        });
        Ok(())
    }

    /// Stops the ongoing task at `at` and checks in the elapsed time.
    ///
    /// A stop earlier in the day than the start crosses midnight and consumes
    /// one allowed day leap.
    pub fn stop(&mut self, at: TimePoint) -> Result<(), LedgerError> {
        let elapsed = self.elapsed_until(NotRunningOp::Stop(at), at)?;
        self.close(at, elapsed);
        Ok(())
    }

    /// Stops the ongoing task and starts `label` at the same time point.
    pub fn switch(&mut self, label: &str, at: TimePoint) -> Result<(), LedgerError> {
        let elapsed = self.elapsed_until(NotRunningOp::Stop(at), at)?;
        self.close(at, elapsed);
        self.open(label, at);
        Ok(())
    }

    /// Checkpoints the ongoing task without changing its label.
    pub fn touch(&mut self, at: TimePoint) -> Result<(), LedgerError> {
        let label = self.running_label(NotRunningOp::Touch(at))?.to_string();
        let elapsed = self.elapsed_until(NotRunningOp::Touch(at), at)?;
        self.close(at, elapsed);
        self.open(&label, at);
        Ok(())
    }

    /// Pre-authorizes one midnight crossing.
    pub fn allow_leap(&mut self) {
        self.allowed_leaps += 1;
    }

    // ========== Task stack operations ==========

    /// Suspends the ongoing task and starts `label`.
    pub fn push(&mut self, label: &str, at: TimePoint) -> Result<(), LedgerError> {
        let outer = self.running_label(NotRunningOp::Suspend(at))?.to_string();
        let elapsed = self.elapsed_until(NotRunningOp::Suspend(at), at)?;
        self.task_stack.push(outer);
        self.close(at, elapsed);
        self.open(label, at);
        Ok(())
    }

    /// Suspends the ongoing task and goes idle.
    pub fn push_stop(&mut self, at: TimePoint) -> Result<(), LedgerError> {
        let outer = self.running_label(NotRunningOp::Suspend(at))?.to_string();
        let elapsed = self.elapsed_until(NotRunningOp::Suspend(at), at)?;
        self.task_stack.push(outer);
        self.close(at, elapsed);
        Ok(())
    }

    /// Stops the ongoing task and resumes the most recently suspended one.
    pub fn pop(&mut self, at: TimePoint) -> Result<(), LedgerError> {
        let Some(resumed) = self.task_stack.last().cloned() else {
            return Err(LedgerError::EmptyStack { at });
        };
        let elapsed = self.elapsed_until(NotRunningOp::Stop(at), at)?;
        self.task_stack.pop();
        self.close(at, elapsed);
        self.open(&resumed, at);
        Ok(())
    }

    /// Resumes the most recently suspended task from idle.
    pub fn pop_stop(&mut self, at: TimePoint) -> Result<(), LedgerError> {
        let Some(resumed) = self.task_stack.last() else {
            return Err(LedgerError::EmptyStack { at });
        };
        let resumed = resumed.clone();
        self.ensure_idle(&resumed, at)?;
        self.task_stack.pop();
        self.open(&resumed, at);
        Ok(())
    }

    /// Abandons every suspended task.
    pub fn drop_stack(&mut self) {
        self.task_stack.clear();
    }

    // ========== Accessors ==========

    #[must_use]
    pub const fn checked_in(&self) -> &Balances {
        &self.checked_in
    }

    #[must_use]
    pub const fn checked_out(&self) -> &Balances {
        &self.checked_out
    }

    #[must_use]
    pub const fn ongoing(&self) -> Option<&Ongoing> {
        self.ongoing.as_ref()
    }

    #[must_use]
    pub const fn allowed_leaps(&self) -> u32 {
        self.allowed_leaps
    }

    /// Suspended labels, bottom of the stack first.
    #[must_use]
    pub fn task_stack(&self) -> &[String] {
        &self.task_stack
    }

    /// Sum of all checked-in balances.
    #[must_use]
    pub fn pending_time(&self) -> Minutes {
        self.checked_in.total()
    }

    /// Sum of all checked-out balances.
    #[must_use]
    pub fn checked_out_time(&self) -> Minutes {
        self.checked_out.total()
    }

    /// Pending plus checked-out time.
    #[must_use]
    pub fn total_time(&self) -> Minutes {
        self.pending_time().saturating_add(self.checked_out_time())
    }

    /// Leftover state that usually means a forgotten stop or pop.
    #[must_use]
    pub fn warnings(&self) -> Vec<LedgerWarning> {
        let mut warnings = Vec::new();
        if let Some(ongoing) = &self.ongoing {
            warnings.push(LedgerWarning::ActiveTask {
                label: ongoing.label.clone(),
                since: ongoing.since,
            });
        }
        if self.allowed_leaps != 0 {
            warnings.push(LedgerWarning::UnusedLeaps {
                count: self.allowed_leaps,
            });
        }
        if !self.task_stack.is_empty() {
            warnings.push(LedgerWarning::NonEmptyStack {
                labels: self.task_stack.clone(),
            });
        }
        warnings
    }

    // ========== Internals ==========

    fn pending_balance(&self, label: &str) -> Result<Minutes, LedgerError> {
        self.checked_in
            .get(label)
            .ok_or_else(|| LedgerError::MissingLabel {
                label: label.to_string(),
            })
    }

    fn running_label(&self, operation: NotRunningOp) -> Result<&str, LedgerError> {
        self.ongoing
            .as_ref()
            .map(|ongoing| ongoing.label.as_str())
            .ok_or(LedgerError::NotRunning { operation })
    }

    fn ensure_idle(&self, label: &str, at: TimePoint) -> Result<(), LedgerError> {
        match &self.ongoing {
            Some(ongoing) => Err(LedgerError::AlreadyRunning {
                running: ongoing.label.clone(),
                since: ongoing.since,
                label: label.to_string(),
                at,
            }),
            None => Ok(()),
        }
    }

    /// The ongoing task's pending balance once the interval up to `at` is
    /// added, and whether a day leap is needed to get there.
    fn elapsed_until(
        &self,
        operation: NotRunningOp,
        at: TimePoint,
    ) -> Result<Elapsed, LedgerError> {
        let Some(ongoing) = &self.ongoing else {
            return Err(LedgerError::NotRunning { operation });
        };
        let mut minutes = i64::from(at.minutes()) - i64::from(ongoing.since.minutes());
        let leap = minutes < 0;
        if leap {
            if self.allowed_leaps == 0 {
                return Err(LedgerError::UnauthorizedLeap {
                    since: ongoing.since,
                    until: at,
                });
            }
            minutes += i64::from(crate::time::MINUTES_PER_DAY);
        }
        Ok(Elapsed {
            balance: self.checked_in.after(&ongoing.label, minutes)?,
            leap,
        })
    }

    fn close(&mut self, at: TimePoint, elapsed: Elapsed) {
        if let Some(ongoing) = self.ongoing.take() {
            if elapsed.leap {
                self.allowed_leaps -= 1;
                tracing::debug!(label = %ongoing.label, %at, "interval crossed midnight");
            }
            self.checked_in.set(&ongoing.label, elapsed.balance);
        }
    }

    fn open(&mut self, label: &str, at: TimePoint) {
        self.ongoing = Some(Ongoing {
            label: label.to_string(),
            since: at,
        });
    }
}

#[derive(Debug, Clone, Copy)]
struct Elapsed {
    /// Pending balance of the ongoing label after closing.
    balance: Minutes,
    leap: bool,
}
