//! Core accounting engine for the work log.
//!
//! This crate contains:
//! - Time primitives: minute durations and `HH:MM` clock points
//! - Ledger: the per-day state machine for pending and finalized time
//! - Actions: typed dispatch of recorded log entries onto a ledger
//! - Replay: building one ledger per day, and a month view of them
//! - Stats: month totals, goal projections and schedule comparison

pub mod action;
pub mod ledger;
pub mod projection;
pub mod replay;
pub mod schedule;
pub mod stats;
pub mod time;

pub use action::{Action, ActionError, ActionKind, ActionRecord, Arg};
pub use ledger::{Balances, Ledger, LedgerError, LedgerWarning, Ongoing};
pub use projection::{Basis, Projection};
pub use replay::{Day, DayWarning, MonthView, ReplayError, replay_day, replay_month};
pub use schedule::{Schedule, ScheduleDay, ScheduleReport};
pub use stats::{LedgerSummary, StatsError, StatsReport, StatsRequest, compute_stats};
pub use time::{
    Minutes, ParseError, TimePoint, format_duration, format_signed_duration, parse_duration,
};
