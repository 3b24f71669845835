//! Action records and their dispatch onto a [`Ledger`].
//!
//! An action log stores each action as a tagged record such as
//! `["switch", "review", "10:30"]`. [`ActionRecord`] is that raw shape;
//! [`Action`] is the checked, fully typed form. Conversion happens once, and
//! [`Action::apply`] then maps each variant onto a ledger operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ledger::{Ledger, LedgerError};
use crate::time::{Minutes, ParseError, TimePoint, check_duration, parse_duration};

/// Errors from turning a raw record into an [`Action`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The kind tag is not one of the known action kinds.
    #[error("unknown action kind: {0}")]
    UnknownActionKind(String),

    /// The record has the wrong number of arguments for its kind.
    #[error("{kind} takes {expected} argument(s), got {actual}")]
    ArityMismatch {
        kind: ActionKind,
        expected: usize,
        actual: usize,
    },

    /// An argument has the wrong type.
    #[error("argument {index} of {kind} must be {expected}")]
    InvalidArgumentType {
        kind: ActionKind,
        index: usize,
        expected: &'static str,
    },

    /// A text duration or time point failed to parse.
    #[error(transparent)]
    Parse(#[from] ParseError),
}

/// The closed set of action kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Start,
    Stop,
    Switch,
    Push,
    PushStop,
    Pop,
    PopStop,
    Checkin,
    Checkout,
    CheckoutOne,
    CheckoutAll,
    DayLeap,
    Remove,
    RemoveOngoing,
    TransferTime,
    TransferTimeOngoing,
    Touch,
    Rename,
    DropStack,
}

impl ActionKind {
    /// Every kind, in log vocabulary order.
    pub const ALL: [Self; 19] = [
        Self::Start,
        Self::Stop,
        Self::Switch,
        Self::Push,
        Self::PushStop,
        Self::Pop,
        Self::PopStop,
        Self::Checkin,
        Self::Checkout,
        Self::CheckoutOne,
        Self::CheckoutAll,
        Self::DayLeap,
        Self::Remove,
        Self::RemoveOngoing,
        Self::TransferTime,
        Self::TransferTimeOngoing,
        Self::Touch,
        Self::Rename,
        Self::DropStack,
    ];

    /// The tag used in action logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Switch => "switch",
            Self::Push => "push",
            Self::PushStop => "push-stop",
            Self::Pop => "pop",
            Self::PopStop => "pop-stop",
            Self::Checkin => "checkin",
            Self::Checkout => "checkout",
            Self::CheckoutOne => "checkout-one",
            Self::CheckoutAll => "checkout-all",
            Self::DayLeap => "dayleap",
            Self::Remove => "remove",
            Self::RemoveOngoing => "remove-ongoing",
            Self::TransferTime => "transfer-time",
            Self::TransferTimeOngoing => "transfer-time-ongoing",
            Self::Touch => "touch",
            Self::Rename => "rename",
            Self::DropStack => "drop-stack",
        }
    }

    /// Number of arguments following the kind tag.
    #[must_use]
    pub const fn arity(&self) -> usize {
        match self {
            Self::CheckoutAll | Self::DayLeap | Self::DropStack => 0,
            Self::Stop
            | Self::PushStop
            | Self::Pop
            | Self::PopStop
            | Self::CheckoutOne
            | Self::RemoveOngoing
            | Self::Touch => 1,
            Self::Start
            | Self::Switch
            | Self::Push
            | Self::Checkin
            | Self::Checkout
            | Self::Remove
            | Self::TransferTimeOngoing
            | Self::Rename => 2,
            Self::TransferTime => 3,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ActionError::UnknownActionKind(s.to_string()))
    }
}

/// A raw action argument.
///
/// Durations and time points arrive either as integers (minutes, used as-is)
/// or as text to parse. Labels must be text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Arg {
    Int(i64),
    Text(String),
    /// Anything else the log contained; never valid.
    Other(serde_json::Value),
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<i64> for Arg {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<serde_json::Value> for Arg {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(text) => Self::Text(text),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(int) => Self::Int(int),
                None => Self::Other(serde_json::Value::Number(number)),
            },
            other => Self::Other(other),
        }
    }
}

/// An unchecked action as stored in a log: a kind tag and its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionRecord {
    pub kind: String,
    pub args: Vec<Arg>,
}

impl ActionRecord {
    pub fn new(kind: impl Into<String>, args: Vec<Arg>) -> Self {
        Self {
            kind: kind.into(),
            args,
        }
    }
}

/// Builds an [`ActionRecord`] from a kind and mixed text/integer arguments.
#[macro_export]
macro_rules! record {
    ($kind:expr $(, $arg:expr)* $(,)?) => {
        $crate::ActionRecord::new($kind, vec![$($crate::Arg::from($arg)),*])
    };
}

impl Serialize for ActionRecord {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;

        let mut seq = serializer.serialize_seq(Some(self.args.len() + 1))?;
        seq.serialize_element(&self.kind)?;
        for arg in &self.args {
            seq.serialize_element(arg)?;
        }
        seq.end()
    }
}

impl<'de> Deserialize<'de> for ActionRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let mut items = Vec::<serde_json::Value>::deserialize(deserializer)?.into_iter();
        let kind = match items.next() {
            Some(serde_json::Value::String(kind)) => kind,
            Some(other) => {
                return Err(serde::de::Error::custom(format!(
                    "action kind must be a string, got {other}"
                )));
            }
            None => return Err(serde::de::Error::custom("empty action record")),
        };
        Ok(Self {
            kind,
            args: items.map(Arg::from).collect(),
        })
    }
}

/// A validated action, one variant per [`ActionKind`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Start { label: String, at: TimePoint },
    Stop { at: TimePoint },
    Switch { label: String, at: TimePoint },
    Push { label: String, at: TimePoint },
    PushStop { at: TimePoint },
    Pop { at: TimePoint },
    PopStop { at: TimePoint },
    Checkin { label: String, minutes: Minutes },
    Checkout { label: String, minutes: Minutes },
    CheckoutOne { label: String },
    CheckoutAll,
    DayLeap,
    Remove { label: String, minutes: Minutes },
    RemoveOngoing { minutes: Minutes },
    TransferTime { src: String, dst: String, minutes: Minutes },
    TransferTimeOngoing { dst: String, minutes: Minutes },
    Touch { at: TimePoint },
    Rename { label: String, new_label: String },
    DropStack,
}

impl Action {
    /// The kind tag of this action.
    #[must_use]
    pub const fn kind(&self) -> ActionKind {
        match self {
            Self::Start { .. } => ActionKind::Start,
            Self::Stop { .. } => ActionKind::Stop,
            Self::Switch { .. } => ActionKind::Switch,
            Self::Push { .. } => ActionKind::Push,
            Self::PushStop { .. } => ActionKind::PushStop,
            Self::Pop { .. } => ActionKind::Pop,
            Self::PopStop { .. } => ActionKind::PopStop,
            Self::Checkin { .. } => ActionKind::Checkin,
            Self::Checkout { .. } => ActionKind::Checkout,
            Self::CheckoutOne { .. } => ActionKind::CheckoutOne,
            Self::CheckoutAll => ActionKind::CheckoutAll,
            Self::DayLeap => ActionKind::DayLeap,
            Self::Remove { .. } => ActionKind::Remove,
            Self::RemoveOngoing { .. } => ActionKind::RemoveOngoing,
            Self::TransferTime { .. } => ActionKind::TransferTime,
            Self::TransferTimeOngoing { .. } => ActionKind::TransferTimeOngoing,
            Self::Touch { .. } => ActionKind::Touch,
            Self::Rename { .. } => ActionKind::Rename,
            Self::DropStack => ActionKind::DropStack,
        }
    }

    /// Applies this action to `ledger`.
    pub fn apply(&self, ledger: &mut Ledger) -> Result<(), LedgerError> {
        match self {
            Self::Start { label, at } => ledger.start(label, *at),
            Self::Stop { at } => ledger.stop(*at),
            Self::Switch { label, at } => ledger.switch(label, *at),
            Self::Push { label, at } => ledger.push(label, *at),
            Self::PushStop { at } => ledger.push_stop(*at),
            Self::Pop { at } => ledger.pop(*at),
            Self::PopStop { at } => ledger.pop_stop(*at),
            Self::Checkin { label, minutes } => ledger.checkin(label, *minutes),
            Self::Checkout { label, minutes } => ledger.checkout(label, *minutes),
            Self::CheckoutOne { label } => ledger.checkout_one(label),
            Self::CheckoutAll => ledger.checkout_all(),
            Self::DayLeap => {
                ledger.allow_leap();
                Ok(())
            }
            Self::Remove { label, minutes } => ledger.remove(label, *minutes),
            Self::RemoveOngoing { minutes } => ledger.remove_ongoing(*minutes),
            Self::TransferTime { src, dst, minutes } => ledger.transfer_time(src, dst, *minutes),
            Self::TransferTimeOngoing { dst, minutes } => {
                ledger.transfer_time_ongoing(dst, *minutes)
            }
            Self::Touch { at } => ledger.touch(*at),
            Self::Rename { label, new_label } => ledger.rename(label, new_label),
            Self::DropStack => {
                ledger.drop_stack();
                Ok(())
            }
        }
    }
}

impl TryFrom<&ActionRecord> for Action {
    type Error = ActionError;

    fn try_from(record: &ActionRecord) -> Result<Self, Self::Error> {
        let kind: ActionKind = record.kind.parse()?;
        if record.args.len() != kind.arity() {
            return Err(ActionError::ArityMismatch {
                kind,
                expected: kind.arity(),
                actual: record.args.len(),
            });
        }
        let args = Args {
            kind,
            args: &record.args,
        };

        let action = match kind {
            ActionKind::Start => Self::Start {
                label: args.label(0)?,
                at: args.time_point(1)?,
            },
            ActionKind::Stop => Self::Stop {
                at: args.time_point(0)?,
            },
            ActionKind::Switch => Self::Switch {
                label: args.label(0)?,
                at: args.time_point(1)?,
            },
            ActionKind::Push => Self::Push {
                label: args.label(0)?,
                at: args.time_point(1)?,
            },
            ActionKind::PushStop => Self::PushStop {
                at: args.time_point(0)?,
            },
            ActionKind::Pop => Self::Pop {
                at: args.time_point(0)?,
            },
            ActionKind::PopStop => Self::PopStop {
                at: args.time_point(0)?,
            },
            ActionKind::Checkin => Self::Checkin {
                label: args.label(0)?,
                minutes: args.duration(1)?,
            },
            ActionKind::Checkout => Self::Checkout {
                label: args.label(0)?,
                minutes: args.duration(1)?,
            },
            ActionKind::CheckoutOne => Self::CheckoutOne {
                label: args.label(0)?,
            },
            ActionKind::CheckoutAll => Self::CheckoutAll,
            ActionKind::DayLeap => Self::DayLeap,
            ActionKind::Remove => Self::Remove {
                label: args.label(0)?,
                minutes: args.duration(1)?,
            },
            ActionKind::RemoveOngoing => Self::RemoveOngoing {
                minutes: args.duration(0)?,
            },
            ActionKind::TransferTime => Self::TransferTime {
                src: args.label(0)?,
                dst: args.label(1)?,
                minutes: args.duration(2)?,
            },
            ActionKind::TransferTimeOngoing => Self::TransferTimeOngoing {
                dst: args.label(0)?,
                minutes: args.duration(1)?,
            },
            ActionKind::Touch => Self::Touch {
                at: args.time_point(0)?,
            },
            ActionKind::Rename => Self::Rename {
                label: args.label(0)?,
                new_label: args.label(1)?,
            },
            ActionKind::DropStack => Self::DropStack,
        };
        Ok(action)
    }
}

/// Arity-checked argument list of one record.
struct Args<'a> {
    kind: ActionKind,
    args: &'a [Arg],
}

impl Args<'_> {
    fn invalid(&self, index: usize, expected: &'static str) -> ActionError {
        ActionError::InvalidArgumentType {
            kind: self.kind,
            index,
            expected,
        }
    }

    fn label(&self, index: usize) -> Result<String, ActionError> {
        match &self.args[index] {
            Arg::Text(text) => Ok(text.clone()),
            _ => Err(self.invalid(index, "a text label")),
        }
    }

    fn duration(&self, index: usize) -> Result<Minutes, ActionError> {
        match &self.args[index] {
            Arg::Int(minutes) => Ok(check_duration(*minutes)?),
            Arg::Text(text) => Ok(parse_duration(text)?),
            Arg::Other(_) => Err(self.invalid(index, "a duration")),
        }
    }

    fn time_point(&self, index: usize) -> Result<TimePoint, ActionError> {
        match &self.args[index] {
            Arg::Int(minutes) => Ok(TimePoint::new(*minutes)?),
            Arg::Text(text) => Ok(text.parse()?),
            Arg::Other(_) => Err(self.invalid(index, "a time point")),
        }
    }
}
