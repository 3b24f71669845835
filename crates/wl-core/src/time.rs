//! Minute-granularity durations and clock points.
//!
//! Durations are plain `i64` minute counts so ledger balances can go negative.
//! Clock points are validated minutes since local midnight.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A signed number of minutes.
pub type Minutes = i64;

/// Minutes in one day; a clock point is always below this.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// Longest duration a single action may carry: a million hours.
pub const MAX_DURATION: Minutes = 1_000_000 * 60;

/// Errors from parsing duration and clock point text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A duration token is empty (e.g. doubled spaces).
    #[error("empty token in duration {text:?}")]
    EmptyToken { text: String },

    /// A duration token ends in something other than `m` or `h`.
    #[error("unknown duration unit in {token:?} (expected `m` or `h`)")]
    UnknownUnit { token: String },

    /// The magnitude in front of the unit is not a non-negative integer.
    #[error("invalid duration magnitude in {token:?}")]
    InvalidMagnitude { token: String },

    /// The text is not of the form `HH:MM`.
    #[error("invalid time point {text:?} (expected HH:MM)")]
    InvalidTimePoint { text: String },

    /// A duration is negative or longer than [`MAX_DURATION`].
    #[error("duration of {minutes} minutes is out of range")]
    DurationOutOfRange { minutes: i64 },

    /// The value does not fit in a single day.
    #[error("time point {minutes} is outside 00:00..24:00")]
    TimePointOutOfRange { minutes: i64 },
}

/// Parses a duration such as `"1h 30m"` into minutes.
///
/// Tokens are separated by single spaces; each one is a non-negative integer
/// followed by `m` or `h`. All tokens are summed, and the sum may not exceed
/// [`MAX_DURATION`].
pub fn parse_duration(text: &str) -> Result<Minutes, ParseError> {
    let mut total: Minutes = 0;
    for token in text.split(' ') {
        let Some(unit) = token.chars().last() else {
            return Err(ParseError::EmptyToken {
                text: text.to_string(),
            });
        };
        let multiplier = match unit {
            'm' => 1,
            'h' => 60,
            _ => {
                return Err(ParseError::UnknownUnit {
                    token: token.to_string(),
                });
            }
        };
        let magnitude = &token[..token.len() - unit.len_utf8()];
        if magnitude.is_empty() || !magnitude.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::InvalidMagnitude {
                token: token.to_string(),
            });
        }
        let value: Minutes = magnitude
            .parse()
            .map_err(|_| ParseError::InvalidMagnitude {
                token: token.to_string(),
            })?;
        total = value
            .checked_mul(multiplier)
            .and_then(|minutes| total.checked_add(minutes))
            .ok_or_else(|| ParseError::InvalidMagnitude {
                token: token.to_string(),
            })?;
    }
    check_duration(total)
}

/// Accepts `minutes` if it lies in `0..=MAX_DURATION`.
pub fn check_duration(minutes: Minutes) -> Result<Minutes, ParseError> {
    if (0..=MAX_DURATION).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ParseError::DurationOutOfRange { minutes })
    }
}

/// Formats a non-negative view of `minutes` as `"2h 5m"` or `"45m"`.
///
/// The sign is dropped; use [`format_signed_duration`] to keep it.
#[must_use]
pub fn format_duration(minutes: Minutes) -> String {
    let minutes = minutes.unsigned_abs();
    let hours = minutes / 60;
    let rest = minutes % 60;
    if hours > 0 {
        format!("{hours}h {rest}m")
    } else {
        format!("{rest}m")
    }
}

/// Formats a signed duration: `-(1h 0m)` for negatives, `+(5m)` for
/// non-negatives when `show_positive` is set, bare otherwise.
#[must_use]
pub fn format_signed_duration(minutes: Minutes, show_positive: bool) -> String {
    let body = format_duration(minutes);
    if minutes < 0 {
        format!("-({body})")
    } else if show_positive {
        format!("+({body})")
    } else {
        body
    }
}

/// Rounds `numerator / denominator` towards positive infinity.
///
/// `denominator` must be positive.
#[must_use]
pub(crate) const fn div_ceil(numerator: Minutes, denominator: Minutes) -> Minutes {
    let quotient = numerator / denominator;
    if numerator % denominator > 0 {
        quotient + 1
    } else {
        quotient
    }
}

/// Minutes since local midnight, always in `0..1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint(u16);

impl TimePoint {
    /// Midnight.
    pub const MIDNIGHT: Self = Self(0);

    /// Creates a time point from minutes since midnight.
    pub fn new(minutes: i64) -> Result<Self, ParseError> {
        u16::try_from(minutes)
            .ok()
            .filter(|m| *m < MINUTES_PER_DAY)
            .map(Self)
            .ok_or(ParseError::TimePointOutOfRange { minutes })
    }

    /// Creates a time point from an hour and a minute.
    pub fn from_hm(hour: u16, minute: u16) -> Result<Self, ParseError> {
        if minute >= 60 {
            return Err(ParseError::TimePointOutOfRange {
                minutes: i64::from(hour) * 60 + i64::from(minute),
            });
        }
        Self::new(i64::from(hour) * 60 + i64::from(minute))
    }

    /// Minutes since midnight.
    #[must_use]
    pub const fn minutes(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn hour(self) -> u16 {
        self.0 / 60
    }

    #[must_use]
    pub const fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimePoint {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidTimePoint {
            text: s.to_string(),
        };
        let bytes = s.as_bytes();
        if bytes.len() != 5 || bytes[2] != b':' {
            return Err(invalid());
        }
        let digits = [bytes[0], bytes[1], bytes[3], bytes[4]];
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(invalid());
        }
        let hour = u16::from(bytes[0] - b'0') * 10 + u16::from(bytes[1] - b'0');
        let minute = u16::from(bytes[3] - b'0') * 10 + u16::from(bytes[4] - b'0');
        if hour >= 24 || minute >= 60 {
            return Err(invalid());
        }
        Self::from_hm(hour, minute)
    }
}

impl Serialize for TimePoint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for TimePoint {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
