//! Resampling grains and the bucket flooring rule.

use chrono::{Duration, NaiveDateTime, Timelike};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Tick,
    OneMinute,
    FiveMinutes,
    TenMinutes,
    FifteenMinutes,
    ThirtyMinutes,
    OneHour,
    FourHours,
    OneDay,
}

impl Frequency {
    pub const ALL: [Frequency; 9] = [
        Frequency::Tick,
        Frequency::OneMinute,
        Frequency::FiveMinutes,
        Frequency::TenMinutes,
        Frequency::FifteenMinutes,
        Frequency::ThirtyMinutes,
        Frequency::OneHour,
        Frequency::FourHours,
        Frequency::OneDay,
    ];

    /// External name, as used in config files and provider interval parameters.
    pub fn name(&self) -> &'static str {
        match self {
            Frequency::Tick => "Second",
            Frequency::OneMinute => "OneMinute",
            Frequency::FiveMinutes => "FiveMinutes",
            Frequency::TenMinutes => "TenMinutes",
            Frequency::FifteenMinutes => "FifteenMinutes",
            Frequency::ThirtyMinutes => "ThirtyMinutes",
            Frequency::OneHour => "OneHour",
            Frequency::FourHours => "FourHours",
            Frequency::OneDay => "OneDay",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseFrequencyError(pub String);

impl fmt::Display for ParseFrequencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown frequency: {}", self.0)
    }
}

impl std::error::Error for ParseFrequencyError {}

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Frequency::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseFrequencyError(trimmed.to_string()))
    }
}

/// Canonical bucket start for `time` under `frequency`.
///
/// One-day buckets keep the hour of day: bars at different hours of the same
/// date fall into different buckets.
pub fn discrete_time(time: NaiveDateTime, frequency: Frequency) -> NaiveDateTime {
    let (hour, minute, second) = (time.hour(), time.minute(), time.second());
    match frequency {
        Frequency::Tick => floor(time, 0, 0, 0),
        Frequency::OneMinute => floor(time, 0, 0, second),
        Frequency::FiveMinutes => floor(time, 0, minute % 5, second),
        Frequency::TenMinutes => floor(time, 0, minute % 10, second),
        Frequency::FifteenMinutes => floor(time, 0, minute % 15, second),
        Frequency::ThirtyMinutes => floor(time, 0, minute % 30, second),
        Frequency::OneHour | Frequency::OneDay => floor(time, 0, minute, second),
        Frequency::FourHours => floor(time, hour % 4, minute, second),
    }
}

/// Subtract the given components and all sub-second nanos.
fn floor(time: NaiveDateTime, hours: u32, minutes: u32, seconds: u32) -> NaiveDateTime {
    time - Duration::hours(i64::from(hours))
        - Duration::minutes(i64::from(minutes))
        - Duration::seconds(i64::from(seconds))
        - Duration::nanoseconds(i64::from(time.nanosecond()))
}
