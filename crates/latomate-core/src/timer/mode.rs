//! Duration presets and the duration resolver.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::state::SessionType;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimerMode {
    #[default]
    #[serde(rename = "pomodoro")]
    Pomodoro,
    #[serde(rename = "intensive")]
    Intensive,
    #[serde(rename = "52-17")]
    FiftyTwoSeventeen,
    #[serde(rename = "custom")]
    Custom,
}

impl TimerMode {
    pub const ALL: [TimerMode; 4] = [
        TimerMode::Pomodoro,
        TimerMode::Intensive,
        TimerMode::FiftyTwoSeventeen,
        TimerMode::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TimerMode::Pomodoro => "pomodoro",
            TimerMode::Intensive => "intensive",
            TimerMode::FiftyTwoSeventeen => "52-17",
            TimerMode::Custom => "custom",
        }
    }

    /// Built-in durations, `None` for [`TimerMode::Custom`].
    pub fn preset(self) -> Option<TimerDurations> {
        match self {
            TimerMode::Pomodoro => Some(TimerDurations::POMODORO),
            TimerMode::Intensive => Some(TimerDurations::INTENSIVE),
            TimerMode::FiftyTwoSeventeen => Some(TimerDurations::FIFTY_TWO_SEVENTEEN),
            TimerMode::Custom => None,
        }
    }
}

impl fmt::Display for TimerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimerMode::ALL
            .into_iter()
            .find(|mode| mode.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::InvalidValue {
                field: "timerMode".into(),
                message: format!("unknown timer mode '{s}' (expected pomodoro, intensive, 52-17 or custom)"),
            })
    }
}

/// Session lengths in minutes plus the long-break cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerDurations {
    pub work: u32,
    pub short_break: u32,
    pub long_break: u32,
    /// A long break follows every `long_break_interval`-th work session.
    pub long_break_interval: u32,
}

/// Accepted ranges for user-supplied custom durations.
pub const WORK_RANGE: (u32, u32) = (1, 120);
pub const SHORT_BREAK_RANGE: (u32, u32) = (1, 60);
pub const LONG_BREAK_RANGE: (u32, u32) = (1, 60);
pub const LONG_BREAK_INTERVAL_RANGE: (u32, u32) = (1, 10);

impl TimerDurations {
    pub const POMODORO: Self = Self {
        work: 25,
        short_break: 5,
        long_break: 15,
        long_break_interval: 4,
    };

    pub const INTENSIVE: Self = Self {
        work: 45,
        short_break: 15,
        long_break: 30,
        long_break_interval: 4,
    };

    pub const FIFTY_TWO_SEVENTEEN: Self = Self {
        work: 52,
        short_break: 17,
        long_break: 17,
        long_break_interval: 4,
    };

    pub fn minutes_for(&self, session_type: SessionType) -> u32 {
        match session_type {
            SessionType::Work => self.work,
            SessionType::ShortBreak => self.short_break,
            SessionType::LongBreak => self.long_break,
        }
    }

    /// Planned length of a session of the given type, in seconds.
    pub fn seconds_for(&self, session_type: SessionType) -> u64 {
        u64::from(self.minutes_for(session_type)).saturating_mul(60)
    }

    /// The break that follows the `completed_pomodoros`-th work session.
    pub fn break_after(&self, completed_pomodoros: u32) -> SessionType {
        let interval = self.long_break_interval.max(1);
        if completed_pomodoros % interval == 0 {
            SessionType::LongBreak
        } else {
            SessionType::ShortBreak
        }
    }

    /// Reject values outside the ranges the settings page accepts.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check("work", self.work, WORK_RANGE)?;
        check("shortBreak", self.short_break, SHORT_BREAK_RANGE)?;
        check("longBreak", self.long_break, LONG_BREAK_RANGE)?;
        check(
            "longBreakInterval",
            self.long_break_interval,
            LONG_BREAK_INTERVAL_RANGE,
        )?;
        Ok(())
    }

    /// Pull every field into its accepted range.
    pub fn clamped(&self) -> Self {
        Self {
            work: self.work.clamp(WORK_RANGE.0, WORK_RANGE.1),
            short_break: self.short_break.clamp(SHORT_BREAK_RANGE.0, SHORT_BREAK_RANGE.1),
            long_break: self.long_break.clamp(LONG_BREAK_RANGE.0, LONG_BREAK_RANGE.1),
            long_break_interval: self
                .long_break_interval
                .clamp(LONG_BREAK_INTERVAL_RANGE.0, LONG_BREAK_INTERVAL_RANGE.1),
        }
    }
}

impl Default for TimerDurations {
    fn default() -> Self {
        Self::POMODORO
    }
}

fn check(field: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), ValidationError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

/// Resolve the durations for `mode`.
///
/// Presets ignore `custom`. For [`TimerMode::Custom`] the stored durations are
/// used (clamped into range), falling back to the pomodoro shape.
pub fn resolve(mode: TimerMode, custom: Option<TimerDurations>) -> TimerDurations {
    match mode.preset() {
        Some(preset) => preset,
        None => custom.map(|c| c.clamped()).unwrap_or_default(),
    }
}
