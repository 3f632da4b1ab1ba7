//! The persisted timer record.
//!
//! ```text
//! Idle -> Running -> (Paused -> Running)* -> Idle
//! ```
//!
//! A session id and a deadline only exist inside the running/paused phases,
//! so "deadline set iff running or paused" holds by construction.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::display::remaining_secs;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionType {
    #[default]
    Work,
    ShortBreak,
    LongBreak,
}

impl SessionType {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionType::Work => "work",
            SessionType::ShortBreak => "shortBreak",
            SessionType::LongBreak => "longBreak",
        }
    }

    pub fn is_break(self) -> bool {
        !matches!(self, SessionType::Work)
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "work" => Ok(SessionType::Work),
            "shortbreak" | "short" => Ok(SessionType::ShortBreak),
            "longbreak" | "long" => Ok(SessionType::LongBreak),
            _ => Err(ValidationError::InvalidValue {
                field: "sessionType".into(),
                message: format!("unknown session type '{s}'"),
            }),
        }
    }
}

/// Coarse timer status, as shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

impl fmt::Display for TimerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        })
    }
}

/// The in-progress session of a running or paused timer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveSession {
    /// Id of the pending [`SessionRecord`](crate::session::SessionRecord).
    pub session_id: String,
    /// Absolute deadline, epoch milliseconds.
    pub end_time_ms: u64,
    #[serde(default)]
    pub tags: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TimerPhase {
    #[default]
    Idle,
    Running(ActiveSession),
    #[serde(rename_all = "camelCase")]
    Paused {
        session: ActiveSession,
        /// When the pause happened; the countdown is frozen at this instant.
        paused_at_ms: u64,
    },
}

/// Singleton timer record, persisted under [`keys::TIMER_STATE`](crate::storage::keys::TIMER_STATE).
///
/// Fields are only written through the transitions in `engine.rs`; every
/// transition bumps `version`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    #[serde(default)]
    pub(crate) version: u64,
    #[serde(default)]
    pub(crate) phase: TimerPhase,
    /// Type of the active session, or the type armed for the next start.
    #[serde(default)]
    pub(crate) session_type: SessionType,
    #[serde(default)]
    pub(crate) completed_pomodoros: u32,
}

impl TimerState {
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn phase(&self) -> &TimerPhase {
        &self.phase
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn completed_pomodoros(&self) -> u32 {
        self.completed_pomodoros
    }

    pub fn status(&self) -> TimerStatus {
        match self.phase {
            TimerPhase::Idle => TimerStatus::Idle,
            TimerPhase::Running(_) => TimerStatus::Running,
            TimerPhase::Paused { .. } => TimerStatus::Paused,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, TimerPhase::Idle)
    }

    pub fn is_running(&self) -> bool {
        matches!(self.phase, TimerPhase::Running(_))
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.phase, TimerPhase::Paused { .. })
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        match &self.phase {
            TimerPhase::Idle => None,
            TimerPhase::Running(session) | TimerPhase::Paused { session, .. } => Some(session),
        }
    }

    pub fn end_time_ms(&self) -> Option<u64> {
        self.active().map(|s| s.end_time_ms)
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.active().map(|s| s.session_id.as_str())
    }

    pub fn selected_tags(&self) -> Option<&BTreeSet<String>> {
        self.active().map(|s| &s.tags)
    }

    /// Whole seconds left, rounded up. `None` while idle.
    ///
    /// A paused timer reports the value frozen at the pause instant.
    pub fn remaining_secs(&self, now_ms: u64) -> Option<u64> {
        match &self.phase {
            TimerPhase::Idle => None,
            TimerPhase::Running(session) => Some(remaining_secs(session.end_time_ms, now_ms)),
            TimerPhase::Paused {
                session,
                paused_at_ms,
            } => Some(remaining_secs(session.end_time_ms, *paused_at_ms)),
        }
    }

    /// A running session whose deadline has been reached.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        match &self.phase {
            TimerPhase::Running(session) => now_ms >= session.end_time_ms,
            _ => false,
        }
    }
}
