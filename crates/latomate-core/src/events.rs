use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{SessionType, TimerStatus};

/// Every timer transition produces an Event.
/// The CLI prints them; embedding UIs can forward them as they like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SessionStarted {
        session_id: String,
        session_type: SessionType,
        duration_secs: u64,
        end_time_ms: u64,
        tags: BTreeSet<String>,
        at: DateTime<Utc>,
    },
    SessionPaused {
        session_id: String,
        remaining_ms: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        session_id: String,
        remaining_ms: u64,
        end_time_ms: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session_id: String,
        session_type: SessionType,
        next_session_type: SessionType,
        completed_pomodoros: u32,
        at: DateTime<Utc>,
    },
    SessionInterrupted {
        session_id: String,
        session_type: SessionType,
        at: DateTime<Utc>,
    },
    /// An idle reset opened the confirmation window.
    ResetArmed {
        expires_at_ms: u64,
        at: DateTime<Utc>,
    },
    /// A confirmed double reset cleared the pomodoro count.
    Reinitialized {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerStatus,
        session_type: SessionType,
        completed_pomodoros: u32,
        session_id: Option<String>,
        remaining_secs: u64,
        end_time_ms: Option<u64>,
        display: String,
        badge: String,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_are_tagged_by_type() {
        let event = Event::Reinitialized {
            at: DateTime::<Utc>::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "reinitialized");

        let event = Event::SessionInterrupted {
            session_id: "s".into(),
            session_type: SessionType::ShortBreak,
            at: DateTime::<Utc>::default(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "session_interrupted");
        assert_eq!(json["session_type"], "shortBreak");
    }
}
