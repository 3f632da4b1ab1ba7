//! Session history.
//!
//! A [`SessionRecord`] is created pending when a session starts and is moved
//! exactly once to a terminal outcome: completed on natural expiry, or
//! interrupted on a user reset. After that it only ever gets deleted.

mod store;

pub use store::{SessionStore, MAX_SESSIONS};

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timer::{SessionType, TimerMode};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    #[serde(default)]
    pub timer_mode: TimerMode,
    pub start_time: DateTime<Utc>,
    /// Planned deadline while pending, actual end once finalized.
    pub end_time: DateTime<Utc>,
    /// Planned length in seconds.
    pub duration: u64,
    pub completed: bool,
    pub interrupted: bool,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Completed,
    Interrupted,
}

impl SessionRecord {
    pub fn pending(
        id: String,
        session_type: SessionType,
        timer_mode: TimerMode,
        start_time: DateTime<Utc>,
        planned_end: DateTime<Utc>,
        duration: u64,
        tags: BTreeSet<String>,
    ) -> Self {
        Self {
            id,
            session_type,
            timer_mode,
            start_time,
            end_time: planned_end,
            duration,
            completed: false,
            interrupted: false,
            tags,
            notes: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        !self.completed && !self.interrupted
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match (self.completed, self.interrupted) {
            (true, _) => Some(Outcome::Completed),
            (false, true) => Some(Outcome::Interrupted),
            (false, false) => None,
        }
    }

    pub(crate) fn finalize(&mut self, outcome: Outcome, at: DateTime<Utc>) {
        self.end_time = at;
        self.completed = outcome == Outcome::Completed;
        self.interrupted = outcome == Outcome::Interrupted;
    }
}

/// `session_<epoch-ms>_<9 random chars>`.
pub fn generate_session_id(now_ms: u64) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("session_{now_ms}_{}", &random[..9])
}

/// Narrowing criteria for [`SessionStore::list`]. Empty matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub session_type: Option<SessionType>,
    pub timer_mode: Option<TimerMode>,
    pub completed: Option<bool>,
    /// Inclusive lower bound on `start_time`.
    pub start_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `start_time`.
    pub end_date: Option<DateTime<Utc>>,
}

impl SessionFilter {
    pub fn session_type(mut self, session_type: SessionType) -> Self {
        self.session_type = Some(session_type);
        self
    }

    pub fn timer_mode(mut self, timer_mode: TimerMode) -> Self {
        self.timer_mode = Some(timer_mode);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn since(mut self, start: DateTime<Utc>) -> Self {
        self.start_date = Some(start);
        self
    }

    pub fn until(mut self, end: DateTime<Utc>) -> Self {
        self.end_date = Some(end);
        self
    }

    pub fn matches(&self, record: &SessionRecord) -> bool {
        self.session_type.map_or(true, |t| record.session_type == t)
            && self.timer_mode.map_or(true, |m| record.timer_mode == m)
            && self.completed.map_or(true, |c| record.completed == c)
            && self.start_date.map_or(true, |d| record.start_time >= d)
            && self.end_date.map_or(true, |d| record.start_time <= d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> SessionRecord {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        SessionRecord::pending(
            "session_1_abcdefghi".into(),
            SessionType::Work,
            TimerMode::Pomodoro,
            start,
            start + chrono::Duration::minutes(25),
            1500,
            BTreeSet::from(["tag_1".to_string()]),
        )
    }

    #[test]
    fn generated_ids_have_expected_shape() {
        let id = generate_session_id(1_700_000_000_000);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts[0], "session");
        assert_eq!(parts[1], "1700000000000");
        assert_eq!(parts[2].len(), 9);
        assert_ne!(generate_session_id(1), generate_session_id(1));
    }

    #[test]
    fn finalize_sets_exactly_one_flag() {
        let mut r = record();
        assert!(r.is_pending());
        let at = r.start_time + chrono::Duration::minutes(3);
        r.finalize(Outcome::Interrupted, at);
        assert_eq!(r.outcome(), Some(Outcome::Interrupted));
        assert!(!r.completed);
        assert_eq!(r.end_time, at);
    }

    #[test]
    fn wire_shape_uses_camel_case_and_type() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["type"], "work");
        assert_eq!(json["timerMode"], "pomodoro");
        assert_eq!(json["duration"], 1500);
        assert!(json["startTime"].as_str().unwrap().starts_with("2026-03-02T09:00:00"));
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn filter_combines_criteria() {
        let r = record();
        assert!(SessionFilter::default().matches(&r));
        assert!(SessionFilter::default()
            .session_type(SessionType::Work)
            .completed(false)
            .matches(&r));
        assert!(!SessionFilter::default().timer_mode(TimerMode::Intensive).matches(&r));
        assert!(SessionFilter::default().since(r.start_time).until(r.start_time).matches(&r));
        assert!(!SessionFilter::default()
            .since(r.start_time + chrono::Duration::seconds(1))
            .matches(&r));
    }
}
