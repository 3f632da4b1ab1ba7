//! Countdown rendering: the small toolbar badge and the `MM:SS` clock.

use serde::Serialize;

use super::state::{SessionType, TimerState};

pub const WORK_BADGE_COLOR: &str = "#e74c3c";
pub const BREAK_BADGE_COLOR: &str = "#3498db";

/// `max(0, ceil((end - now) / 1000))`.
pub fn remaining_secs(end_time_ms: u64, now_ms: u64) -> u64 {
    end_time_ms.saturating_sub(now_ms).div_ceil(1000)
}

/// `MM:SS`, minutes keep growing past 99.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Badge label: whole minutes once a minute or more remains, seconds below.
///
/// Four characters at most for anything up to 999 minutes.
pub fn badge_text(remaining_secs: u64) -> String {
    if remaining_secs == 0 {
        String::new()
    } else if remaining_secs >= 60 {
        format!("{}m", remaining_secs / 60)
    } else {
        format!("{remaining_secs}s")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Badge {
    pub text: String,
    pub color: &'static str,
}

impl Badge {
    fn cleared() -> Self {
        Self {
            text: String::new(),
            color: WORK_BADGE_COLOR,
        }
    }
}

fn color_for(session_type: SessionType) -> &'static str {
    if session_type.is_break() {
        BREAK_BADGE_COLOR
    } else {
        WORK_BADGE_COLOR
    }
}

/// Badge for the current state. Only a running, unexpired session shows text.
pub fn badge(state: &TimerState, now_ms: u64) -> Badge {
    if !state.is_running() {
        return Badge::cleared();
    }
    match state.remaining_secs(now_ms) {
        Some(secs) if secs > 0 => Badge {
            text: badge_text(secs),
            color: color_for(state.session_type()),
        },
        _ => Badge::cleared(),
    }
}
