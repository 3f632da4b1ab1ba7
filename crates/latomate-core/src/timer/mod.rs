mod display;
mod engine;
mod mode;
mod reset;
mod state;

pub use display::{
    badge, badge_text, format_clock, remaining_secs, Badge, BREAK_BADGE_COLOR, WORK_BADGE_COLOR,
};
pub use engine::{Completion, Interruption};
pub use mode::{resolve, TimerDurations, TimerMode};
pub use reset::{ResetDecision, ResetGuard, DEFAULT_CONFIRM_WINDOW_MS};
pub use state::{ActiveSession, SessionType, TimerPhase, TimerState, TimerStatus};
