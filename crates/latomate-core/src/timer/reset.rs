//! Confirm-by-repeat for the destructive reset.
//!
//! A reset on an idle timer only arms a short window. A second idle reset
//! inside that window wipes the pomodoro count.

pub const DEFAULT_CONFIRM_WINDOW_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetDecision {
    /// Open the confirmation window, change nothing else.
    Arm,
    /// A previous idle reset is still inside the window.
    Reinitialize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetGuard {
    window_ms: u64,
}

impl ResetGuard {
    pub fn new(window_ms: u64) -> Self {
        Self { window_ms }
    }

    pub fn window_ms(&self) -> u64 {
        self.window_ms
    }

    /// Decide what an idle reset at `now_ms` means, given when the window was
    /// last armed. The window is half-open: `[armed_at, armed_at + window)`.
    pub fn on_idle_reset(&self, armed_at_ms: Option<u64>, now_ms: u64) -> ResetDecision {
        match armed_at_ms.and_then(|armed| now_ms.checked_sub(armed)) {
            Some(elapsed) if elapsed < self.window_ms => ResetDecision::Reinitialize,
            _ => ResetDecision::Arm,
        }
    }
}

impl Default for ResetGuard {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIRM_WINDOW_MS)
    }
}
