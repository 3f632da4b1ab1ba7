//! Timer transitions.
//!
//! The transitions are pure: they mutate an in-memory [`TimerState`] and tell
//! the caller which session record has to be created or finalized. Nothing in
//! here touches storage; [`TimerService`](crate::service::TimerService) and
//! [`Reconciler`](crate::reconcile::Reconciler) persist the result.
//!
//! ## State Transitions
//!
//! ```text
//! Idle    --start-->      Running
//! Running --pause-->      Paused
//! Paused  --resume-->     Running
//! Running --complete-->   Idle  (next type armed)
//! Running|Paused --interrupt--> Idle (work armed)
//! Idle    --reinitialize--> Idle (count cleared)
//! ```

use std::collections::BTreeSet;

use super::mode::TimerDurations;
use super::state::{ActiveSession, SessionType, TimerPhase, TimerState};
use crate::error::{CoreError, Result};

/// Outcome of a natural expiry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub session_id: String,
    pub finished: SessionType,
    pub next: SessionType,
    pub completed_pomodoros: u32,
}

/// Outcome of a user reset on an active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interruption {
    pub session_id: String,
    pub interrupted: SessionType,
}

impl TimerState {
    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }

    /// Idle -> Running.
    pub(crate) fn begin(
        &mut self,
        session_type: SessionType,
        session_id: String,
        end_time_ms: u64,
        tags: BTreeSet<String>,
    ) -> Result<()> {
        if !self.is_idle() {
            return Err(CoreError::InvalidTransition {
                from: self.status(),
                command: "start",
            });
        }
        self.phase = TimerPhase::Running(ActiveSession {
            session_id,
            end_time_ms,
            tags,
        });
        self.session_type = session_type;
        self.touch();
        Ok(())
    }

    /// Running -> Paused. The deadline is kept; the countdown freezes at `now_ms`.
    pub(crate) fn pause(&mut self, now_ms: u64) -> Result<u64> {
        let from = self.status();
        let session = match std::mem::take(&mut self.phase) {
            TimerPhase::Running(session) => session,
            other => {
                self.phase = other;
                return Err(CoreError::InvalidTransition {
                    from,
                    command: "pause",
                });
            }
        };
        let remaining_ms = session.end_time_ms.saturating_sub(now_ms);
        self.phase = TimerPhase::Paused {
            session,
            paused_at_ms: now_ms,
        };
        self.touch();
        Ok(remaining_ms)
    }

    /// Paused -> Running, re-armed with the frozen remaining time.
    pub(crate) fn resume(&mut self, now_ms: u64) -> Result<u64> {
        let from = self.status();
        let (mut session, paused_at_ms) = match std::mem::take(&mut self.phase) {
            TimerPhase::Paused {
                session,
                paused_at_ms,
            } => (session, paused_at_ms),
            other => {
                self.phase = other;
                return Err(CoreError::InvalidTransition {
                    from,
                    command: "resume",
                });
            }
        };
        let remaining_ms = session.end_time_ms.saturating_sub(paused_at_ms);
        session.end_time_ms = now_ms.saturating_add(remaining_ms);
        self.phase = TimerPhase::Running(session);
        self.touch();
        Ok(remaining_ms)
    }

    /// Running and expired -> Idle with the next session type armed.
    ///
    /// Returns `None` (and leaves the state untouched) when there is nothing
    /// to complete, which makes a late duplicate tick harmless.
    pub(crate) fn complete(&mut self, now_ms: u64, durations: &TimerDurations) -> Option<Completion> {
        if !self.is_expired(now_ms) {
            return None;
        }
        let session = match std::mem::take(&mut self.phase) {
            TimerPhase::Running(session) => session,
            other => {
                self.phase = other;
                return None;
            }
        };
        let finished = self.session_type;
        let next = match finished {
            SessionType::Work => {
                self.completed_pomodoros = self.completed_pomodoros.saturating_add(1);
                durations.break_after(self.completed_pomodoros)
            }
            SessionType::ShortBreak | SessionType::LongBreak => SessionType::Work,
        };
        self.session_type = next;
        self.touch();
        Some(Completion {
            session_id: session.session_id,
            finished,
            next,
            completed_pomodoros: self.completed_pomodoros,
        })
    }

    /// Running or Paused -> Idle. Always re-arms a work session and keeps the
    /// pomodoro count.
    pub(crate) fn interrupt(&mut self) -> Option<Interruption> {
        let session = match std::mem::take(&mut self.phase) {
            TimerPhase::Idle => return None,
            TimerPhase::Running(session) | TimerPhase::Paused { session, .. } => session,
        };
        let interrupted = self.session_type;
        self.session_type = SessionType::Work;
        self.touch();
        Some(Interruption {
            session_id: session.session_id,
            interrupted,
        })
    }

    /// Idle -> Idle with the pomodoro count cleared.
    pub(crate) fn reinitialize(&mut self) -> Result<()> {
        if !self.is_idle() {
            return Err(CoreError::InvalidTransition {
                from: self.status(),
                command: "reinitialize",
            });
        }
        self.session_type = SessionType::Work;
        self.completed_pomodoros = 0;
        self.touch();
        Ok(())
    }
}
