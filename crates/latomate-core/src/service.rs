//! Inbound commands against the shared store.
//!
//! `TimerService` is the one accessor for the timer record: each command loads
//! the record, applies a named transition and writes it back. User commands
//! are last-write-wins across contexts. Completion is not available here; it
//! belongs to the [`Reconciler`](crate::reconcile::Reconciler).

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::clock::{to_datetime, Clock};
use crate::error::{CoreError, Result, ValidationError};
use crate::events::Event;
use crate::session::{generate_session_id, Outcome, SessionRecord, SessionStore};
use crate::storage::{keys, load_json, save_json, KeyValueStore};
use crate::timer::{
    badge, format_clock, resolve, Badge, ResetDecision, ResetGuard, SessionType, TimerDurations,
    TimerMode, TimerState,
};

/// Longest session `start_session` accepts: one day.
pub const MAX_SESSION_SECS: u64 = 24 * 60 * 60;

/// Front-end preferences kept next to the timer and returned verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    Language,
    Theme,
}

impl Preference {
    pub fn key(self) -> &'static str {
        match self {
            Preference::Language => keys::LANGUAGE,
            Preference::Theme => keys::THEME,
        }
    }
}

#[derive(Clone)]
pub struct TimerService {
    store: Arc<dyn KeyValueStore>,
    sessions: SessionStore,
    clock: Arc<dyn Clock>,
    reset_guard: ResetGuard,
}

impl TimerService {
    pub fn new(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: SessionStore::new(store.clone()),
            store,
            clock,
            reset_guard: ResetGuard::default(),
        }
    }

    pub fn with_reset_guard(mut self, reset_guard: ResetGuard) -> Self {
        self.reset_guard = reset_guard;
        self
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn timer_mode(&self) -> Result<TimerMode> {
        Ok(load_json(self.store.as_ref(), keys::TIMER_MODE)?.unwrap_or_default())
    }

    pub fn set_timer_mode(&self, mode: TimerMode) -> Result<()> {
        save_json(self.store.as_ref(), keys::TIMER_MODE, &mode)?;
        tracing::info!(%mode, "timer mode changed");
        Ok(())
    }

    pub fn custom_durations(&self) -> Result<Option<TimerDurations>> {
        Ok(load_json(self.store.as_ref(), keys::CUSTOM_DURATIONS)?)
    }

    pub fn set_custom_durations(&self, durations: TimerDurations) -> Result<()> {
        durations.validate()?;
        save_json(self.store.as_ref(), keys::CUSTOM_DURATIONS, &durations)?;
        tracing::info!(?durations, "custom durations saved");
        Ok(())
    }

    /// Durations of the active mode.
    pub fn durations(&self) -> Result<TimerDurations> {
        let mode = self.timer_mode()?;
        let custom = match mode {
            TimerMode::Custom => self.custom_durations()?,
            _ => None,
        };
        Ok(resolve(mode, custom))
    }

    pub fn notifications_enabled(&self) -> Result<bool> {
        Ok(load_json(self.store.as_ref(), keys::NOTIFICATIONS_ENABLED)?.unwrap_or(true))
    }

    pub fn set_notifications_enabled(&self, enabled: bool) -> Result<()> {
        save_json(self.store.as_ref(), keys::NOTIFICATIONS_ENABLED, &enabled)
    }

    pub fn preference(&self, preference: Preference) -> Result<Option<String>> {
        Ok(self.store.get(preference.key())?)
    }

    pub fn set_preference(&self, preference: Preference, value: &str) -> Result<()> {
        self.store.set(preference.key(), value)?;
        Ok(())
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// Current timer record; absent or unreadable means idle.
    pub fn state(&self) -> Result<TimerState> {
        Ok(load_json(self.store.as_ref(), keys::TIMER_STATE)?.unwrap_or_default())
    }

    fn save_state(&self, state: &TimerState) -> Result<()> {
        save_json(self.store.as_ref(), keys::TIMER_STATE, state)
    }

    /// Seconds shown on the main display: the live countdown, or the full
    /// length of the armed session while idle.
    pub fn display_secs(&self, state: &TimerState, now_ms: u64) -> Result<u64> {
        match state.remaining_secs(now_ms) {
            Some(secs) => Ok(secs),
            None => Ok(self.durations()?.seconds_for(state.session_type())),
        }
    }

    pub fn badge(&self) -> Result<Badge> {
        Ok(badge(&self.state()?, self.now_ms()))
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Result<Event> {
        let now = self.now_ms();
        let state = self.state()?;
        let secs = self.display_secs(&state, now)?;
        Ok(Event::StateSnapshot {
            state: state.status(),
            session_type: state.session_type(),
            completed_pomodoros: state.completed_pomodoros(),
            session_id: state.current_session_id().map(str::to_string),
            remaining_secs: secs,
            end_time_ms: state.end_time_ms(),
            display: format_clock(secs),
            badge: badge(&state, now).text,
            at: to_datetime(now),
        })
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start the armed session type with the active mode's duration.
    pub fn start(&self, tags: BTreeSet<String>) -> Result<Event> {
        let state = self.state()?;
        let session_type = state.session_type();
        let duration_secs = self.durations()?.seconds_for(session_type);
        self.start_session(session_type, duration_secs, tags)
    }

    /// Idle -> Running for `duration_secs`, recording a pending session.
    pub fn start_session(
        &self,
        session_type: SessionType,
        duration_secs: u64,
        tags: BTreeSet<String>,
    ) -> Result<Event> {
        if duration_secs == 0 {
            return Err(ValidationError::InvalidValue {
                field: "duration".into(),
                message: "a session must last at least one second".into(),
            }
            .into());
        }
        if duration_secs > MAX_SESSION_SECS {
            return Err(ValidationError::InvalidValue {
                field: "duration".into(),
                message: format!("a session lasts at most {MAX_SESSION_SECS} seconds"),
            }
            .into());
        }

        let now = self.now_ms();
        let mut state = self.state()?;
        if !state.is_idle() {
            return Err(CoreError::InvalidTransition {
                from: state.status(),
                command: "start",
            });
        }

        let end_time_ms = now.saturating_add(duration_secs * 1000);
        let session_id = generate_session_id(now);
        let record = SessionRecord::pending(
            session_id.clone(),
            session_type,
            self.timer_mode()?,
            to_datetime(now),
            to_datetime(end_time_ms),
            duration_secs,
            tags.clone(),
        );
        self.sessions.save(record)?;

        state.begin(session_type, session_id.clone(), end_time_ms, tags.clone())?;
        if let Err(e) = self.save_state(&state) {
            if let Err(cleanup) = self.sessions.delete(&session_id) {
                tracing::warn!(id = %session_id, error = %cleanup, "could not drop orphaned session");
            }
            return Err(e);
        }
        self.disarm_reset()?;

        tracing::info!(id = %session_id, %session_type, duration_secs, "session started");
        Ok(Event::SessionStarted {
            session_id,
            session_type,
            duration_secs,
            end_time_ms,
            tags,
            at: to_datetime(now),
        })
    }

    pub fn pause(&self) -> Result<Event> {
        let now = self.now_ms();
        let mut state = self.state()?;
        refuse_expired(&state, now, "pause")?;
        let remaining_ms = state.pause(now)?;
        self.save_state(&state)?;
        let session_id = state.current_session_id().unwrap_or_default().to_string();
        tracing::info!(id = %session_id, remaining_ms, "session paused");
        Ok(Event::SessionPaused {
            session_id,
            remaining_ms,
            at: to_datetime(now),
        })
    }

    pub fn resume(&self) -> Result<Event> {
        let now = self.now_ms();
        let mut state = self.state()?;
        let remaining_ms = state.resume(now)?;
        self.save_state(&state)?;
        let session_id = state.current_session_id().unwrap_or_default().to_string();
        tracing::info!(id = %session_id, remaining_ms, "session resumed");
        Ok(Event::SessionResumed {
            session_id,
            remaining_ms,
            end_time_ms: state.end_time_ms().unwrap_or(now),
            at: to_datetime(now),
        })
    }

    /// Running or Paused -> Idle, finalizing the record as interrupted.
    /// `None` when nothing was active.
    ///
    /// A running session past its deadline is refused with
    /// [`CoreError::SessionExpired`]; it belongs to the next reconcile pass.
    pub fn interrupt_session(&self) -> Result<Option<Event>> {
        let now = self.now_ms();
        let mut state = self.state()?;
        refuse_expired(&state, now, "interrupt")?;
        let Some(cut) = state.interrupt() else {
            return Ok(None);
        };
        self.sessions
            .finalize(&cut.session_id, Outcome::Interrupted, to_datetime(now))?;
        self.save_state(&state)?;
        self.disarm_reset()?;

        tracing::info!(id = %cut.session_id, session_type = %cut.interrupted, "session interrupted");
        Ok(Some(Event::SessionInterrupted {
            session_id: cut.session_id,
            session_type: cut.interrupted,
            at: to_datetime(now),
        }))
    }

    /// The reset button.
    ///
    /// Active timer: interrupt. Idle timer: arm the confirmation window, or
    /// clear the pomodoro count when the window is still open.
    pub fn reset(&self) -> Result<Event> {
        if let Some(event) = self.interrupt_session()? {
            return Ok(event);
        }

        let now = self.now_ms();
        let armed_at: Option<u64> = load_json(self.store.as_ref(), keys::RESET_ARMED_AT)?;
        match self.reset_guard.on_idle_reset(armed_at, now) {
            ResetDecision::Arm => {
                save_json(self.store.as_ref(), keys::RESET_ARMED_AT, &now)?;
                tracing::debug!(window_ms = self.reset_guard.window_ms(), "reset armed");
                Ok(Event::ResetArmed {
                    expires_at_ms: now.saturating_add(self.reset_guard.window_ms()),
                    at: to_datetime(now),
                })
            }
            ResetDecision::Reinitialize => {
                let mut state = self.state()?;
                state.reinitialize()?;
                self.save_state(&state)?;
                self.disarm_reset()?;
                tracing::info!("timer reinitialized, pomodoro count cleared");
                Ok(Event::Reinitialized {
                    at: to_datetime(now),
                })
            }
        }
    }

    fn disarm_reset(&self) -> Result<()> {
        self.store.remove(keys::RESET_ARMED_AT)?;
        Ok(())
    }
}

fn refuse_expired(state: &TimerState, now_ms: u64, command: &'static str) -> Result<()> {
    if state.is_expired(now_ms) {
        return Err(CoreError::SessionExpired {
            session_id: state.current_session_id().unwrap_or_default().to_string(),
            command,
        });
    }
    Ok(())
}
