//! Deadline reconciliation.
//!
//! The reconciler is the only caller of the Complete transition. It runs on a
//! periodic tick, compares the wall clock against the persisted deadline and
//! commits the completion with a compare-and-swap on the stored timer record,
//! so two reconcilers racing over the same store complete a session once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::clock::to_datetime;
use crate::error::Result;
use crate::events::Event;
use crate::notify::{Notification, Notifier};
use crate::service::TimerService;
use crate::session::Outcome;
use crate::storage::keys;
use crate::timer::{badge, Badge, TimerState};

/// What one tick observed.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Set when this tick completed a session.
    pub completed: Option<Event>,
    pub badge: Badge,
}

pub struct Reconciler {
    service: TimerService,
    notifier: Arc<dyn Notifier>,
}

impl Reconciler {
    pub fn new(service: TimerService, notifier: Arc<dyn Notifier>) -> Self {
        Self { service, notifier }
    }

    pub fn service(&self) -> &TimerService {
        &self.service
    }

    /// Complete the running session if its deadline has passed.
    ///
    /// Returns `None` when nothing was due or another context already
    /// committed the completion.
    pub fn tick(&self) -> Result<Option<Event>> {
        let now = self.service.now_ms();
        let store = self.service.store();

        let raw = store.get(keys::TIMER_STATE)?;
        let state: TimerState = match raw.as_deref().map(serde_json::from_str::<TimerState>) {
            Some(Ok(state)) => state,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "unreadable timer state, treating as idle");
                TimerState::default()
            }
            None => TimerState::default(),
        };
        if !state.is_expired(now) {
            return Ok(None);
        }

        let durations = self.service.durations()?;
        let mut next = state;
        let Some(done) = next.complete(now, &durations) else {
            return Ok(None);
        };
        let encoded = serde_json::to_string(&next)?;

        // Record first: a failed state write leaves the session expired, so
        // the next tick retries and the second finalize is a no-op.
        self.service
            .sessions()
            .finalize(&done.session_id, Outcome::Completed, to_datetime(now))?;
        if !store.compare_and_swap(keys::TIMER_STATE, raw.as_deref(), &encoded)? {
            tracing::debug!(id = %done.session_id, "completion already committed elsewhere");
            return Ok(None);
        }

        tracing::info!(
            id = %done.session_id,
            finished = %done.finished,
            next = %done.next,
            completed_pomodoros = done.completed_pomodoros,
            "session completed"
        );

        if self.service.notifications_enabled()? {
            let notification = Notification::session_complete(done.finished, now);
            if let Err(e) = self.notifier.notify(&notification) {
                tracing::warn!(id = %notification.id, error = %e, "notification failed");
            }
        }

        Ok(Some(Event::SessionCompleted {
            session_id: done.session_id,
            session_type: done.finished,
            next_session_type: done.next,
            completed_pomodoros: done.completed_pomodoros,
            at: to_datetime(now),
        }))
    }

    /// One tick that never fails: errors are logged and the badge is cleared.
    pub fn tick_logged(&self) -> TickReport {
        let completed = match self.tick() {
            Ok(event) => event,
            Err(e) => {
                tracing::error!(error = %e, "tick failed");
                None
            }
        };
        let badge = match self.service.state() {
            Ok(state) => badge(&state, self.service.now_ms()),
            Err(e) => {
                tracing::error!(error = %e, "could not read timer state for badge");
                badge(&TimerState::default(), 0)
            }
        };
        TickReport { completed, badge }
    }

    /// Tick every `period` until `shutdown` resolves.
    pub async fn run_until<F>(&self, period: Duration, shutdown: F, mut on_tick: impl FnMut(&TickReport))
    where
        F: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("reconciler stopping");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.tick_logged();
                    on_tick(&report);
                }
            }
        }
    }
}
