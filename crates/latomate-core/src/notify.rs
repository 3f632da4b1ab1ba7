//! User-facing session-complete notifications.

use std::sync::Mutex;

use serde::Serialize;

use crate::timer::SessionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    WorkComplete,
    BreakComplete,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Unique per event: `pomodoro-complete-<ms>` or `break-complete-<ms>`.
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl Notification {
    /// The notification for a session of type `finished` ending at `now_ms`.
    pub fn session_complete(finished: SessionType, now_ms: u64) -> Self {
        if finished.is_break() {
            Self {
                id: format!("break-complete-{now_ms}"),
                kind: NotificationKind::BreakComplete,
                title: "LaTomate - Break Complete!".into(),
                message: "Refreshed and ready? Start a new session.".into(),
            }
        } else {
            Self {
                id: format!("pomodoro-complete-{now_ms}"),
                kind: NotificationKind::WorkComplete,
                title: "LaTomate - Work Session Complete!".into(),
                message: "Great job! Time for a break.".into(),
            }
        }
    }
}

pub type NotifyError = Box<dyn std::error::Error + Send + Sync>;

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        tracing::info!(
            id = %notification.id,
            kind = ?notification.kind,
            "{}: {}",
            notification.title,
            notification.message
        );
        Ok(())
    }
}

/// Keeps every notification it receives. Useful when embedding and in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .map_err(|_| "notification log poisoned")?
            .push(notification.clone());
        Ok(())
    }
}
