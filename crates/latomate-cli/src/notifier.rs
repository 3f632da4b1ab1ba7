//! Desktop delivery for session-complete notifications.

use std::sync::Arc;

use latomate_core::notify::{LogNotifier, Notification, Notifier, NotifyError};
use latomate_core::Config;

pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, notification: &Notification) -> Result<(), NotifyError> {
        notify_rust::Notification::new()
            .appname(&self.app_name)
            .summary(&notification.title)
            .body(&notification.message)
            .show()
            .map_err(|e| e.to_string())?;
        tracing::debug!(id = %notification.id, "desktop notification shown");
        Ok(())
    }
}

/// Desktop notifications when enabled in the config, log lines otherwise.
pub fn from_config(config: &Config) -> Arc<dyn Notifier> {
    if config.notifications.desktop {
        Arc::new(DesktopNotifier::new(config.notifications.app_name.clone()))
    } else {
        Arc::new(LogNotifier)
    }
}
