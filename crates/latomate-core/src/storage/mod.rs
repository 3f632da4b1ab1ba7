mod config;
pub mod database;
pub mod memory;

pub use config::{Config, LogConfig, NotificationsConfig, WatchConfig};
pub use database::Database;
pub use memory::MemoryStore;

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::{CoreError, StoreError};

/// Names of the persisted keys shared by every context.
pub mod keys {
    pub const TIMER_STATE: &str = "timerState";
    pub const SESSIONS: &str = "sessions";
    pub const TIMER_MODE: &str = "timerMode";
    pub const CUSTOM_DURATIONS: &str = "customDurations";
    pub const NOTIFICATIONS_ENABLED: &str = "notificationsEnabled";
    pub const RESET_ARMED_AT: &str = "resetArmedAt";
    pub const LANGUAGE: &str = "language";
    pub const THEME: &str = "theme";
}

/// A write observed on the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreChange {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// The persisted key-value store shared by the watch loop and every other
/// context.
///
/// Values are opaque strings (JSON in practice). Every successful write is
/// published to subscribers; dropping the receiver unsubscribes.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Write `new` only if the current value equals `expected` (`None` meaning
    /// absent). Returns whether the write happened.
    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StoreError>;

    fn subscribe(&self) -> broadcast::Receiver<StoreChange>;
}

const CHANGE_FEED_CAPACITY: usize = 64;

/// Broadcast side of the change notifications, shared by the backends.
#[derive(Debug)]
pub(crate) struct ChangeFeed {
    tx: broadcast::Sender<StoreChange>,
}

impl ChangeFeed {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self { tx }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.tx.subscribe()
    }

    pub(crate) fn publish(&self, key: &str, old_value: Option<String>, new_value: Option<String>) {
        if old_value == new_value {
            return;
        }
        // No receivers is fine.
        let _ = self.tx.send(StoreChange {
            key: key.to_string(),
            old_value,
            new_value,
        });
    }
}

/// Read and decode a JSON value.
///
/// Absent keys and values that no longer parse are both reported as `None`;
/// the caller falls back to defaults.
pub fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::warn!(key, error = %e, "ignoring unreadable stored value");
            Ok(None)
        }
    }
}

pub fn save_json<T: Serialize>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), CoreError> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)?;
    Ok(())
}

/// Returns the data directory.
///
/// `LATOMATE_DATA_DIR` wins when set; otherwise `~/.config/latomate[-dev]/`
/// depending on `LATOMATE_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, CoreError> {
    let dir = match std::env::var_os("LATOMATE_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("LATOMATE_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("latomate-dev")
            } else {
                base_dir.join("latomate")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        n: u32,
    }

    #[test]
    fn json_helpers_roundtrip() {
        let store = MemoryStore::new();
        save_json(&store, "sample", &Sample { n: 4 }).unwrap();
        let back: Option<Sample> = load_json(&store, "sample").unwrap();
        assert_eq!(back, Some(Sample { n: 4 }));
    }

    #[test]
    fn unreadable_value_is_treated_as_absent() {
        let store = MemoryStore::new();
        store.set("sample", "{not json").unwrap();
        let back: Option<Sample> = load_json(&store, "sample").unwrap();
        assert!(back.is_none());
        let missing: Option<Sample> = load_json(&store, "missing").unwrap();
        assert!(missing.is_none());
    }
}
