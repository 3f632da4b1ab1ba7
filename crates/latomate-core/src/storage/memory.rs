//! In-process store for tests and embedding.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::sync::broadcast;

use super::{ChangeFeed, KeyValueStore, StoreChange};
use crate::error::StoreError;

#[derive(Debug)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    feed: ChangeFeed,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            values: Mutex::new(HashMap::new()),
            feed: ChangeFeed::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let old = {
            let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
            values.insert(key.to_string(), value.to_string())
        };
        self.feed.publish(key, old, Some(value.to_string()));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        let old = {
            let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
            values.remove(key)
        };
        self.feed.publish(key, old, None);
        Ok(())
    }

    fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<&str>,
        new: &str,
    ) -> Result<bool, StoreError> {
        let old = {
            let mut values = self.values.lock().map_err(|_| StoreError::Poisoned)?;
            if values.get(key).map(String::as_str) != expected {
                return Ok(false);
            }
            values.insert(key.to_string(), new.to_string())
        };
        self.feed.publish(key, old, Some(new.to_string()));
        Ok(true)
    }

    fn subscribe(&self) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe()
    }
}
