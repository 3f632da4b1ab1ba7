//! Persisted session history.
//!
//! The whole history is one JSON list under [`keys::SESSIONS`]. Reads come
//! back newest first; inserts past [`MAX_SESSIONS`] drop the oldest records.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};

use super::{Outcome, SessionFilter, SessionRecord};
use crate::error::Result;
use crate::storage::{keys, load_json, save_json, KeyValueStore};

pub const MAX_SESSIONS: usize = 1000;

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    fn load(&self) -> Result<Vec<SessionRecord>> {
        Ok(load_json(self.store.as_ref(), keys::SESSIONS)?.unwrap_or_default())
    }

    fn write(&self, sessions: &[SessionRecord]) -> Result<()> {
        save_json(self.store.as_ref(), keys::SESSIONS, &sessions)
    }

    /// Insert a record, or replace the one with the same id.
    pub fn save(&self, record: SessionRecord) -> Result<()> {
        let mut sessions = self.load()?;
        match sessions.iter_mut().find(|s| s.id == record.id) {
            Some(existing) => *existing = record,
            None => {
                tracing::debug!(id = %record.id, "recording new session");
                sessions.push(record);
                if sessions.len() > MAX_SESSIONS {
                    sort_newest_first(&mut sessions);
                    let dropped = sessions.len() - MAX_SESSIONS;
                    sessions.truncate(MAX_SESSIONS);
                    tracing::info!(dropped, "pruned oldest sessions");
                }
            }
        }
        self.write(&sessions)
    }

    /// Matching records, newest first.
    pub fn list(&self, filter: &SessionFilter) -> Result<Vec<SessionRecord>> {
        let mut sessions: Vec<SessionRecord> = self
            .load()?
            .into_iter()
            .filter(|s| filter.matches(s))
            .collect();
        sort_newest_first(&mut sessions);
        Ok(sessions)
    }

    pub fn all(&self) -> Result<Vec<SessionRecord>> {
        self.list(&SessionFilter::default())
    }

    pub fn get(&self, id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.load()?.into_iter().find(|s| s.id == id))
    }

    /// Move a pending record to its terminal outcome.
    ///
    /// Returns `false` without writing when the id is unknown or the record
    /// was already finalized.
    pub fn finalize(&self, id: &str, outcome: Outcome, at: DateTime<Utc>) -> Result<bool> {
        let mut sessions = self.load()?;
        let Some(record) = sessions.iter_mut().find(|s| s.id == id) else {
            tracing::warn!(id, "session not found for update");
            return Ok(false);
        };
        if !record.is_pending() {
            tracing::warn!(id, current = ?record.outcome(), "session already finalized");
            return Ok(false);
        }
        record.finalize(outcome, at);
        self.write(&sessions)?;
        tracing::info!(id, ?outcome, "session finalized");
        Ok(true)
    }

    /// Returns whether a record was removed.
    pub fn delete(&self, id: &str) -> Result<bool> {
        let mut sessions = self.load()?;
        let before = sessions.len();
        sessions.retain(|s| s.id != id);
        if sessions.len() == before {
            return Ok(false);
        }
        self.write(&sessions)?;
        tracing::info!(id, "session deleted");
        Ok(true)
    }

    pub fn delete_all(&self) -> Result<usize> {
        let count = self.load()?.len();
        self.write(&[])?;
        tracing::info!(count, "all sessions deleted");
        Ok(count)
    }

    pub fn count(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    /// Drop records that started more than `months` months before `now`.
    pub fn cleanup_older_than(&self, months: u32, now: DateTime<Utc>) -> Result<usize> {
        let cutoff = now
            .checked_sub_months(Months::new(months))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let mut sessions = self.load()?;
        let before = sessions.len();
        sessions.retain(|s| s.start_time >= cutoff);
        let removed = before - sessions.len();
        if removed > 0 {
            self.write(&sessions)?;
        }
        tracing::info!(removed, months, "cleaned up old sessions");
        Ok(removed)
    }

    /// Serialized size of the history in bytes.
    pub fn storage_size_bytes(&self) -> Result<usize> {
        Ok(serde_json::to_string(&self.load()?)?.len())
    }
}

fn sort_newest_first(sessions: &mut [SessionRecord]) {
    sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
}
