//! Process-local session backend
//!
//! Expiry is tracked by hand. Expired entries are dropped lazily when read,
//! and pruned during enumeration or an explicit purge; there is no timer.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use crate::domain::{SessionId, SessionRecord};
use crate::error::StoreError;
use crate::repositories::SessionBackend;

/// DashMap-backed store. Each check-refresh-write runs under the key's shard
/// lock, so concurrent renewals of one session are serialised.
#[derive(Debug, Default)]
pub struct MemorySessionBackend {
    sessions: DashMap<SessionId, SessionRecord>,
}

impl MemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries currently held, including expired ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn insert_record(&self, record: SessionRecord) {
        self.sessions.insert(record.session_id.clone(), record);
    }

    pub fn touch_record(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Option<SessionRecord> {
        match self.sessions.entry(session_id.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().is_expired_at(now) {
                    entry.remove();
                    debug!("In-memory session {} expired, removed", session_id);
                    return None;
                }
                let record = entry.get_mut();
                record.touch(now, timeout);
                Some(record.clone())
            }
            Entry::Vacant(_) => None,
        }
    }

    pub fn get_record(&self, session_id: &SessionId, now: DateTime<Utc>) -> Option<SessionRecord> {
        let record = self.sessions.get(session_id)?.value().clone();
        if record.is_expired_at(now) {
            self.sessions
                .remove_if(session_id, |_, r| r.is_expired_at(now));
            return None;
        }
        Some(record)
    }

    pub fn remove_record(&self, session_id: &SessionId, now: DateTime<Utc>) -> Option<SessionRecord> {
        self.sessions
            .remove(session_id)
            .map(|(_, record)| record)
            .filter(|record| !record.is_expired_at(now))
    }

    pub fn session_ids_for_subject(&self, subject_id: &str, now: DateTime<Utc>) -> Vec<SessionId> {
        self.purge(now);
        self.sessions
            .iter()
            .filter(|entry| entry.value().subject_id == subject_id)
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn purge(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions.retain(|_, record| !record.is_expired_at(now));
        let removed = before.saturating_sub(self.sessions.len());
        if removed > 0 {
            debug!("Purged {} expired in-memory sessions", removed);
        }
        removed
    }
}

#[async_trait]
impl SessionBackend for MemorySessionBackend {
    async fn insert(&self, record: &SessionRecord, _ttl: Duration) -> Result<(), StoreError> {
        self.insert_record(record.clone());
        Ok(())
    }

    async fn touch(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.touch_record(session_id, now, timeout))
    }

    async fn get(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.get_record(session_id, now))
    }

    async fn remove(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self.remove_record(session_id, now))
    }

    async fn session_ids_for(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionId>, StoreError> {
        Ok(self.session_ids_for_subject(subject_id, now))
    }
}
