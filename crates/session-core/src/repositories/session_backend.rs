//! Session backend trait (port)
//!
//! Every method takes `now` explicitly so expiry is decided by the injected
//! clock, not by whoever implements the backend.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};

use crate::domain::{SessionId, SessionRecord};
use crate::error::StoreError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Writes a new record that expires `ttl` from now.
    async fn insert(&self, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError>;

    /// Atomic get-and-refresh: on hit, `last_activity_at = now` and the
    /// expiry slides to `now + timeout` before the copy is returned.
    async fn touch(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Read without renewing.
    async fn get(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError>;

    /// Deletes the record, returning it if it was still live.
    async fn remove(
        &self,
        session_id: &SessionId,
        now: DateTime<Utc>,
    ) -> Result<Option<SessionRecord>, StoreError>;

    async fn session_ids_for(
        &self,
        subject_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<SessionId>, StoreError>;
}
