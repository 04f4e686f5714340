// ============================================================================
// Session Core - Session Store
// File: crates/session-core/src/store/session_store.rs
// ============================================================================
//! Sliding-window session store with a process-local fallback
//!
//! The primary backend is the deployment-wide authority on session liveness.
//! Every operation asks the primary first. When it cannot answer within
//! `operation_timeout`, that call is served by the in-process map instead and
//! the store reports itself as degraded until the primary answers again. The
//! fallback is never shared between instances.

use chrono::Duration;
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use session_shared::config::SessionSettings;

use crate::clock::Clock;
use crate::domain::{Attributes, Role, SessionId, SessionRecord};
use crate::error::StoreError;
use crate::repositories::SessionBackend;
use crate::store::memory::MemorySessionBackend;

/// Health signal for the session layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// Primary reachable; full cross-instance guarantees.
    Primary,
    /// Primary configured but unreachable; serving from the local fallback.
    Degraded,
    /// No primary configured; single-instance guarantees only.
    FallbackOnly,
}

impl StoreMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreMode::Primary => "primary",
            StoreMode::Degraded => "degraded",
            StoreMode::FallbackOnly => "fallback_only",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Primary,
    Fallback,
}

/// A result tagged with the backend that produced it.
#[derive(Debug, Clone)]
pub struct Served<T> {
    pub value: T,
    pub served_by: BackendKind,
}

#[derive(Debug, Clone)]
pub struct StorePolicy {
    /// Sliding inactivity timeout.
    pub timeout: Duration,
    /// Upper bound for any single primary call.
    pub operation_timeout: std::time::Duration,
}

impl StorePolicy {
    pub fn with_timeout_secs(secs: i64) -> Self {
        Self {
            timeout: Duration::seconds(secs),
            ..Self::default()
        }
    }
}

impl Default for StorePolicy {
    fn default() -> Self {
        Self::from(&SessionSettings::default())
    }
}

impl From<&SessionSettings> for StorePolicy {
    fn from(settings: &SessionSettings) -> Self {
        Self {
            timeout: Duration::seconds(settings.timeout_seconds as i64),
            operation_timeout: settings.operation_timeout(),
        }
    }
}

pub struct SessionStore {
    primary: Option<Arc<dyn SessionBackend>>,
    fallback: MemorySessionBackend,
    clock: Arc<dyn Clock>,
    policy: StorePolicy,
    degraded: AtomicBool,
}

impl SessionStore {
    pub fn new(
        primary: Option<Arc<dyn SessionBackend>>,
        clock: Arc<dyn Clock>,
        policy: StorePolicy,
    ) -> Self {
        if primary.is_some() {
            info!(
                "SessionStore initialized with primary backend (timeout: {}s)",
                policy.timeout.num_seconds()
            );
        } else {
            warn!("SessionStore initialized with in-memory backend only (not shared across instances)");
        }
        Self {
            primary,
            fallback: MemorySessionBackend::new(),
            clock,
            policy,
            degraded: AtomicBool::new(false),
        }
    }

    /// Store with no networked primary.
    pub fn in_memory(clock: Arc<dyn Clock>, policy: StorePolicy) -> Self {
        Self::new(None, clock, policy)
    }

    pub fn policy(&self) -> &StorePolicy {
        &self.policy
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn mode(&self) -> StoreMode {
        if self.primary.is_none() {
            StoreMode::FallbackOnly
        } else if self.degraded.load(Ordering::Acquire) {
            StoreMode::Degraded
        } else {
            StoreMode::Primary
        }
    }

    /// True whenever sessions are (or may be) served by the process-local map.
    pub fn is_degraded(&self) -> bool {
        self.mode() != StoreMode::Primary
    }

    /// Entries in the local fallback, expired ones included.
    pub fn fallback_len(&self) -> usize {
        self.fallback.len()
    }

    pub async fn create(&self, subject_id: &str, role: Role, extra: Attributes) -> SessionId {
        let now = self.clock.now();
        let record = SessionRecord::new(
            SessionId::generate(),
            subject_id,
            role,
            extra,
            now,
            self.policy.timeout,
        );
        let session_id = record.session_id.clone();

        if let Some(primary) = self.primary.as_ref() {
            match self
                .guard("create", primary.insert(&record, self.policy.timeout))
                .await
            {
                Ok(()) => {
                    info!("Session {} created for subject {}", session_id, subject_id);
                    return session_id;
                }
                Err(e) if !e.is_connectivity() => {
                    error!("Primary rejected session {}: {}", session_id, e);
                }
                Err(_) => {}
            }
        }

        self.fallback.insert_record(record);
        info!(
            "Session {} created in process-local store for subject {}",
            session_id, subject_id
        );
        session_id
    }

    /// Atomic get-and-refresh. `None` covers both "never existed" and "expired".
    pub async fn validate(&self, session_id: &SessionId) -> Option<SessionRecord> {
        let now = self.clock.now();

        if let Some(primary) = self.primary.as_ref() {
            match self
                .guard("validate", primary.touch(session_id, now, self.policy.timeout))
                .await
            {
                Ok(Some(record)) => {
                    debug!("Session {} validated and renewed", session_id);
                    return Some(record);
                }
                Ok(None) => {
                    debug!("Session {} not found or expired", session_id);
                    return None;
                }
                Err(e) if !e.is_connectivity() => {
                    error!("Unreadable session {} treated as not found: {}", session_id, e);
                    return None;
                }
                Err(_) => {}
            }
        }

        let found = self
            .fallback
            .touch_record(session_id, now, self.policy.timeout);
        if found.is_none() {
            debug!("In-memory session {} not found or expired", session_id);
        }
        found
    }

    /// Reads a session without renewing it.
    pub async fn peek(&self, session_id: &SessionId) -> Option<SessionRecord> {
        let now = self.clock.now();

        if let Some(primary) = self.primary.as_ref() {
            match self.guard("peek", primary.get(session_id, now)).await {
                Ok(found) => return found,
                Err(e) if !e.is_connectivity() => {
                    error!("Unreadable session {}: {}", session_id, e);
                    return None;
                }
                Err(_) => {}
            }
        }

        self.fallback.get_record(session_id, now)
    }

    pub async fn invalidate(&self, session_id: &SessionId) -> bool {
        self.remove(session_id).await.value.is_some()
    }

    /// Removes a session and returns the record that was removed, tagged with
    /// the backend that served the removal. Any local copy is always dropped.
    pub async fn remove(&self, session_id: &SessionId) -> Served<Option<SessionRecord>> {
        let now = self.clock.now();
        let local = self.fallback.remove_record(session_id, now);

        if let Some(primary) = self.primary.as_ref() {
            match self.guard("invalidate", primary.remove(session_id, now)).await {
                Ok(removed) => {
                    info!("Session {} invalidated", session_id);
                    return Served {
                        value: removed.or(local),
                        served_by: BackendKind::Primary,
                    };
                }
                Err(e) if !e.is_connectivity() => {
                    error!("Primary failed to invalidate session {}: {}", session_id, e);
                    return Served {
                        value: local,
                        served_by: BackendKind::Primary,
                    };
                }
                Err(_) => {}
            }
        }

        debug!("In-memory session {} invalidated", session_id);
        Served {
            value: local,
            served_by: BackendKind::Fallback,
        }
    }

    /// Administrative enumeration; never used on the request path.
    pub async fn list_sessions(&self, subject_id: &str) -> Vec<SessionId> {
        self.enumerate(subject_id).await.value
    }

    /// Invalidates every session of the subject. `served_by` is `Fallback`
    /// if any part of the sweep could not reach the primary.
    pub async fn invalidate_all(&self, subject_id: &str) -> Served<usize> {
        let listed = self.enumerate(subject_id).await;
        let mut served_by = listed.served_by;
        let mut count = 0;
        for session_id in &listed.value {
            let removed = self.remove(session_id).await;
            if removed.served_by == BackendKind::Fallback {
                served_by = BackendKind::Fallback;
            }
            if removed.value.is_some() {
                count += 1;
            }
        }

        if served_by == BackendKind::Fallback && self.primary.is_some() {
            warn!(
                "Invalidated {} sessions for subject {} without the primary store",
                count, subject_id
            );
        } else {
            info!("Invalidated {} sessions for subject {}", count, subject_id);
        }
        Served {
            value: count,
            served_by,
        }
    }

    async fn enumerate(&self, subject_id: &str) -> Served<Vec<SessionId>> {
        let now = self.clock.now();
        let mut ids = Vec::new();
        let mut served_by = BackendKind::Fallback;

        if let Some(primary) = self.primary.as_ref() {
            match self
                .guard("list_sessions", primary.session_ids_for(subject_id, now))
                .await
            {
                Ok(found) => {
                    ids = found;
                    served_by = BackendKind::Primary;
                }
                Err(e) if !e.is_connectivity() => {
                    error!("Failed to enumerate sessions for {}: {}", subject_id, e);
                    served_by = BackendKind::Primary;
                }
                Err(_) => {}
            }
        }

        // Sessions created locally during an outage belong to the subject too.
        let mut seen: HashSet<SessionId> = ids.iter().cloned().collect();
        for id in self.fallback.session_ids_for_subject(subject_id, now) {
            if seen.insert(id.clone()) {
                ids.push(id);
            }
        }
        Served {
            value: ids,
            served_by,
        }
    }

    /// Reclaims expired fallback entries. The primary expires keys natively.
    pub async fn purge_expired(&self) -> usize {
        let removed = self.fallback.purge(self.clock.now());
        if removed > 0 {
            info!("Cleaned up {} expired in-memory sessions", removed);
        }
        removed
    }

    async fn guard<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        let result = match tokio::time::timeout(self.policy.operation_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.policy.operation_timeout)),
        };
        match &result {
            Ok(_) => self.mark_primary_healthy(),
            Err(e) if e.is_connectivity() => self.mark_primary_down(op, e),
            Err(_) => {}
        }
        result
    }

    fn mark_primary_down(&self, op: &str, cause: &StoreError) {
        if !self.degraded.swap(true, Ordering::AcqRel) {
            warn!(
                "Primary session backend unreachable during {}: {}. Degraded session mode: serving from process-local store",
                op, cause
            );
        } else {
            debug!("Primary session backend still unreachable during {}: {}", op, cause);
        }
    }

    fn mark_primary_healthy(&self) {
        if self.degraded.swap(false, Ordering::AcqRel) {
            info!("Primary session backend recovered, leaving degraded session mode");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::repositories::MockSessionBackend;
    use chrono::{DateTime, TimeZone, Utc};
    use std::sync::atomic::AtomicUsize;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(
            Utc.timestamp_opt(1_760_000_000, 0).unwrap(),
        ))
    }

    fn policy() -> StorePolicy {
        StorePolicy {
            timeout: Duration::seconds(900),
            operation_timeout: std::time::Duration::from_millis(50),
        }
    }

    /// Store whose "primary" is a second deterministic in-memory backend.
    fn layered(clock: Arc<ManualClock>) -> (SessionStore, Arc<MemorySessionBackend>) {
        let primary = Arc::new(MemorySessionBackend::new());
        let store = SessionStore::new(Some(primary.clone() as Arc<dyn SessionBackend>), clock, policy());
        (store, primary)
    }

    fn unreachable_primary() -> MockSessionBackend {
        let mut mock = MockSessionBackend::new();
        mock.expect_insert()
            .returning(|_, _| Err(StoreError::Unavailable("connection refused".into())));
        mock.expect_touch()
            .returning(|_, _, _| Err(StoreError::Unavailable("connection refused".into())));
        mock.expect_get()
            .returning(|_, _| Err(StoreError::Unavailable("connection refused".into())));
        mock.expect_remove()
            .returning(|_, _| Err(StoreError::Unavailable("connection refused".into())));
        mock.expect_session_ids_for()
            .returning(|_, _| Err(StoreError::Unavailable("connection refused".into())));
        mock
    }

    /// In-memory primary whose `touch` fails a set number of times.
    struct FlakyPrimary {
        inner: MemorySessionBackend,
        touch_failures: AtomicUsize,
    }

    impl FlakyPrimary {
        fn failing_touches(n: usize) -> Self {
            Self {
                inner: MemorySessionBackend::new(),
                touch_failures: AtomicUsize::new(n),
            }
        }
    }

    #[async_trait::async_trait]
    impl SessionBackend for FlakyPrimary {
        async fn insert(&self, record: &SessionRecord, ttl: Duration) -> Result<(), StoreError> {
            self.inner.insert(record, ttl).await
        }
        async fn touch(
            &self,
            session_id: &SessionId,
            now: DateTime<Utc>,
            timeout: Duration,
        ) -> Result<Option<SessionRecord>, StoreError> {
            let failing = self
                .touch_failures
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err(StoreError::Unavailable("connection reset".into()));
            }
            self.inner.touch(session_id, now, timeout).await
        }
        async fn get(&self, session_id: &SessionId, now: DateTime<Utc>) -> Result<Option<SessionRecord>, StoreError> {
            self.inner.get(session_id, now).await
        }
        async fn remove(&self, session_id: &SessionId, now: DateTime<Utc>) -> Result<Option<SessionRecord>, StoreError> {
            self.inner.remove(session_id, now).await
        }
        async fn session_ids_for(&self, subject_id: &str, now: DateTime<Utc>) -> Result<Vec<SessionId>, StoreError> {
            self.inner.session_ids_for(subject_id, now).await
        }
    }

    #[tokio::test]
    async fn test_validate_right_after_create() {
        let clock = clock();
        let (store, primary) = layered(clock);
        let id = store.create("u1", Role::Doctor, Attributes::new()).await;

        let record = store.validate(&id).await.expect("fresh session");
        assert_eq!(record.subject_id, "u1");
        assert_eq!(record.role, Role::Doctor);
        assert_eq!(primary.len(), 1);
        assert_eq!(store.fallback_len(), 0);
        assert_eq!(store.mode(), StoreMode::Primary);
    }

    #[tokio::test]
    async fn test_sliding_window_scenario() {
        let clock = clock();
        let (store, _) = layered(clock.clone());
        let id = store.create("u1", Role::Doctor, Attributes::new()).await;

        assert_eq!(store.validate(&id).await.unwrap().role, Role::Doctor);

        clock.advance_secs(800);
        let renewed = store.validate(&id).await.expect("still within window");
        assert_eq!(renewed.expires_at, clock.now() + Duration::seconds(900));
        assert_eq!(renewed.last_activity_at, clock.now());

        clock.advance_secs(901);
        assert!(store.validate(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_frequent_activity_keeps_session_alive() {
        let clock = clock();
        let (store, _) = layered(clock.clone());
        let id = store.create("u1", Role::Patient, Attributes::new()).await;

        for _ in 0..20 {
            clock.advance_secs(899);
            assert!(store.validate(&id).await.is_some());
        }
    }

    #[tokio::test]
    async fn test_gap_of_exactly_timeout_expires() {
        let clock = clock();
        let (store, _) = layered(clock.clone());
        let id = store.create("u1", Role::Patient, Attributes::new()).await;
        clock.advance_secs(900);
        assert!(store.validate(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_then_validate_is_not_found() {
        let clock = clock();
        let (store, _) = layered(clock);
        let id = store.create("u1", Role::Lab, Attributes::new()).await;

        assert!(store.invalidate(&id).await);
        assert!(store.validate(&id).await.is_none());
        assert!(!store.invalidate(&id).await);
    }

    #[tokio::test]
    async fn test_peek_does_not_renew() {
        let clock = clock();
        let (store, _) = layered(clock.clone());
        let id = store.create("u1", Role::Lab, Attributes::new()).await;

        clock.advance_secs(600);
        let seen = store.peek(&id).await.unwrap();
        assert_eq!(seen.last_activity_at, seen.created_at);

        clock.advance_secs(300);
        assert!(store.peek(&id).await.is_none());
        assert!(store.validate(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_all_only_touches_one_subject() {
        let clock = clock();
        let (store, _) = layered(clock);
        let s1 = store.create("u1", Role::Doctor, Attributes::new()).await;
        let s2 = store.create("u1", Role::Doctor, Attributes::new()).await;
        let other = store.create("u2", Role::Doctor, Attributes::new()).await;

        assert_eq!(store.list_sessions("u1").await.len(), 2);
        let swept = store.invalidate_all("u1").await;
        assert_eq!(swept.value, 2);
        assert_eq!(swept.served_by, BackendKind::Primary);
        assert!(store.validate(&s1).await.is_none());
        assert!(store.validate(&s2).await.is_none());
        assert!(store.validate(&other).await.is_some());
        assert_eq!(store.invalidate_all("u1").await.value, 0);
    }

    #[tokio::test]
    async fn test_unreachable_primary_falls_back_transparently() {
        let clock = clock();
        let store = SessionStore::new(Some(Arc::new(unreachable_primary()) as Arc<dyn SessionBackend>), clock, policy());

        let id = store.create("u1", Role::Pharmacy, Attributes::new()).await;
        assert_eq!(store.mode(), StoreMode::Degraded);
        assert!(store.is_degraded());
        assert_eq!(store.fallback_len(), 1);

        assert_eq!(store.validate(&id).await.unwrap().subject_id, "u1");
        assert_eq!(store.list_sessions("u1").await, vec![id.clone()]);

        let removed = store.remove(&id).await;
        assert!(removed.value.is_some());
        assert_eq!(removed.served_by, BackendKind::Fallback);
        assert!(store.validate(&id).await.is_none());
    }

    #[tokio::test]
    async fn test_invalidate_all_during_outage_is_flagged_as_fallback() {
        let store = SessionStore::new(Some(Arc::new(unreachable_primary()) as Arc<dyn SessionBackend>), clock(), policy());
        store.create("u1", Role::Doctor, Attributes::new()).await;

        let swept = store.invalidate_all("u1").await;
        assert_eq!(swept.value, 1);
        assert_eq!(swept.served_by, BackendKind::Fallback);
    }

    #[tokio::test]
    async fn test_one_primary_error_does_not_expire_live_sessions() {
        let clock = clock();
        let primary = Arc::new(FlakyPrimary::failing_touches(1));
        let store = SessionStore::new(Some(primary.clone() as Arc<dyn SessionBackend>), clock.clone(), policy());
        let s1 = store.create("u1", Role::Doctor, Attributes::new()).await;

        // An unrelated request hits the one failure.
        assert!(store.validate(&SessionId::new("someone-else")).await.is_none());
        assert_eq!(store.mode(), StoreMode::Degraded);

        // The very next call goes back to the primary and finds s1.
        assert_eq!(store.validate(&s1).await.unwrap().subject_id, "u1");
        assert_eq!(store.mode(), StoreMode::Primary);
    }

    #[tokio::test]
    async fn test_invalidation_right_after_primary_error_is_immediate() {
        let clock = clock();
        let primary = Arc::new(FlakyPrimary::failing_touches(1));
        let store = SessionStore::new(Some(primary.clone() as Arc<dyn SessionBackend>), clock.clone(), policy());
        let s1 = store.create("u1", Role::Doctor, Attributes::new()).await;
        let s2 = store.create("u1", Role::Doctor, Attributes::new()).await;
        store.validate(&SessionId::new("someone-else")).await;

        let swept = store.invalidate_all("u1").await;
        assert_eq!(swept.value, 2);
        assert_eq!(swept.served_by, BackendKind::Primary);
        assert!(!store.invalidate(&s1).await);

        clock.advance_secs(6);
        assert!(store.validate(&s1).await.is_none());
        assert!(store.validate(&s2).await.is_none());
        assert!(primary.inner.is_empty());
    }

    #[tokio::test]
    async fn test_primary_is_retried_on_the_next_call() {
        let clock = clock();
        let mut mock = MockSessionBackend::new();
        mock.expect_insert()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("down".into())));
        mock.expect_touch()
            .times(1)
            .returning(|_, _, _| Ok(None));
        let store = SessionStore::new(Some(Arc::new(mock) as Arc<dyn SessionBackend>), clock, policy());

        let id = store.create("u1", Role::Doctor, Attributes::new()).await;
        assert_eq!(store.mode(), StoreMode::Degraded);

        // Primary answers again: it has never seen the outage-era session.
        assert!(store.validate(&id).await.is_none());
        assert_eq!(store.mode(), StoreMode::Primary);
    }

    #[tokio::test]
    async fn test_slow_primary_times_out_into_fallback() {
        struct Stalled;

        #[async_trait::async_trait]
        impl SessionBackend for Stalled {
            async fn insert(&self, _: &SessionRecord, _: Duration) -> Result<(), StoreError> {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                Ok(())
            }
            async fn touch(
                &self,
                _: &SessionId,
                _: DateTime<Utc>,
                _: Duration,
            ) -> Result<Option<SessionRecord>, StoreError> {
                tokio::time::sleep(std::time::Duration::from_secs(30)).await;
                Ok(None)
            }
            async fn get(&self, _: &SessionId, _: DateTime<Utc>) -> Result<Option<SessionRecord>, StoreError> {
                Ok(None)
            }
            async fn remove(&self, _: &SessionId, _: DateTime<Utc>) -> Result<Option<SessionRecord>, StoreError> {
                Ok(None)
            }
            async fn session_ids_for(&self, _: &str, _: DateTime<Utc>) -> Result<Vec<SessionId>, StoreError> {
                Ok(Vec::new())
            }
        }

        let store = SessionStore::new(Some(Arc::new(Stalled) as Arc<dyn SessionBackend>), clock(), policy());
        let started = std::time::Instant::now();
        let id = store.create("u1", Role::Doctor, Attributes::new()).await;
        assert!(started.elapsed() < std::time::Duration::from_secs(5));
        assert_eq!(store.mode(), StoreMode::Degraded);
        assert!(store.validate(&id).await.is_some());
    }

    #[tokio::test]
    async fn test_corrupt_primary_record_is_not_found_without_fallback() {
        let mut mock = MockSessionBackend::new();
        mock.expect_touch()
            .returning(|_, _, _| Err(StoreError::Corrupt("expected value".into())));
        let store = SessionStore::new(Some(Arc::new(mock) as Arc<dyn SessionBackend>), clock(), policy());

        assert!(store.validate(&SessionId::new("x")).await.is_none());
        assert_eq!(store.mode(), StoreMode::Primary);
    }

    #[tokio::test]
    async fn test_invalidate_all_reaches_sessions_created_during_outage() {
        let clock = clock();
        let mut mock = MockSessionBackend::new();
        mock.expect_insert()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("down".into())));
        mock.expect_session_ids_for()
            .returning(|_, _| Ok(Vec::new()));
        mock.expect_remove().returning(|_, _| Ok(None));
        let store = SessionStore::new(Some(Arc::new(mock) as Arc<dyn SessionBackend>), clock.clone(), policy());

        store.create("u1", Role::Doctor, Attributes::new()).await;
        clock.advance_secs(10);
        let swept = store.invalidate_all("u1").await;
        assert_eq!(swept.value, 1);
        assert_eq!(swept.served_by, BackendKind::Primary);
        assert_eq!(store.fallback_len(), 0);
    }

    #[tokio::test]
    async fn test_fallback_only_mode_and_purge() {
        let clock = clock();
        let store = SessionStore::in_memory(clock.clone(), policy());
        assert_eq!(store.mode(), StoreMode::FallbackOnly);

        store.create("u1", Role::Doctor, Attributes::new()).await;
        store.create("u2", Role::Doctor, Attributes::new()).await;
        clock.advance_secs(1000);
        assert_eq!(store.purge_expired().await, 2);
        assert_eq!(store.fallback_len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_validation_never_reports_false_expiry() {
        let clock = clock();
        let (store, _) = layered(clock);
        let store = Arc::new(store);
        let id = store.create("u1", Role::Doctor, Attributes::new()).await;

        let mut handles = Vec::new();
        for _ in 0..32 {
            let store = store.clone();
            let id = id.clone();
            handles.push(tokio::spawn(async move {
                let mut alive = 0;
                for _ in 0..50 {
                    if store.validate(&id).await.is_some() {
                        alive += 1;
                    }
                }
                alive
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), 50);
        }
    }
}
