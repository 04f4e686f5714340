// ============================================================================
// Session Core - Session Service
// File: crates/session-core/src/services/session_service.rs
// ============================================================================
//! Session lifecycle operations exposed to the rest of the backend

use std::sync::Arc;
use tracing::{info, warn};

use crate::audit::{AuditSink, SessionEvent, SessionEventKind};
use crate::domain::{Attributes, Role, SessionId, SessionRecord};
use crate::error::AuthError;
use crate::store::{BackendKind, Served, SessionStore, StoreMode};

/// Result of a logout. Callers always report success; `soft_warning` is for
/// logs and diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub invalidated: bool,
    pub soft_warning: Option<String>,
}

/// Result of a "log out everywhere" sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BulkLogoutOutcome {
    pub invalidated: usize,
    /// Set when part of the sweep could not reach the shared store, so other
    /// instances may still honour some of the subject's sessions.
    pub soft_warning: Option<String>,
}

/// Facade over the store that also emits lifecycle audit events.
pub struct SessionService {
    store: Arc<SessionStore>,
    audit: Arc<dyn AuditSink>,
}

impl SessionService {
    pub fn new(store: Arc<SessionStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { store, audit }
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub async fn create_session(
        &self,
        subject_id: &str,
        role: Role,
        extra: Attributes,
    ) -> SessionId {
        let session_id = self.store.create(subject_id, role, extra).await;
        self.emit(subject_id, SessionEventKind::Created);
        session_id
    }

    /// Renews and returns the session, or `SessionExpired` if it is gone.
    pub async fn validate_session(&self, session_id: &SessionId) -> Result<SessionRecord, AuthError> {
        self.store
            .validate(session_id)
            .await
            .ok_or(AuthError::SessionExpired)
    }

    pub async fn session_info(&self, session_id: &SessionId) -> Option<SessionRecord> {
        self.store.peek(session_id).await
    }

    pub async fn invalidate_session(&self, session_id: &SessionId) -> bool {
        let removed = self.store.remove(session_id).await.value;
        match removed {
            Some(record) => {
                self.emit(&record.subject_id, SessionEventKind::Invalidated);
                true
            }
            None => false,
        }
    }

    pub async fn list_user_sessions(&self, subject_id: &str) -> Vec<SessionId> {
        self.store.list_sessions(subject_id).await
    }

    pub async fn invalidate_all_user_sessions(&self, subject_id: &str) -> usize {
        self.sweep(subject_id).await.value
    }

    async fn sweep(&self, subject_id: &str) -> Served<usize> {
        let swept = self.store.invalidate_all(subject_id).await;
        for _ in 0..swept.value {
            self.emit(subject_id, SessionEventKind::Invalidated);
        }
        swept
    }

    /// Best-effort single-session logout. Never fails from the caller's side.
    pub async fn logout(&self, session_id: &SessionId) -> LogoutOutcome {
        let served = self.store.remove(session_id).await;
        let invalidated = match &served.value {
            Some(record) => {
                self.emit(&record.subject_id, SessionEventKind::Invalidated);
                true
            }
            None => false,
        };

        let soft_warning = self.soft_warning(served.served_by);

        match &soft_warning {
            Some(warning) => warn!("Logout of session {}: {}", session_id, warning),
            None => info!("Logout of session {} (invalidated: {})", session_id, invalidated),
        }

        LogoutOutcome {
            invalidated,
            soft_warning,
        }
    }

    /// "Log out everywhere" for one subject.
    pub async fn logout_all(&self, subject_id: &str) -> BulkLogoutOutcome {
        let swept = self.sweep(subject_id).await;
        let soft_warning = self.soft_warning(swept.served_by);

        match &soft_warning {
            Some(warning) => warn!(
                "Logout-all for subject {} invalidated {} sessions: {}",
                subject_id, swept.value, warning
            ),
            None => info!(
                "Logout-all for subject {} invalidated {} sessions",
                subject_id, swept.value
            ),
        }

        BulkLogoutOutcome {
            invalidated: swept.value,
            soft_warning,
        }
    }

    fn soft_warning(&self, served_by: BackendKind) -> Option<String> {
        if served_by == BackendKind::Fallback && self.store.mode() != StoreMode::FallbackOnly {
            Some("primary session store unreachable; applied to this instance only".to_string())
        } else {
            None
        }
    }

    fn emit(&self, subject_id: &str, kind: SessionEventKind) {
        let now = self.store.clock().now();
        self.audit.record(SessionEvent::new(subject_id, kind, now));
    }
}
