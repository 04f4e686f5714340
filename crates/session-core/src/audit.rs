//! Session lifecycle audit events
//!
//! Delivery is fire-and-forget: `AuditSink::record` must return immediately
//! and must never fail the request that produced the event.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::AuthError;
use crate::services::ValidationReport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionEventKind {
    Created,
    Validated,
    Expired,
    Invalidated,
}

impl SessionEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Validated => "validated",
            Self::Expired => "expired",
            Self::Invalidated => "invalidated",
        }
    }
}

/// Never carries the session id itself.
#[derive(Debug, Clone, Serialize)]
pub struct SessionEvent {
    pub event_id: Uuid,
    pub subject_id: String,
    pub kind: SessionEventKind,
    pub timestamp: DateTime<Utc>,
}

impl SessionEvent {
    pub fn new(subject_id: impl Into<String>, kind: SessionEventKind, timestamp: DateTime<Utc>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            subject_id: subject_id.into(),
            kind,
            timestamp,
        }
    }
}

pub trait AuditSink: Send + Sync {
    fn record(&self, event: SessionEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: SessionEvent) {}
}

/// Keeps every event in memory. Handy for tests and local runs.
#[derive(Debug, Default)]
pub struct RecordingAuditSink {
    events: Mutex<Vec<SessionEvent>>,
}

impl RecordingAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SessionEvent> {
        self.events.lock().clone()
    }

    pub fn kinds(&self) -> Vec<SessionEventKind> {
        self.events.lock().iter().map(|e| e.kind).collect()
    }
}

impl AuditSink for RecordingAuditSink {
    fn record(&self, event: SessionEvent) {
        self.events.lock().push(event);
    }
}

/// Interceptor stage run after the session validator on every protected
/// request. Turns a validation report into `validated` / `expired` events.
#[derive(Clone)]
pub struct AuditInterceptor {
    sink: Arc<dyn AuditSink>,
    clock: Arc<dyn Clock>,
}

impl AuditInterceptor {
    pub fn new(sink: Arc<dyn AuditSink>, clock: Arc<dyn Clock>) -> Self {
        Self { sink, clock }
    }

    pub fn observe(&self, report: &ValidationReport) {
        if !report.session_bound {
            return;
        }
        let Some(subject_id) = report.subject_id.as_deref() else {
            return;
        };
        // The session transition is what gets audited, not the request verdict.
        let kind = if report.session_renewed {
            SessionEventKind::Validated
        } else if matches!(report.result, Err(AuthError::SessionExpired)) {
            SessionEventKind::Expired
        } else {
            return;
        };
        self.sink
            .record(SessionEvent::new(subject_id, kind, self.clock.now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;
    use crate::domain::{AuthenticatedPrincipal, Role, SessionId};

    fn interceptor(sink: Arc<RecordingAuditSink>) -> AuditInterceptor {
        AuditInterceptor::new(sink, Arc::new(SystemClock))
    }

    fn principal() -> AuthenticatedPrincipal {
        AuthenticatedPrincipal {
            subject_id: "u1".into(),
            role: Role::Doctor,
            session_id: Some(SessionId::new("s")),
            session: None,
        }
    }

    #[test]
    fn test_validated_and_expired_events() {
        let sink = Arc::new(RecordingAuditSink::new());
        let stage = interceptor(sink.clone());

        stage.observe(&ValidationReport {
            subject_id: Some("u1".into()),
            session_bound: true,
            session_renewed: true,
            result: Ok(principal()),
        });
        stage.observe(&ValidationReport {
            subject_id: Some("u1".into()),
            session_bound: true,
            session_renewed: false,
            result: Err(AuthError::SessionExpired),
        });

        assert_eq!(
            sink.kinds(),
            vec![SessionEventKind::Validated, SessionEventKind::Expired]
        );
        assert!(sink.events().iter().all(|e| e.subject_id == "u1"));
    }

    #[test]
    fn test_no_event_for_bad_tokens_or_unbound_tokens() {
        let sink = Arc::new(RecordingAuditSink::new());
        let stage = interceptor(sink.clone());

        stage.observe(&ValidationReport {
            subject_id: None,
            session_bound: false,
            session_renewed: false,
            result: Err(AuthError::Authentication("bad signature".into())),
        });
        stage.observe(&ValidationReport {
            subject_id: Some("u1".into()),
            session_bound: false,
            session_renewed: false,
            result: Ok(principal()),
        });
        stage.observe(&ValidationReport {
            subject_id: Some("u1".into()),
            session_bound: true,
            session_renewed: false,
            result: Err(AuthError::Authentication("mismatch".into())),
        });

        assert!(sink.events().is_empty());
    }

    #[test]
    fn test_renewed_session_is_audited_even_when_subject_is_rejected() {
        let sink = Arc::new(RecordingAuditSink::new());
        let stage = interceptor(sink.clone());

        stage.observe(&ValidationReport {
            subject_id: Some("u1".into()),
            session_bound: true,
            session_renewed: true,
            result: Err(AuthError::InactiveUser),
        });

        assert_eq!(sink.kinds(), vec![SessionEventKind::Validated]);
    }

    #[test]
    fn test_event_serialization_has_no_session_id() {
        let event = SessionEvent::new("u1", SessionEventKind::Invalidated, Utc::now());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["kind"], "invalidated");
        assert!(json.get("session_id").is_none());
    }
}
