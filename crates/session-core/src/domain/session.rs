// ============================================================================
// Session Core - Session Record
// File: crates/session-core/src/domain/session.rs
// ============================================================================
//! Server-side session record and its opaque identifier

use chrono::{serde::ts_milliseconds, DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use super::Role;

/// Free-form context attached at creation (device, client app, IP, ...).
pub type Attributes = HashMap<String, Value>;

/// Opaque, unguessable session reference.
///
/// `Debug` and `Display` print a fingerprint, never the raw value.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(session_security::generate_session_id())
    }

    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    pub fn fingerprint(&self) -> String {
        session_security::fingerprint(&self.0)
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.fingerprint())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fingerprint())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: SessionId,
    pub subject_id: String,
    pub role: Role,
    #[serde(with = "ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "ts_milliseconds")]
    pub last_activity_at: DateTime<Utc>,
    /// Always `last_activity_at + timeout`.
    #[serde(with = "ts_milliseconds")]
    pub expires_at: DateTime<Utc>,
    #[serde(default)]
    pub attributes: Attributes,
}

impl SessionRecord {
    pub fn new(
        session_id: SessionId,
        subject_id: impl Into<String>,
        role: Role,
        attributes: Attributes,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> Self {
        Self {
            session_id,
            subject_id: subject_id.into(),
            role,
            created_at: now,
            last_activity_at: now,
            expires_at: now + timeout,
            attributes,
        }
    }

    /// A gap of exactly `timeout` since the last access already counts as expired.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Slides the window forward from `now`.
    pub fn touch(&mut self, now: DateTime<Utc>, timeout: Duration) {
        self.last_activity_at = now;
        self.expires_at = now + timeout;
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
