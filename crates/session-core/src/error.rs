//! Session layer errors

use std::time::Duration;
use thiserror::Error;

/// Rejections surfaced by the session validator.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Malformed, unsigned, or mismatched token. Always a hard rejection.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Token is well-formed but its session is gone; the client should re-login.
    #[error("Session expired")]
    SessionExpired,

    #[error("User not active")]
    InactiveUser,

    #[error("User directory error: {0}")]
    Directory(String),

    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),
}

/// Backend failures. Internal to the store; callers never see these.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session backend unavailable: {0}")]
    Unavailable(String),

    #[error("Session backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("Corrupt session record: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Connectivity failures trigger the fallback; corruption does not.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Corrupt(e.to_string())
    }
}
