//! Authenticated principal handed to downstream handlers

use serde::Serialize;

use super::{Role, SessionId, SessionRecord};

/// Current entitlements of a subject, as known by the user directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub role: Role,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthenticatedPrincipal {
    pub subject_id: String,
    /// Resolved from the directory, not from the token.
    pub role: Role,
    #[serde(skip)]
    pub session_id: Option<SessionId>,
    #[serde(skip)]
    pub session: Option<SessionRecord>,
}

impl AuthenticatedPrincipal {
    /// False for legacy tokens that carry no session reference.
    pub fn is_session_bound(&self) -> bool {
        self.session_id.is_some()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }
}
