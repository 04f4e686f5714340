//! Token issuance for an already-authenticated principal

use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use session_security::JwtService;

use crate::domain::{Attributes, Role, SessionId};
use crate::error::AuthError;
use crate::repositories::UserDirectory;
use crate::services::SessionService;

#[derive(Debug, Clone, Serialize)]
pub struct IssuedToken {
    pub access_token: String,
    pub token_type: &'static str,
    /// Hard expiry of the token itself, in seconds.
    pub expires_in: i64,
    #[serde(skip)]
    pub session_id: SessionId,
}

/// Creates the server-side session first, then mints a token that only
/// references it.
pub struct TokenIssuer {
    sessions: Arc<SessionService>,
    jwt: Arc<JwtService>,
}

impl TokenIssuer {
    pub fn new(sessions: Arc<SessionService>, jwt: Arc<JwtService>) -> Self {
        Self { sessions, jwt }
    }

    pub async fn issue(
        &self,
        subject_id: &str,
        role: Role,
        extra: Attributes,
    ) -> Result<IssuedToken, AuthError> {
        let session_id = self.sessions.create_session(subject_id, role, extra).await;

        let access_token = match self.jwt.generate_access_token(
            subject_id,
            role.as_str(),
            Some(session_id.as_str()),
        ) {
            Ok(token) => token,
            Err(e) => {
                error!("Token generation failed for subject {}: {}", subject_id, e);
                // Don't leave an unreachable session behind.
                self.sessions.invalidate_session(&session_id).await;
                return Err(AuthError::TokenIssuance(e.to_string()));
            }
        };

        info!("Issued access token for subject {} (session {})", subject_id, session_id);

        Ok(IssuedToken {
            access_token,
            token_type: "bearer",
            expires_in: self.jwt.access_token_expiry(),
            session_id,
        })
    }

    /// Issues for a subject whose credentials an upstream already checked.
    /// The role comes from the directory; unknown or inactive subjects get
    /// nothing.
    pub async fn issue_for(
        &self,
        directory: &dyn UserDirectory,
        subject_id: &str,
        extra: Attributes,
    ) -> Result<IssuedToken, AuthError> {
        let entry = directory.lookup(subject_id).await?.ok_or_else(|| {
            warn!("Refusing to issue a token for unknown subject {}", subject_id);
            AuthError::Authentication("unknown subject".to_string())
        })?;
        if !entry.is_active {
            warn!("Refusing to issue a token for inactive subject {}", subject_id);
            return Err(AuthError::InactiveUser);
        }
        self.issue(subject_id, entry.role, extra).await
    }
}
