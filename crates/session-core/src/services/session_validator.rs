// ============================================================================
// Session Core - Session Validator
// File: crates/session-core/src/services/session_validator.rs
// ============================================================================
//! Binds a bearer token to its server-side session on every protected request

use std::sync::Arc;
use tracing::{debug, warn};

use session_security::JwtService;

use crate::domain::{AuthenticatedPrincipal, Role, SessionId, SessionRecord};
use crate::error::AuthError;
use crate::repositories::UserDirectory;
use crate::services::SessionService;

/// Outcome of validating one request, with enough context for the audit stage.
#[derive(Debug)]
pub struct ValidationReport {
    /// Subject claimed by a correctly signed token, if it got that far.
    pub subject_id: Option<String>,
    /// Whether the token carried a session reference.
    pub session_bound: bool,
    /// The bound session was found and its window slid forward, whatever
    /// the directory check decided afterwards.
    pub session_renewed: bool,
    pub result: Result<AuthenticatedPrincipal, AuthError>,
}

impl ValidationReport {
    fn rejected(error: AuthError) -> Self {
        Self {
            subject_id: None,
            session_bound: false,
            session_renewed: false,
            result: Err(error),
        }
    }

    pub fn into_result(self) -> Result<AuthenticatedPrincipal, AuthError> {
        self.result
    }
}

pub struct SessionValidator {
    jwt: Arc<JwtService>,
    sessions: Arc<SessionService>,
    directory: Arc<dyn UserDirectory>,
    allow_unbound_tokens: bool,
}

impl SessionValidator {
    pub fn new(
        jwt: Arc<JwtService>,
        sessions: Arc<SessionService>,
        directory: Arc<dyn UserDirectory>,
        allow_unbound_tokens: bool,
    ) -> Self {
        Self {
            jwt,
            sessions,
            directory,
            allow_unbound_tokens,
        }
    }

    pub async fn authenticate(&self, token: &str) -> Result<AuthenticatedPrincipal, AuthError> {
        self.validate_request(token).await.into_result()
    }

    pub async fn validate_request(&self, token: &str) -> ValidationReport {
        // 1. Signature, structure, hard expiry
        let claims = match self.jwt.validate_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!("Rejecting bearer token: {}", e);
                return ValidationReport::rejected(AuthError::Authentication(e.to_string()));
            }
        };
        if Role::from_str(&claims.role).is_none() {
            return ValidationReport::rejected(AuthError::Authentication(format!(
                "unknown role claim: {}",
                claims.role
            )));
        }

        let session_bound = claims.sid.is_some();
        let session_id = claims.sid.map(SessionId::new);

        let session = match self.bind_session(&claims.sub, session_id.as_ref()).await {
            Ok(session) => session,
            Err(e) => {
                return ValidationReport {
                    subject_id: Some(claims.sub),
                    session_bound,
                    session_renewed: false,
                    result: Err(e),
                };
            }
        };
        let session_renewed = session.is_some();
        let result = self.resolve(&claims.sub, session_id, session).await;

        ValidationReport {
            subject_id: Some(claims.sub),
            session_bound,
            session_renewed,
            result,
        }
    }

    // 2-3. Session binding
    async fn bind_session(
        &self,
        subject_id: &str,
        session_id: Option<&SessionId>,
    ) -> Result<Option<SessionRecord>, AuthError> {
        match session_id {
            Some(session_id) => {
                let record = self.sessions.validate_session(session_id).await?;
                if record.subject_id != subject_id {
                    warn!(
                        "Session {} presented by subject {} belongs to another subject",
                        session_id, subject_id
                    );
                    return Err(AuthError::Authentication(
                        "session does not belong to token subject".to_string(),
                    ));
                }
                Ok(Some(record))
            }
            None if self.allow_unbound_tokens => {
                warn!(
                    "Accepting token without session reference for subject {} (no inactivity timeout applies)",
                    subject_id
                );
                Ok(None)
            }
            None => Err(AuthError::Authentication(
                "token is not bound to a session".to_string(),
            )),
        }
    }

    async fn resolve(
        &self,
        subject_id: &str,
        session_id: Option<SessionId>,
        session: Option<SessionRecord>,
    ) -> Result<AuthenticatedPrincipal, AuthError> {
        // 4. Current entitlements come from the directory, not the token
        let entry = self
            .directory
            .lookup(subject_id)
            .await?
            .ok_or_else(|| AuthError::Authentication("unknown subject".to_string()))?;
        if !entry.is_active {
            warn!("Rejecting request from inactive subject {}", subject_id);
            return Err(AuthError::InactiveUser);
        }

        Ok(AuthenticatedPrincipal {
            subject_id: subject_id.to_string(),
            role: entry.role,
            session_id,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::NoopAuditSink;
    use crate::clock::{Clock, ManualClock};
    use crate::domain::{Attributes, DirectoryEntry};
    use crate::repositories::{InMemoryUserDirectory, MockUserDirectory};
    use crate::store::{SessionStore, StorePolicy};
    use chrono::Utc;

    const SECRET: &str = "validator-test-secret";

    struct Fixture {
        jwt: Arc<JwtService>,
        sessions: Arc<SessionService>,
        directory: Arc<InMemoryUserDirectory>,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        fn new() -> Self {
            let clock = Arc::new(ManualClock::new(Utc::now()));
            let store = SessionStore::in_memory(clock.clone(), StorePolicy::with_timeout_secs(900));
            let directory = Arc::new(InMemoryUserDirectory::new());
            directory.upsert("u1", Role::Doctor, true);
            directory.upsert("u2", Role::Patient, true);
            Self {
                jwt: Arc::new(JwtService::new(SECRET, 3600)),
                sessions: Arc::new(SessionService::new(Arc::new(store), Arc::new(NoopAuditSink))),
                directory,
                clock,
            }
        }

        fn validator(&self, allow_unbound: bool) -> SessionValidator {
            SessionValidator::new(
                self.jwt.clone(),
                self.sessions.clone(),
                self.directory.clone(),
                allow_unbound,
            )
        }

        async fn login(&self, subject: &str, role: Role) -> (SessionId, String) {
            let sid = self.sessions.create_session(subject, role, Attributes::new()).await;
            let token = self
                .jwt
                .generate_access_token(subject, role.as_str(), Some(sid.as_str()))
                .unwrap();
            (sid, token)
        }
    }

    #[tokio::test]
    async fn test_bound_token_is_accepted_and_session_renewed() {
        let fx = Fixture::new();
        let (sid, token) = fx.login("u1", Role::Doctor).await;

        fx.clock.advance_secs(800);
        let principal = fx.validator(true).authenticate(&token).await.unwrap();
        assert_eq!(principal.subject_id, "u1");
        assert_eq!(principal.role, Role::Doctor);
        assert_eq!(principal.session_id, Some(sid));
        let record = principal.session.unwrap();
        assert_eq!(record.last_activity_at, fx.clock.now());
    }

    #[tokio::test]
    async fn test_bad_signature_is_authentication_error() {
        let fx = Fixture::new();
        let forged = JwtService::new("someone-elses-secret", 3600)
            .generate_access_token("u1", "DOCTOR", Some("abc"))
            .unwrap();
        let report = fx.validator(true).validate_request(&forged).await;
        assert!(report.subject_id.is_none());
        assert!(matches!(report.result, Err(AuthError::Authentication(_))));
    }

    #[tokio::test]
    async fn test_gone_session_is_session_expired() {
        let fx = Fixture::new();
        let (_, token) = fx.login("u1", Role::Doctor).await;
        fx.clock.advance_secs(901);

        let report = fx.validator(true).validate_request(&token).await;
        assert_eq!(report.subject_id.as_deref(), Some("u1"));
        assert!(report.session_bound);
        assert!(!report.session_renewed);
        assert!(matches!(report.result, Err(AuthError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_logged_out_session_is_session_expired() {
        let fx = Fixture::new();
        let (sid, token) = fx.login("u1", Role::Doctor).await;
        fx.sessions.logout(&sid).await;
        assert!(matches!(
            fx.validator(true).authenticate(&token).await,
            Err(AuthError::SessionExpired)
        ));
    }

    #[tokio::test]
    async fn test_subject_mismatch_is_authentication_error() {
        let fx = Fixture::new();
        let (victim_sid, _) = fx.login("u2", Role::Patient).await;
        let token = fx
            .jwt
            .generate_access_token("u1", "DOCTOR", Some(victim_sid.as_str()))
            .unwrap();

        assert!(matches!(
            fx.validator(true).authenticate(&token).await,
            Err(AuthError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_unbound_token_follows_configuration() {
        let fx = Fixture::new();
        let token = fx.jwt.generate_access_token("u1", "DOCTOR", None).unwrap();

        let principal = fx.validator(true).authenticate(&token).await.unwrap();
        assert!(!principal.is_session_bound());

        assert!(matches!(
            fx.validator(false).authenticate(&token).await,
            Err(AuthError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_role_overrides_token_role() {
        let fx = Fixture::new();
        let (_, token) = fx.login("u1", Role::Doctor).await;
        fx.directory.upsert("u1", Role::Admin, true);

        let principal = fx.validator(true).authenticate(&token).await.unwrap();
        assert_eq!(principal.role, Role::Admin);
    }

    #[tokio::test]
    async fn test_inactive_and_unknown_subjects_are_rejected() {
        let fx = Fixture::new();
        let (_, token) = fx.login("u1", Role::Doctor).await;

        fx.directory.upsert("u1", Role::Doctor, false);
        let report = fx.validator(true).validate_request(&token).await;
        assert!(report.session_renewed);
        assert!(matches!(report.result, Err(AuthError::InactiveUser)));

        fx.directory.remove("u1");
        assert!(matches!(
            fx.validator(true).authenticate(&token).await,
            Err(AuthError::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_failure_is_not_a_silent_allow() {
        let fx = Fixture::new();
        let (_, token) = fx.login("u1", Role::Doctor).await;
        let mut directory = MockUserDirectory::new();
        directory
            .expect_lookup()
            .returning(|_| Err(AuthError::Directory("connection reset".into())));
        let validator = SessionValidator::new(
            fx.jwt.clone(),
            fx.sessions.clone(),
            Arc::new(directory),
            true,
        );

        assert!(matches!(
            validator.authenticate(&token).await,
            Err(AuthError::Directory(_))
        ));
    }

    #[tokio::test]
    async fn test_directory_is_consulted_with_token_subject() {
        let fx = Fixture::new();
        let (_, token) = fx.login("u2", Role::Patient).await;
        let mut directory = MockUserDirectory::new();
        directory
            .expect_lookup()
            .withf(|subject: &str| subject == "u2")
            .times(1)
            .returning(|_| {
                Ok(Some(DirectoryEntry {
                    role: Role::Patient,
                    is_active: true,
                }))
            });
        let validator = SessionValidator::new(
            fx.jwt.clone(),
            fx.sessions.clone(),
            Arc::new(directory),
            true,
        );
        assert_eq!(validator.authenticate(&token).await.unwrap().subject_id, "u2");
    }
}
