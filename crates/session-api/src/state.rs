use std::sync::Arc;

use session_core::audit::AuditInterceptor;
use session_core::repositories::UserDirectory;
use session_core::services::{SessionService, SessionValidator, TokenIssuer};

#[derive(Clone)]
pub struct AppState {
    pub validator: Arc<SessionValidator>,
    pub sessions: Arc<SessionService>,
    pub issuer: Arc<TokenIssuer>,
    pub directory: Arc<dyn UserDirectory>,
    pub auditor: AuditInterceptor,
    /// Shared secret of the upstream authenticator; `None` disables issuance.
    pub issuer_key: Option<Arc<str>>,
}
