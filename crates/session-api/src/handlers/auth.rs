// ============================================================================
// Session API - Auth Handlers
// File: crates/session-api/src/handlers/auth.rs
// ============================================================================
//! Session introspection and logout handlers for the calling subject

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use session_core::domain::{AuthenticatedPrincipal, Role};
use session_core::services::BulkLogoutOutcome;

use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub subject_id: String,
    pub role: Role,
    pub session_bound: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionTimes>,
}

#[derive(Debug, Serialize)]
pub struct SessionTimes {
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionCount {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub logged_out: bool,
}

#[derive(Debug, Serialize)]
pub struct InvalidatedResponse {
    pub invalidated: usize,
    /// Set when the primary store was unreachable and only this instance
    /// dropped the sessions.
    pub degraded: bool,
}

impl From<BulkLogoutOutcome> for InvalidatedResponse {
    fn from(outcome: BulkLogoutOutcome) -> Self {
        Self {
            invalidated: outcome.invalidated,
            degraded: outcome.soft_warning.is_some(),
        }
    }
}

/// Current principal - GET /api/v1/auth/session
pub async fn current_session(
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> Json<ApiResponse<SessionView>> {
    let session = principal.session.as_ref().map(|record| SessionTimes {
        created_at: record.created_at,
        last_activity_at: record.last_activity_at,
        expires_at: record.expires_at,
    });

    Json(ApiResponse::success(SessionView {
        session_bound: principal.is_session_bound(),
        subject_id: principal.subject_id,
        role: principal.role,
        session,
    }))
}

/// Live session count - GET /api/v1/auth/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> Json<ApiResponse<SessionCount>> {
    let sessions = state.sessions.list_user_sessions(&principal.subject_id).await;
    Json(ApiResponse::success(SessionCount {
        count: sessions.len(),
    }))
}

/// Logout handler - POST /api/v1/auth/logout
///
/// Always reports success; backend trouble only shows up in the logs.
pub async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> Json<ApiResponse<LogoutResponse>> {
    match &principal.session_id {
        Some(session_id) => {
            state.sessions.logout(session_id).await;
        }
        None => warn!(
            "Logout from unbound token for subject {}, nothing to invalidate",
            principal.subject_id
        ),
    }

    Json(ApiResponse::success(LogoutResponse { logged_out: true }))
}

/// Log out everywhere - POST /api/v1/auth/logout-all
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
) -> Json<ApiResponse<InvalidatedResponse>> {
    let outcome = state.sessions.logout_all(&principal.subject_id).await;
    Json(ApiResponse::success(outcome.into()))
}
