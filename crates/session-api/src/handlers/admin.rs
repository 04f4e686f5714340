//! Administrator session controls

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use tracing::warn;

use session_core::domain::{AuthenticatedPrincipal, Role};

use crate::error::ApiError;
use crate::handlers::auth::InvalidatedResponse;
use crate::response::ApiResponse;
use crate::state::AppState;

/// Forced logout - POST /api/v1/admin/users/{subject_id}/sessions/revoke
pub async fn revoke_user_sessions(
    State(state): State<AppState>,
    Extension(principal): Extension<AuthenticatedPrincipal>,
    Path(subject_id): Path<String>,
) -> Result<Json<ApiResponse<InvalidatedResponse>>, ApiError> {
    if !principal.has_role(Role::Admin) {
        return Err(ApiError::Forbidden(format!(
            "role {} may not revoke sessions",
            principal.role
        )));
    }

    let outcome = state.sessions.logout_all(&subject_id).await;
    warn!(
        "Admin {} revoked {} sessions of subject {}",
        principal.subject_id, outcome.invalidated, subject_id
    );

    Ok(Json(ApiResponse::success(InvalidatedResponse::from(outcome))))
}
