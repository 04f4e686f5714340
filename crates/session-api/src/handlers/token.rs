//! Token issuance for a trusted upstream authenticator
//!
//! Credential checks happen before this service is called. The caller
//! proves it is the trusted upstream with the shared `x-issuer-key` header
//! and names the subject it already verified.

use axum::{extract::State, http::HeaderMap, Json};
use serde::Deserialize;
use tracing::{info, warn};

use session_core::domain::Attributes;
use session_core::services::IssuedToken;
use session_security::secrets_match;

use crate::error::ApiError;
use crate::response::ApiResponse;
use crate::state::AppState;

pub const ISSUER_KEY_HEADER: &str = "x-issuer-key";

#[derive(Debug, Deserialize)]
pub struct IssueTokenRequest {
    pub subject_id: String,
    #[serde(default)]
    pub attributes: Attributes,
}

/// Issue a session-bound token - POST /api/v1/auth/token
pub async fn issue_token(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<IssueTokenRequest>,
) -> Result<Json<ApiResponse<IssuedToken>>, ApiError> {
    let expected = state
        .issuer_key
        .as_deref()
        .ok_or_else(|| ApiError::Forbidden("token issuance is disabled".to_string()))?;

    let provided = headers
        .get(ISSUER_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !secrets_match(provided, expected) {
        warn!("Token request for {} without a valid issuer key", payload.subject_id);
        return Err(ApiError::Unauthorized("invalid issuer key".to_string()));
    }

    let issued = state
        .issuer
        .issue_for(state.directory.as_ref(), &payload.subject_id, payload.attributes)
        .await?;
    info!("Issued token for subject {}", payload.subject_id);

    Ok(Json(ApiResponse::success(issued)))
}
