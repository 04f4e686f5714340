//! Bearer authentication middleware

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error::ApiError;
use crate::state::AppState;

fn bearer_token(request: &Request) -> Option<&str> {
    let value = request.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Validates the bearer token and its session, runs the audit stage, and
/// hands the principal to the handler through request extensions.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(&request)
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".to_string()))?
        .to_string();

    let report = state.validator.validate_request(&token).await;
    state.auditor.observe(&report);
    let principal = report.into_result()?;

    debug!(
        "Authenticated subject {} as {}",
        principal.subject_id, principal.role
    );
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
