//! HTTP mapping of session-layer rejections

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use session_core::error::AuthError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Token is fine but its session is gone; the client must log in again.
    #[error("Session expired")]
    SessionExpired,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Authentication(msg) => ApiError::Unauthorized(msg),
            AuthError::SessionExpired => ApiError::SessionExpired,
            AuthError::InactiveUser => ApiError::Forbidden("user is not active".to_string()),
            AuthError::Directory(msg) => ApiError::InternalError(msg),
            AuthError::TokenIssuance(msg) => ApiError::InternalError(msg),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized: {}", msg);
                // Don't echo token parsing details back to the client.
                (
                    StatusCode::UNAUTHORIZED,
                    "Unauthorized",
                    "invalid or missing bearer token".to_string(),
                )
            }
            ApiError::SessionExpired => {
                tracing::info!("Rejected request with expired session");
                let body = Json(ErrorResponse {
                    error: "SessionExpired".to_string(),
                    message: "session expired, please log in again".to_string(),
                });
                return (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, r#"Bearer error="invalid_token""#)],
                    body,
                )
                    .into_response();
            }
            ApiError::Forbidden(msg) => {
                tracing::warn!("Forbidden: {}", msg);
                (StatusCode::FORBIDDEN, "Forbidden", msg)
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "InternalError",
                    "internal error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_expired_carries_www_authenticate() {
        let response = ApiError::from(AuthError::SessionExpired).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers()[header::WWW_AUTHENTICATE],
            r#"Bearer error="invalid_token""#
        );
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AuthError::Authentication("bad".into()), StatusCode::UNAUTHORIZED),
            (AuthError::InactiveUser, StatusCode::FORBIDDEN),
            (AuthError::Directory("db down".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (error, status) in cases {
            let response = ApiError::from(error).into_response();
            assert_eq!(response.status(), status);
            assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
        }
    }
}
