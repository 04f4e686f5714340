//! Router assembly

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers::{admin, auth, health, token};
use crate::middleware::require_session;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/v1/auth/session", get(auth::current_session))
        .route("/api/v1/auth/sessions", get(auth::list_sessions))
        .route("/api/v1/auth/logout", post(auth::logout))
        .route("/api/v1/auth/logout-all", post(auth::logout_all))
        .route(
            "/api/v1/admin/users/{subject_id}/sessions/revoke",
            post(admin::revoke_user_sessions),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/api/v1/auth/token", post(token::issue_token))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
