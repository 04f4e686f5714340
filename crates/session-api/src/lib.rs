//! # Session API
//!
//! HTTP surface of the trust layer: bearer authentication middleware,
//! token issuance, session and logout handlers, and the health probe.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
