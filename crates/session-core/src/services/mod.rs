//! Session services (business logic)

pub mod session_service;
pub mod session_validator;
pub mod token_issuer;

pub use session_service::{BulkLogoutOutcome, LogoutOutcome, SessionService};
pub use session_validator::{SessionValidator, ValidationReport};
pub use token_issuer::{IssuedToken, TokenIssuer};
