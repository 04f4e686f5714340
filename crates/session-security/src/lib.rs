//! # Session Security
//! 
//! Security utilities: JWT access tokens, session identifiers, log fingerprints.

pub mod jwt;
pub mod session_id;

pub use jwt::{AccessClaims, JwtError, JwtService};
pub use session_id::{fingerprint, generate_session_id, secrets_match, SESSION_ID_BYTES};
