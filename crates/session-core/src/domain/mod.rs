//! # Session Core - Domain Module
//! 
//! Domain entities for the session layer.

pub mod role;
pub mod session;
pub mod principal;

pub use role::Role;
pub use session::{Attributes, SessionId, SessionRecord};
pub use principal::{AuthenticatedPrincipal, DirectoryEntry};
