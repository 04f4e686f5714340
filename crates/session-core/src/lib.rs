//! # Session Core
//! 
//! Session records, the failover session store, token binding, and
//! lifecycle services for the trust layer.

pub mod audit;
pub mod clock;
pub mod domain;
pub mod error;
pub mod repositories;
pub mod services;
pub mod store;

// Re-export domain entities
pub use domain::*;
pub use error::{AuthError, StoreError};
pub use store::{SessionStore, StoreMode, StorePolicy};
