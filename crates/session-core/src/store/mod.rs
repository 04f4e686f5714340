//! Session storage: the failover store and its process-local backend

pub mod memory;
pub mod session_store;

pub use memory::MemorySessionBackend;
pub use session_store::{BackendKind, Served, SessionStore, StoreMode, StorePolicy};
