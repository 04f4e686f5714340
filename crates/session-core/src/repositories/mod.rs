//! Repository traits (ports)

pub mod session_backend;
pub mod user_directory;

pub use session_backend::SessionBackend;
pub use user_directory::{InMemoryUserDirectory, UserDirectory};

#[cfg(test)]
pub use session_backend::MockSessionBackend;
#[cfg(test)]
pub use user_directory::MockUserDirectory;
