//! Application-wide constants

/// Inactivity timeout mandated for PHI access (15 minutes).
pub const DEFAULT_SESSION_TIMEOUT_SECONDS: u64 = 900;
pub const MAX_SESSION_TIMEOUT_SECONDS: u64 = 86_400;
pub const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_AUDIT_QUEUE_CAPACITY: usize = 10_000;
pub const DEFAULT_ACCESS_TOKEN_EXPIRY: i64 = 1800;
pub const MAX_ACCESS_TOKEN_EXPIRY: i64 = 86_400;
pub const DEFAULT_DB_ACQUIRE_TIMEOUT_SECS: u64 = 3;
pub const SESSION_KEY_NAMESPACE: &str = "session:";
pub const USER_SESSIONS_KEY_NAMESPACE: &str = "user_sessions:";
pub const MIN_JWT_SECRET_LENGTH: u64 = 16;
