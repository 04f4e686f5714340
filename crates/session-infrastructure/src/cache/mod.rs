//! Redis-backed session storage

pub mod redis_session_backend;

pub use redis_session_backend::{create_redis_pool, RedisSessionBackend};
