//! # Session Infrastructure
//!
//! Redis, PostgreSQL and audit-queue implementations of the session-core ports.

pub mod audit;
pub mod cache;
pub mod database;

pub use audit::{AuditWriter, QueuedAuditSink, TracingAuditWriter};
pub use cache::{create_redis_pool, RedisSessionBackend};
pub use database::{create_pool, PgUserDirectory};
