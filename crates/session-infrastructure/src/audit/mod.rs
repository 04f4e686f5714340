//! Audit event delivery

pub mod queued_sink;

pub use queued_sink::{AuditWriter, QueuedAuditSink, TracingAuditWriter};
