//! Bounded, non-blocking audit queue
//!
//! The request path only ever calls `try_send`. When the queue is full the
//! event is dropped with a warning; the request is never delayed.

use anyhow::Result;
use async_trait::async_trait;
use flume::{bounded, Receiver, Sender, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use session_core::audit::{AuditSink, SessionEvent};

/// Destination for audit events, drained by the queue worker.
#[async_trait]
pub trait AuditWriter: Send + Sync {
    async fn write(&self, event: &SessionEvent) -> Result<()>;
}

/// Writes each event as a JSON line on the `audit` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditWriter;

#[async_trait]
impl AuditWriter for TracingAuditWriter {
    async fn write(&self, event: &SessionEvent) -> Result<()> {
        let line = serde_json::to_string(event)?;
        info!(target: "audit", "{}", line);
        Ok(())
    }
}

pub struct QueuedAuditSink {
    sender: Sender<SessionEvent>,
    dropped: AtomicU64,
}

impl QueuedAuditSink {
    /// Creates the queue and spawns its worker on the current runtime.
    pub fn spawn(capacity: usize, writer: Arc<dyn AuditWriter>) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = bounded(capacity);
        info!("Initializing audit queue: capacity={}", capacity);

        let worker = tokio::spawn(async move {
            Self::worker_loop(receiver, writer).await;
        });

        (
            Self {
                sender,
                dropped: AtomicU64::new(0),
            },
            worker,
        )
    }

    /// Events discarded because the queue was full or closed.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    async fn worker_loop(receiver: Receiver<SessionEvent>, writer: Arc<dyn AuditWriter>) {
        info!("Audit worker started");
        while let Ok(event) = receiver.recv_async().await {
            if let Err(e) = writer.write(&event).await {
                error!("Failed to write {} audit event: {}", event.kind.as_str(), e);
            }
        }
        info!("Audit worker shutting down (channel closed)");
    }
}

impl AuditSink for QueuedAuditSink {
    fn record(&self, event: SessionEvent) {
        match self.sender.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Audit queue full, dropping {} event for subject {}",
                    event.kind.as_str(),
                    event.subject_id
                );
            }
            Err(TrySendError::Disconnected(event)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Audit worker gone, dropping {} event", event.kind.as_str());
            }
        }
    }
}
