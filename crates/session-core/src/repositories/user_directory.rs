//! User directory trait (port)

use async_trait::async_trait;
use dashmap::DashMap;

use crate::domain::{DirectoryEntry, Role};
use crate::error::AuthError;

/// Source of truth for a subject's current role and active status.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn lookup(&self, subject_id: &str) -> Result<Option<DirectoryEntry>, AuthError>;
}

/// Directory held in memory; used by tests and local tooling.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    entries: DashMap<String, DirectoryEntry>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, subject_id: impl Into<String>, role: Role, is_active: bool) {
        self.entries
            .insert(subject_id.into(), DirectoryEntry { role, is_active });
    }

    pub fn remove(&self, subject_id: &str) {
        self.entries.remove(subject_id);
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn lookup(&self, subject_id: &str) -> Result<Option<DirectoryEntry>, AuthError> {
        Ok(self.entries.get(subject_id).map(|e| e.value().clone()))
    }
}
