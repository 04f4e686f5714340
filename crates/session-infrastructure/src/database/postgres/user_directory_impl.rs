// ============================================================================
// Session Infrastructure - PostgreSQL User Directory
// File: crates/session-infrastructure/src/database/postgres/user_directory_impl.rs
// ============================================================================

use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use tracing::{error, warn};

use session_core::domain::{DirectoryEntry, Role};
use session_core::error::AuthError;
use session_core::repositories::UserDirectory;

/// Reads the current role and activation flag of a subject from `users`.
pub struct PgUserDirectory {
    pool: PgPool,
}

impl PgUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Internal row type for SQLx mapping
#[derive(Debug, FromRow)]
struct DirectoryRow {
    pub role: String,
    pub is_active: bool,
}

impl TryFrom<DirectoryRow> for DirectoryEntry {
    type Error = AuthError;

    fn try_from(row: DirectoryRow) -> Result<Self, Self::Error> {
        let role = Role::from_str(&row.role).ok_or_else(|| {
            warn!("User directory returned unknown role {}", row.role);
            AuthError::Directory(format!("unknown role: {}", row.role))
        })?;
        Ok(DirectoryEntry {
            role,
            is_active: row.is_active,
        })
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn lookup(&self, subject_id: &str) -> Result<Option<DirectoryEntry>, AuthError> {
        let row: Option<DirectoryRow> = sqlx::query_as(
            r#"
            SELECT role::text AS role, is_active
            FROM users
            WHERE user_id::text = $1
            "#,
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e: sqlx::Error| {
            error!("Database error looking up subject {}: {}", subject_id, e);
            AuthError::Directory(e.to_string())
        })?;

        row.map(DirectoryEntry::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_maps_role_case_insensitively() {
        let entry = DirectoryEntry::try_from(DirectoryRow {
            role: "pharmacy".to_string(),
            is_active: false,
        })
        .unwrap();
        assert_eq!(entry.role, Role::Pharmacy);
        assert!(!entry.is_active);
    }

    #[test]
    fn test_unknown_role_is_directory_error() {
        let result = DirectoryEntry::try_from(DirectoryRow {
            role: "JANITOR".to_string(),
            is_active: true,
        });
        assert!(matches!(result, Err(AuthError::Directory(_))));
    }
}
