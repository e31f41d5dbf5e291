// Shared vocabulary for the user service, document service, and gateway:
// permission/principal enums, core entities, and the domain error taxonomy.

pub mod cursor;

pub use cursor::{Cursor, SortField};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Access level a principal holds on a document. Owner is a singleton per
/// document and is only granted at document creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "permission_level", rename_all = "lowercase")]
pub enum PermissionLevel {
    Viewer,
    Editor,
    Owner,
}

impl PermissionLevel {
    /// The permissive filter used when a caller supplies no filter at all.
    pub fn all() -> Vec<PermissionLevel> {
        vec![
            PermissionLevel::Viewer,
            PermissionLevel::Editor,
            PermissionLevel::Owner,
        ]
    }
}

/// The two kinds of principal that can hold permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "recipient_type", rename_all = "lowercase")]
pub enum PrincipalKind {
    User,
    Guest,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

/// One row of the permissions relation, keyed by (recipient_id, document_id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    pub recipient_id: Uuid,
    pub recipient_kind: PrincipalKind,
    pub document_id: Uuid,
    pub permission_level: PermissionLevel,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

/// A document together with the level the listing principal holds on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentPermission {
    pub document: Document,
    pub permission_level: PermissionLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub max_documents: i32,
    pub hashed_password: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

/// Domain error taxonomy shared across layers. The repository returns these
/// for expected conditions and `Repo` for anything unexpected; the server
/// layer maps them onto wire statuses. Only the layer that actually queried
/// the store may report `NotFound`.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("unique conflict: {0}")]
    UniqueConflict(String),

    #[error("password mismatch")]
    PasswordMismatch,

    #[error("repository error: {msg}")]
    Repo {
        msg: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl DomainError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        DomainError::NotFound(msg.into())
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        DomainError::InvalidInput(msg.into())
    }

    pub fn unique_conflict(msg: impl Into<String>) -> Self {
        DomainError::UniqueConflict(msg.into())
    }

    /// An unexpected failure inside the repository, wrapping its cause.
    pub fn repo(
        msg: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        DomainError::Repo {
            msg: msg.into(),
            source: Some(source.into()),
        }
    }

    pub fn repo_msg(msg: impl Into<String>) -> Self {
        DomainError::Repo {
            msg: msg.into(),
            source: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_permission_levels_covers_the_enum() {
        let all = PermissionLevel::all();
        assert_eq!(all.len(), 3);
        assert!(all.contains(&PermissionLevel::Viewer));
        assert!(all.contains(&PermissionLevel::Editor));
        assert!(all.contains(&PermissionLevel::Owner));
    }

    #[test]
    fn repo_error_preserves_source() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = DomainError::repo("pool exploded", io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
