use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{Document, DocumentPermission, PermissionLevel};

#[derive(Debug, Clone, FromRow)]
pub struct DocumentRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            last_modified_at: row.last_modified_at,
        }
    }
}

/// Joined row produced by the documents-by-principal listing queries.
#[derive(Debug, Clone, FromRow)]
pub struct DocumentPermissionRow {
    pub id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
    pub permission_level: PermissionLevel,
}

impl From<DocumentPermissionRow> for DocumentPermission {
    fn from(row: DocumentPermissionRow) -> Self {
        DocumentPermission {
            document: Document {
                id: row.id,
                name: row.name,
                description: row.description,
                created_at: row.created_at,
                last_modified_at: row.last_modified_at,
            },
            permission_level: row.permission_level,
        }
    }
}
