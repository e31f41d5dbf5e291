use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::{Permission, PermissionLevel, PrincipalKind};

// The array forms of the two postgres enums (`_permission_level`,
// `_recipient_type`) are registered automatically by the `sqlx::Type`
// derive on PermissionLevel/PrincipalKind in domain::mod, so permission
// filters can bind as `= ANY($n)` parameters without a manual impl here.

#[derive(Debug, Clone, FromRow)]
pub struct PermissionRow {
    pub recipient_id: Uuid,
    pub recipient_type: PrincipalKind,
    pub document_id: Uuid,
    pub permission_level: PermissionLevel,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Permission {
            recipient_id: row.recipient_id,
            recipient_kind: row.recipient_type,
            document_id: row.document_id,
            permission_level: row.permission_level,
            created_by: row.created_by,
            created_at: row.created_at,
            last_modified_at: row.last_modified_at,
        }
    }
}
