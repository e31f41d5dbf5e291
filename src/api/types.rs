//! Request and reply messages for the unary RPC surfaces.
//!
//! Cursors are structured values at this layer; they only become opaque
//! blobs at the gateway's HTTP boundary. User replies never carry the
//! password hash.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Cursor, Document, DocumentPermission, Permission, PermissionLevel, User};

// ---- document service ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentRequest {
    pub owner_user_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateDocumentReply {
    pub document_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDocumentRequest {
    pub document_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDocumentReply {
    pub document: Document,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateDocumentRequest {
    pub document_id: Uuid,
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDocumentRequest {
    pub document_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteDocumentsRequest {
    pub document_ids: Vec<Uuid>,
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDocumentsByPrincipalRequest {
    pub principal_id: Uuid,
    #[serde(default)]
    pub permission_filter: Vec<PermissionLevel>,
    pub cursor: Option<Cursor>,
    pub page_size: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListDocumentsByPrincipalReply {
    pub document_permissions: Vec<DocumentPermission>,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPermissionOfPrincipalRequest {
    pub document_id: Uuid,
    pub principal_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetPermissionOfPrincipalReply {
    pub permission: Permission,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPermissionsOnDocumentRequest {
    pub document_id: Uuid,
    #[serde(default)]
    pub permission_filter: Vec<PermissionLevel>,
    pub cursor: Option<Cursor>,
    pub page_size: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPermissionsOnDocumentReply {
    pub permissions: Vec<Permission>,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGuestRequest {
    pub creator_user_id: Uuid,
    pub document_id: Uuid,
    pub permission_level: PermissionLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateGuestReply {
    pub guest_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertPermissionUserRequest {
    pub user_id: Uuid,
    pub document_id: Uuid,
    pub permission_level: PermissionLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdatePermissionGuestRequest {
    pub guest_id: Uuid,
    pub permission_level: PermissionLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletePermissionPrincipalRequest {
    pub recipient_id: Uuid,
    pub document_id: Uuid,
}

/// Reply for operations with nothing to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Empty {}

// ---- user service ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub user_name: String,
    pub email: String,
    pub max_documents: Option<i32>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserReply {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserRequest {
    pub user_id: Uuid,
}

/// User as it appears on the wire: everything except the credential hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireUser {
    pub user_id: Uuid,
    pub user_name: String,
    pub email: String,
    pub max_documents: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

impl From<User> for WireUser {
    fn from(user: User) -> Self {
        WireUser {
            user_id: user.user_id,
            user_name: user.user_name,
            email: user.email,
            max_documents: user.max_documents,
            is_active: user.is_active,
            created_at: user.created_at,
            last_modified_at: user.last_modified_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetUserReply {
    pub user: WireUser,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeactivateUserRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeUserPasswordRequest {
    pub user_id: Uuid,
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatePasswordRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatePasswordReply {
    pub user_id: Option<Uuid>,
    pub is_valid: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_user_never_carries_the_hash() {
        let user = User {
            user_id: Uuid::new_v4(),
            user_name: "alice".into(),
            email: "alice@example.com".into(),
            max_documents: 100,
            hashed_password: "$2b$12$secret".into(),
            is_active: true,
            created_at: Utc::now(),
            last_modified_at: Utc::now(),
        };
        let wire = WireUser::from(user);
        let json = serde_json::to_string(&GetUserReply { user: wire }).unwrap();
        assert!(!json.contains("secret"));
        assert!(!json.contains("hashed_password"));
    }

    #[test]
    fn permission_filter_defaults_to_empty() {
        let req: ListDocumentsByPrincipalRequest = serde_json::from_str(
            r#"{"principal_id":"11111111-1111-1111-1111-111111111111","cursor":null,"page_size":null}"#,
        )
        .unwrap();
        assert!(req.permission_filter.is_empty());
    }
}
