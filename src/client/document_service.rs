use uuid::Uuid;

use crate::api::types::{
    CreateDocumentReply, CreateDocumentRequest, CreateGuestReply, CreateGuestRequest,
    DeleteDocumentRequest, DeleteDocumentsRequest, DeletePermissionPrincipalRequest, Empty,
    GetDocumentReply, GetDocumentRequest, GetPermissionOfPrincipalReply,
    GetPermissionOfPrincipalRequest, ListDocumentsByPrincipalReply,
    ListDocumentsByPrincipalRequest, ListPermissionsOnDocumentReply,
    ListPermissionsOnDocumentRequest, UpdateDocumentRequest, UpdatePermissionGuestRequest,
    UpsertPermissionUserRequest,
};
use crate::client::{call_unary, ClientError};
use crate::domain::{Cursor, Document, Permission, PermissionLevel};

#[derive(Clone)]
pub struct DocumentServiceClient {
    http: reqwest::Client,
    base_url: String,
}

impl DocumentServiceClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub async fn create_document(
        &self,
        owner_user_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<Uuid, ClientError> {
        let reply: CreateDocumentReply = call_unary(
            &self.http,
            &self.base_url,
            "create_document",
            &CreateDocumentRequest {
                owner_user_id,
                name,
                description,
            },
        )
        .await?;
        Ok(reply.document_id)
    }

    pub async fn get_document(&self, document_id: Uuid) -> Result<Document, ClientError> {
        let reply: GetDocumentReply = call_unary(
            &self.http,
            &self.base_url,
            "get_document",
            &GetDocumentRequest { document_id },
        )
        .await?;
        Ok(reply.document)
    }

    pub async fn update_document(
        &self,
        document_id: Uuid,
        name: Option<String>,
        description: Option<String>,
    ) -> Result<(), ClientError> {
        let _: Empty = call_unary(
            &self.http,
            &self.base_url,
            "update_document",
            &UpdateDocumentRequest {
                document_id,
                name,
                description,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn delete_document(&self, document_id: Uuid) -> Result<(), ClientError> {
        let _: Empty = call_unary(
            &self.http,
            &self.base_url,
            "delete_document",
            &DeleteDocumentRequest { document_id },
        )
        .await?;
        Ok(())
    }

    pub async fn delete_documents(
        &self,
        document_ids: Vec<Uuid>,
        user_id: Uuid,
    ) -> Result<(), ClientError> {
        let _: Empty = call_unary(
            &self.http,
            &self.base_url,
            "delete_documents",
            &DeleteDocumentsRequest {
                document_ids,
                user_id,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn list_documents_by_principal(
        &self,
        principal_id: Uuid,
        permission_filter: Vec<PermissionLevel>,
        cursor: Option<Cursor>,
        page_size: Option<i32>,
    ) -> Result<ListDocumentsByPrincipalReply, ClientError> {
        call_unary(
            &self.http,
            &self.base_url,
            "list_documents_by_principal",
            &ListDocumentsByPrincipalRequest {
                principal_id,
                permission_filter,
                cursor,
                page_size,
            },
        )
        .await
    }

    pub async fn get_permission_of_principal_on_document(
        &self,
        document_id: Uuid,
        principal_id: Uuid,
    ) -> Result<Permission, ClientError> {
        let reply: GetPermissionOfPrincipalReply = call_unary(
            &self.http,
            &self.base_url,
            "get_permission_of_principal_on_document",
            &GetPermissionOfPrincipalRequest {
                document_id,
                principal_id,
            },
        )
        .await?;
        Ok(reply.permission)
    }

    pub async fn list_permissions_on_document(
        &self,
        document_id: Uuid,
        permission_filter: Vec<PermissionLevel>,
        cursor: Option<Cursor>,
        page_size: Option<i32>,
    ) -> Result<ListPermissionsOnDocumentReply, ClientError> {
        call_unary(
            &self.http,
            &self.base_url,
            "list_permissions_on_document",
            &ListPermissionsOnDocumentRequest {
                document_id,
                permission_filter,
                cursor,
                page_size,
            },
        )
        .await
    }

    pub async fn create_guest(
        &self,
        creator_user_id: Uuid,
        document_id: Uuid,
        permission_level: PermissionLevel,
    ) -> Result<Uuid, ClientError> {
        let reply: CreateGuestReply = call_unary(
            &self.http,
            &self.base_url,
            "create_guest",
            &CreateGuestRequest {
                creator_user_id,
                document_id,
                permission_level,
            },
        )
        .await?;
        Ok(reply.guest_id)
    }

    pub async fn upsert_permission_user(
        &self,
        user_id: Uuid,
        document_id: Uuid,
        permission_level: PermissionLevel,
    ) -> Result<(), ClientError> {
        let _: Empty = call_unary(
            &self.http,
            &self.base_url,
            "upsert_permission_user",
            &UpsertPermissionUserRequest {
                user_id,
                document_id,
                permission_level,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn update_permission_guest(
        &self,
        guest_id: Uuid,
        permission_level: PermissionLevel,
    ) -> Result<(), ClientError> {
        let _: Empty = call_unary(
            &self.http,
            &self.base_url,
            "update_permission_guest",
            &UpdatePermissionGuestRequest {
                guest_id,
                permission_level,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn delete_permission_principal(
        &self,
        recipient_id: Uuid,
        document_id: Uuid,
    ) -> Result<(), ClientError> {
        let _: Empty = call_unary(
            &self.http,
            &self.base_url,
            "delete_permission_principal",
            &DeletePermissionPrincipalRequest {
                recipient_id,
                document_id,
            },
        )
        .await?;
        Ok(())
    }
}
