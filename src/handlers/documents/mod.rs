//! RPC surface of the document service: one unary POST route per operation,
//! plus the health probe. Handlers translate wire messages into domain
//! values, call the service, and let `RpcFailure` map domain errors onto the
//! wire status table.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::api::types::{
    CreateDocumentReply, CreateDocumentRequest, CreateGuestReply, CreateGuestRequest,
    DeleteDocumentRequest, DeleteDocumentsRequest, DeletePermissionPrincipalRequest, Empty,
    GetDocumentReply, GetDocumentRequest, GetPermissionOfPrincipalReply,
    GetPermissionOfPrincipalRequest, ListDocumentsByPrincipalReply,
    ListDocumentsByPrincipalRequest, ListPermissionsOnDocumentReply,
    ListPermissionsOnDocumentRequest, UpdateDocumentRequest, UpdatePermissionGuestRequest,
    UpsertPermissionUserRequest,
};
use crate::handlers::RpcFailure;
use crate::services::document_service::DocumentService;

#[derive(Clone)]
pub struct DocumentServiceState {
    pub service: Arc<DocumentService>,
    pub pool: PgPool,
}

pub fn router(state: DocumentServiceState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc/create_document", post(create_document))
        .route("/rpc/get_document", post(get_document))
        .route("/rpc/update_document", post(update_document))
        .route("/rpc/delete_document", post(delete_document))
        .route("/rpc/delete_documents", post(delete_documents))
        .route(
            "/rpc/list_documents_by_principal",
            post(list_documents_by_principal),
        )
        .route(
            "/rpc/get_permission_of_principal_on_document",
            post(get_permission_of_principal_on_document),
        )
        .route(
            "/rpc/list_permissions_on_document",
            post(list_permissions_on_document),
        )
        .route("/rpc/create_guest", post(create_guest))
        .route("/rpc/upsert_permission_user", post(upsert_permission_user))
        .route("/rpc/update_permission_guest", post(update_permission_guest))
        .route(
            "/rpc/delete_permission_principal",
            post(delete_permission_principal),
        )
        .with_state(state)
}

async fn health(State(state): State<DocumentServiceState>) -> (axum::http::StatusCode, Json<Value>) {
    match crate::database::health_check(&state.pool).await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            Json(json!({ "status": "ok", "database": "ok" })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "status": "degraded", "database_error": e.to_string() })),
        ),
    }
}

async fn create_document(
    State(state): State<DocumentServiceState>,
    Json(req): Json<CreateDocumentRequest>,
) -> Result<Json<CreateDocumentReply>, RpcFailure> {
    let document_id = state
        .service
        .create_document(req.owner_user_id, req.name, req.description)
        .await?;
    Ok(Json(CreateDocumentReply { document_id }))
}

async fn get_document(
    State(state): State<DocumentServiceState>,
    Json(req): Json<GetDocumentRequest>,
) -> Result<Json<GetDocumentReply>, RpcFailure> {
    let document = state.service.get_document(req.document_id).await?;
    Ok(Json(GetDocumentReply { document }))
}

async fn update_document(
    State(state): State<DocumentServiceState>,
    Json(req): Json<UpdateDocumentRequest>,
) -> Result<Json<Empty>, RpcFailure> {
    state
        .service
        .update_document(req.document_id, req.name, req.description)
        .await?;
    Ok(Json(Empty {}))
}

async fn delete_document(
    State(state): State<DocumentServiceState>,
    Json(req): Json<DeleteDocumentRequest>,
) -> Result<Json<Empty>, RpcFailure> {
    state.service.delete_document(req.document_id).await?;
    Ok(Json(Empty {}))
}

async fn delete_documents(
    State(state): State<DocumentServiceState>,
    Json(req): Json<DeleteDocumentsRequest>,
) -> Result<Json<Empty>, RpcFailure> {
    state
        .service
        .delete_documents(&req.document_ids, req.user_id)
        .await?;
    Ok(Json(Empty {}))
}

async fn list_documents_by_principal(
    State(state): State<DocumentServiceState>,
    Json(req): Json<ListDocumentsByPrincipalRequest>,
) -> Result<Json<ListDocumentsByPrincipalReply>, RpcFailure> {
    let (document_permissions, cursor) = state
        .service
        .list_documents_by_principal(
            req.principal_id,
            req.permission_filter,
            req.cursor,
            req.page_size.unwrap_or(0),
        )
        .await?;
    Ok(Json(ListDocumentsByPrincipalReply {
        document_permissions,
        cursor,
    }))
}

async fn get_permission_of_principal_on_document(
    State(state): State<DocumentServiceState>,
    Json(req): Json<GetPermissionOfPrincipalRequest>,
) -> Result<Json<GetPermissionOfPrincipalReply>, RpcFailure> {
    let permission = state
        .service
        .get_permission_of_principal_on_document(req.document_id, req.principal_id)
        .await?;
    Ok(Json(GetPermissionOfPrincipalReply { permission }))
}

async fn list_permissions_on_document(
    State(state): State<DocumentServiceState>,
    Json(req): Json<ListPermissionsOnDocumentRequest>,
) -> Result<Json<ListPermissionsOnDocumentReply>, RpcFailure> {
    let (permissions, cursor) = state
        .service
        .list_permissions_on_document(
            req.document_id,
            req.permission_filter,
            req.cursor,
            req.page_size.unwrap_or(0),
        )
        .await?;
    Ok(Json(ListPermissionsOnDocumentReply { permissions, cursor }))
}

async fn create_guest(
    State(state): State<DocumentServiceState>,
    Json(req): Json<CreateGuestRequest>,
) -> Result<Json<CreateGuestReply>, RpcFailure> {
    let guest_id = state
        .service
        .create_guest(req.creator_user_id, req.document_id, req.permission_level)
        .await?;
    Ok(Json(CreateGuestReply { guest_id }))
}

async fn upsert_permission_user(
    State(state): State<DocumentServiceState>,
    Json(req): Json<UpsertPermissionUserRequest>,
) -> Result<Json<Empty>, RpcFailure> {
    state
        .service
        .upsert_permission_user(req.user_id, req.document_id, req.permission_level)
        .await?;
    Ok(Json(Empty {}))
}

async fn update_permission_guest(
    State(state): State<DocumentServiceState>,
    Json(req): Json<UpdatePermissionGuestRequest>,
) -> Result<Json<Empty>, RpcFailure> {
    state
        .service
        .update_permission_guest(req.guest_id, req.permission_level)
        .await?;
    Ok(Json(Empty {}))
}

async fn delete_permission_principal(
    State(state): State<DocumentServiceState>,
    Json(req): Json<DeletePermissionPrincipalRequest>,
) -> Result<Json<Empty>, RpcFailure> {
    state
        .service
        .delete_permission_principal(req.recipient_id, req.document_id)
        .await?;
    Ok(Json(Empty {}))
}
