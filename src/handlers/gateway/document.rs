use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Claims;
use crate::domain::{Document, PermissionLevel};
use crate::error::ApiError;
use crate::handlers::gateway::{
    claims, decode_cursor, principal_id, require_user_token, GatewayState,
};

#[derive(Debug, Deserialize)]
pub struct CreateDocumentBody {
    pub document_name: Option<String>,
    pub document_description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateDocumentResponse {
    pub document_id: Uuid,
}

/// POST /document - user tokens only: guests cannot create documents.
pub async fn create_document(
    State(state): State<GatewayState>,
    request_claims: Option<Extension<Claims>>,
    Json(body): Json<CreateDocumentBody>,
) -> Result<Json<CreateDocumentResponse>, ApiError> {
    let token_claims = claims(request_claims)?;
    let user_id = require_user_token(&token_claims)?;
    let document_id = state
        .document_client
        .create_document(user_id, body.document_name, body.document_description)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(CreateDocumentResponse { document_id }))
}

#[derive(Debug, Deserialize)]
pub struct ListDocumentsQuery {
    pub cursor: Option<String>,
    pub limit: Option<i32>,
    pub permission_level: Option<PermissionLevel>,
}

#[derive(Debug, Serialize)]
pub struct ListDocumentsResponse {
    pub documents: Vec<Document>,
    pub cursor: String,
}

/// GET /document - list the calling principal's documents. Defaults to the
/// owner level when no filter is given.
pub async fn list_documents(
    State(state): State<GatewayState>,
    Query(query): Query<ListDocumentsQuery>,
    request_claims: Option<Extension<Claims>>,
) -> Result<Json<ListDocumentsResponse>, ApiError> {
    let token_claims = claims(request_claims)?;
    let caller = principal_id(&token_claims)?;
    let cursor = decode_cursor(query.cursor.as_deref())?;
    let permission_level = query.permission_level.unwrap_or(PermissionLevel::Owner);

    let reply = state
        .document_client
        .list_documents_by_principal(caller, vec![permission_level], cursor, query.limit)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ListDocumentsResponse {
        documents: reply
            .document_permissions
            .into_iter()
            .map(|dp| dp.document)
            .collect(),
        cursor: reply.cursor.encode(),
    }))
}

/// GET /document/{document_id} - readable with either token kind.
pub async fn get_document(
    State(state): State<GatewayState>,
    Path(document_id): Path<Uuid>,
    request_claims: Option<Extension<Claims>>,
) -> Result<Json<Document>, ApiError> {
    let _ = claims(request_claims)?;
    let document = state
        .document_client
        .get_document(document_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(document))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDocumentBody {
    pub document_name: Option<String>,
    pub document_description: Option<String>,
}

/// PUT /document/{document_id}
pub async fn update_document(
    State(state): State<GatewayState>,
    Path(document_id): Path<Uuid>,
    request_claims: Option<Extension<Claims>>,
    Json(body): Json<UpdateDocumentBody>,
) -> Result<StatusCode, ApiError> {
    let _ = claims(request_claims)?;
    state
        .document_client
        .update_document(document_id, body.document_name, body.document_description)
        .await
        .map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /document/{document_id} - user tokens only.
pub async fn delete_document(
    State(state): State<GatewayState>,
    Path(document_id): Path<Uuid>,
    request_claims: Option<Extension<Claims>>,
) -> Result<StatusCode, ApiError> {
    let token_claims = claims(request_claims)?;
    require_user_token(&token_claims)?;
    state
        .document_client
        .delete_document(document_id)
        .await
        .map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct BulkDeleteBody {
    pub document_ids: Vec<Uuid>,
}

/// DELETE /document - all-or-nothing batch delete, user tokens only.
pub async fn bulk_delete(
    State(state): State<GatewayState>,
    request_claims: Option<Extension<Claims>>,
    Json(body): Json<BulkDeleteBody>,
) -> Result<StatusCode, ApiError> {
    let token_claims = claims(request_claims)?;
    let user_id = require_user_token(&token_claims)?;
    state
        .document_client
        .delete_documents(body.document_ids, user_id)
        .await
        .map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
