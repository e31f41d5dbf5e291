use axum::extract::{Extension, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::Claims;
use crate::domain::{Permission, PermissionLevel, PrincipalKind};
use crate::error::ApiError;
use crate::handlers::gateway::{
    claims, decode_cursor, principal_id, require_user_token, GatewayState,
};

/// Parse a comma-separated permission filter query value, e.g.
/// `viewer,editor`.
fn parse_permission_filter(raw: Option<&str>) -> Result<Vec<PermissionLevel>, ApiError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.split(',')
        .filter(|part| !part.is_empty())
        .map(|part| match part.trim() {
            "viewer" => Ok(PermissionLevel::Viewer),
            "editor" => Ok(PermissionLevel::Editor),
            "owner" => Ok(PermissionLevel::Owner),
            other => Err(ApiError::bad_request(format!(
                "unknown permission level in filter: {other}"
            ))),
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct ListPermissionsQuery {
    pub cursor: Option<String>,
    pub limit: Option<i32>,
    pub permission_filter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListPermissionsResponse {
    pub permissions: Vec<Permission>,
    pub cursor: String,
}

/// GET /document/{document_id}/permission - user tokens only: listing who a
/// document is shared with is an owner-side view.
pub async fn list_permissions(
    State(state): State<GatewayState>,
    Path(document_id): Path<Uuid>,
    Query(query): Query<ListPermissionsQuery>,
    request_claims: Option<Extension<Claims>>,
) -> Result<Json<ListPermissionsResponse>, ApiError> {
    let token_claims = claims(request_claims)?;
    require_user_token(&token_claims)?;
    let cursor = decode_cursor(query.cursor.as_deref())?;
    let permission_filter = parse_permission_filter(query.permission_filter.as_deref())?;

    let reply = state
        .document_client
        .list_permissions_on_document(document_id, permission_filter, cursor, query.limit)
        .await
        .map_err(ApiError::from)?;

    Ok(Json(ListPermissionsResponse {
        permissions: reply.permissions,
        cursor: reply.cursor.encode(),
    }))
}

/// Union body: `user_id_to_share` present means "share with that user",
/// absent means "mint a guest for this document".
#[derive(Debug, Deserialize)]
pub struct CreatePermissionBody {
    pub user_id_to_share: Option<Uuid>,
    pub permission_level: PermissionLevel,
}

#[derive(Debug, Serialize)]
pub struct CreatePermissionResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id_shared_with: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guest_id: Option<Uuid>,
}

/// POST /document/{document_id}/permission - user tokens only.
pub async fn create_permission(
    State(state): State<GatewayState>,
    Path(document_id): Path<Uuid>,
    request_claims: Option<Extension<Claims>>,
    Json(body): Json<CreatePermissionBody>,
) -> Result<Json<CreatePermissionResponse>, ApiError> {
    let token_claims = claims(request_claims)?;
    let calling_user_id = require_user_token(&token_claims)?;
    // Owner is only minted by document creation; refuse before the backend
    // call.
    if body.permission_level == PermissionLevel::Owner {
        return Err(ApiError::bad_request(
            "cannot create permissions at owner level",
        ));
    }

    match body.user_id_to_share {
        Some(user_id) => {
            state
                .document_client
                .upsert_permission_user(user_id, document_id, body.permission_level)
                .await
                .map_err(ApiError::from)?;
            Ok(Json(CreatePermissionResponse {
                user_id_shared_with: Some(user_id),
                guest_id: None,
            }))
        }
        None => {
            let guest_id = state
                .document_client
                .create_guest(calling_user_id, document_id, body.permission_level)
                .await
                .map_err(ApiError::from)?;
            Ok(Json(CreatePermissionResponse {
                user_id_shared_with: None,
                guest_id: Some(guest_id),
            }))
        }
    }
}

/// GET /document/{document_id}/permission/principal/{principal_id} - guests
/// may only look up their own permission.
pub async fn get_principal_permission(
    State(state): State<GatewayState>,
    Path((document_id, target_principal_id)): Path<(Uuid, Uuid)>,
    request_claims: Option<Extension<Claims>>,
) -> Result<Json<Permission>, ApiError> {
    let token_claims = claims(request_claims)?;
    let calling_principal_id = principal_id(&token_claims)?;
    if token_claims.kind() == PrincipalKind::Guest && target_principal_id != calling_principal_id {
        return Err(ApiError::forbidden(
            "guests cannot get the permissions of other principals",
        ));
    }
    let permission = state
        .document_client
        .get_permission_of_principal_on_document(document_id, target_principal_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(permission))
}

/// The PUT body names the principal kind so the gateway can pick the
/// user-upsert or guest-update RPC without guessing.
#[derive(Debug, Deserialize)]
pub struct UpdatePrincipalPermissionBody {
    pub principal_type: PrincipalKind,
    pub permission_level: PermissionLevel,
}

/// PUT /document/{document_id}/permission/principal/{principal_id} - user
/// tokens only.
pub async fn update_principal_permission(
    State(state): State<GatewayState>,
    Path((document_id, target_principal_id)): Path<(Uuid, Uuid)>,
    request_claims: Option<Extension<Claims>>,
    Json(body): Json<UpdatePrincipalPermissionBody>,
) -> Result<StatusCode, ApiError> {
    let token_claims = claims(request_claims)?;
    require_user_token(&token_claims)?;

    match body.principal_type {
        PrincipalKind::User => {
            state
                .document_client
                .upsert_permission_user(target_principal_id, document_id, body.permission_level)
                .await
                .map_err(ApiError::from)?;
        }
        PrincipalKind::Guest => {
            state
                .document_client
                .update_permission_guest(target_principal_id, body.permission_level)
                .await
                .map_err(ApiError::from)?;
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /document/{document_id}/permission/principal/{principal_id} - user
/// tokens only.
pub async fn delete_principal_permission(
    State(state): State<GatewayState>,
    Path((document_id, target_principal_id)): Path<(Uuid, Uuid)>,
    request_claims: Option<Extension<Claims>>,
) -> Result<StatusCode, ApiError> {
    let token_claims = claims(request_claims)?;
    require_user_token(&token_claims)?;
    state
        .document_client
        .delete_permission_principal(target_principal_id, document_id)
        .await
        .map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_filter_parsing() {
        assert!(parse_permission_filter(None).unwrap().is_empty());
        assert_eq!(
            parse_permission_filter(Some("viewer,editor")).unwrap(),
            vec![PermissionLevel::Viewer, PermissionLevel::Editor]
        );
        assert_eq!(
            parse_permission_filter(Some("owner")).unwrap(),
            vec![PermissionLevel::Owner]
        );
        assert!(parse_permission_filter(Some("admin")).is_err());
    }
}
