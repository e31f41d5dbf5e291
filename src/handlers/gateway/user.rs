use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::types::WireUser;
use crate::auth::Claims;
use crate::error::ApiError;
use crate::handlers::gateway::{claims, require_user_token, GatewayState};

#[derive(Debug, Deserialize)]
pub struct CreateUserBody {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub max_documents: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub user_id: Uuid,
}

/// POST /user - register a new user. Public: registration needs no token.
pub async fn create_user(
    State(state): State<GatewayState>,
    Json(body): Json<CreateUserBody>,
) -> Result<Json<CreateUserResponse>, ApiError> {
    let user_id = state
        .user_client
        .create_user(body.user_name, body.email, body.max_documents, body.password)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(CreateUserResponse { user_id }))
}

/// GET /user/{user_id}
pub async fn get_user(
    State(state): State<GatewayState>,
    Path(user_id): Path<Uuid>,
    request_claims: Option<Extension<Claims>>,
) -> Result<Json<WireUser>, ApiError> {
    let _ = claims(request_claims)?;
    let user = state
        .user_client
        .get_user(user_id)
        .await
        .map_err(ApiError::from)?;
    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordBody {
    pub old_password: String,
    pub new_password: String,
}

/// PUT /user/{user_id} - change password. A user may only change their own.
pub async fn change_password(
    State(state): State<GatewayState>,
    Path(user_id): Path<Uuid>,
    request_claims: Option<Extension<Claims>>,
    Json(body): Json<ChangePasswordBody>,
) -> Result<StatusCode, ApiError> {
    let token_claims = claims(request_claims)?;
    let calling_user_id = require_user_token(&token_claims)?;
    if calling_user_id != user_id {
        return Err(ApiError::forbidden("cannot change another user's password"));
    }
    state
        .user_client
        .change_user_password(user_id, body.old_password, body.new_password)
        .await
        .map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /user/{user_id} - deactivate. A user may only deactivate
/// themselves.
pub async fn deactivate_user(
    State(state): State<GatewayState>,
    Path(user_id): Path<Uuid>,
    request_claims: Option<Extension<Claims>>,
) -> Result<StatusCode, ApiError> {
    let token_claims = claims(request_claims)?;
    let calling_user_id = require_user_token(&token_claims)?;
    if calling_user_id != user_id {
        return Err(ApiError::forbidden("cannot deactivate another user"));
    }
    state
        .user_client
        .deactivate_user(user_id)
        .await
        .map_err(ApiError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
