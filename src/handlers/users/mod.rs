//! RPC surface of the user service.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use sqlx::PgPool;

use crate::api::types::{
    ChangeUserPasswordRequest, CreateUserReply, CreateUserRequest, DeactivateUserRequest, Empty,
    GetUserReply, GetUserRequest, ValidatePasswordReply, ValidatePasswordRequest, WireUser,
};
use crate::handlers::RpcFailure;
use crate::services::user_service::UserService;

#[derive(Clone)]
pub struct UserServiceState {
    pub service: Arc<UserService>,
    pub pool: PgPool,
}

pub fn router(state: UserServiceState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/rpc/create_user", post(create_user))
        .route("/rpc/get_user", post(get_user))
        .route("/rpc/deactivate_user", post(deactivate_user))
        .route("/rpc/change_user_password", post(change_user_password))
        .route("/rpc/validate_password", post(validate_password))
        .with_state(state)
}

async fn health(State(state): State<UserServiceState>) -> (axum::http::StatusCode, Json<Value>) {
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

async fn create_user(
    State(state): State<UserServiceState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<CreateUserReply>, RpcFailure> {
    let user_id = state
        .service
        .create_user(&req.user_name, &req.email, req.max_documents, &req.password)
        .await?;
    Ok(Json(CreateUserReply { user_id }))
}

async fn get_user(
    State(state): State<UserServiceState>,
    Json(req): Json<GetUserRequest>,
) -> Result<Json<GetUserReply>, RpcFailure> {
    let user = state.service.get_user(req.user_id).await?;
    Ok(Json(GetUserReply {
        user: WireUser::from(user),
    }))
}

async fn deactivate_user(
    State(state): State<UserServiceState>,
    Json(req): Json<DeactivateUserRequest>,
) -> Result<Json<Empty>, RpcFailure> {
    state.service.deactivate_user(req.user_id).await?;
    Ok(Json(Empty {}))
}

async fn change_user_password(
    State(state): State<UserServiceState>,
    Json(req): Json<ChangeUserPasswordRequest>,
) -> Result<Json<Empty>, RpcFailure> {
    state
        .service
        .change_password(req.user_id, &req.old_password, &req.new_password)
        .await?;
    Ok(Json(Empty {}))
}

async fn validate_password(
    State(state): State<UserServiceState>,
    Json(req): Json<ValidatePasswordRequest>,
) -> Result<Json<ValidatePasswordReply>, RpcFailure> {
    let (user_id, is_valid) = state
        .service
        .validate_password(&req.user_name, &req.password)
        .await?;
    Ok(Json(ValidatePasswordReply { user_id, is_valid }))
}
