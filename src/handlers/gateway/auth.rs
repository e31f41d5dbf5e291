use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{generate_token, Claims};
use crate::config;
use crate::error::ApiError;
use crate::handlers::gateway::GatewayState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub user_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub expires_in_seconds: i64,
}

/// POST /auth/login - validate credentials and mint a user token.
///
/// An unknown user is 404 and a wrong password is 401; clients can tell the
/// two apart.
pub async fn login(
    State(state): State<GatewayState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (user_id, is_valid) = state
        .user_client
        .validate_password(body.user_name.clone(), body.password)
        .await
        .map_err(ApiError::from)?;

    let user_id = match user_id {
        Some(user_id) if is_valid => user_id,
        _ => {
            return Err(ApiError::unauthorized(
                "the provided username and password did not match",
            ))
        }
    };

    let claims = Claims::for_user(user_id, body.user_name);
    let token = generate_token(&claims)
        .map_err(|e| ApiError::internal_server_error(format!("failed to sign token: {e}")))?;

    Ok(Json(LoginResponse {
        token,
        expires_in_seconds: config::config().security.token_lifetime_seconds,
    }))
}
