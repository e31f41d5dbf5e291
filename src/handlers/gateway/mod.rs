//! The public HTTP/JSON surface.
//!
//! The gateway authenticates bearer tokens and performs coarse
//! authorization only: which principal *kind* may call which endpoint.
//! Whether a specific principal may act on a specific document is the
//! document service's business, and no permission logic lives here.

pub mod auth;
pub mod document;
pub mod permission;
pub mod user;

use axum::extract::Extension;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::auth::Claims;
use crate::client::{DocumentServiceClient, UserServiceClient};
use crate::domain::{Cursor, PrincipalKind};
use crate::error::ApiError;
use crate::middleware::auth::jwt_auth_middleware;
use crate::middleware::request_id::request_id_middleware;

#[derive(Clone)]
pub struct GatewayState {
    pub user_client: UserServiceClient,
    pub document_client: DocumentServiceClient,
}

pub fn router(state: GatewayState) -> Router {
    let protected = Router::new()
        .route(
            "/user/:user_id",
            get(user::get_user)
                .put(user::change_password)
                .delete(user::deactivate_user),
        )
        .route(
            "/document",
            post(document::create_document)
                .get(document::list_documents)
                .delete(document::bulk_delete),
        )
        .route(
            "/document/:document_id",
            get(document::get_document)
                .put(document::update_document)
                .delete(document::delete_document),
        )
        .route(
            "/document/:document_id/permission",
            get(permission::list_permissions).post(permission::create_permission),
        )
        .route(
            "/document/:document_id/permission/principal/:principal_id",
            get(permission::get_principal_permission)
                .put(permission::update_principal_permission)
                .delete(permission::delete_principal_permission),
        )
        .layer(axum::middleware::from_fn(jwt_auth_middleware));

    Router::new()
        // Public: token acquisition and registration need no token.
        .route("/auth/login", post(auth::login))
        .route("/user", post(user::create_user))
        .route("/health", get(health))
        .merge(protected)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_id_middleware))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Coarse authorization: the endpoint is only open to user tokens.
pub(crate) fn require_user_token(claims: &Claims) -> Result<Uuid, ApiError> {
    if claims.kind() != PrincipalKind::User {
        return Err(ApiError::forbidden(
            "this endpoint requires a user type token",
        ));
    }
    principal_id(claims)
}

pub(crate) fn principal_id(claims: &Claims) -> Result<Uuid, ApiError> {
    claims
        .principal_id()
        .map_err(|e| ApiError::bad_request(e.to_string()))
}

pub(crate) fn claims(claims: Option<Extension<Claims>>) -> Result<Claims, ApiError> {
    // The middleware populates this on every protected route; absence means
    // the router is miswired.
    claims
        .map(|Extension(c)| c)
        .ok_or_else(|| ApiError::internal_server_error("no claims found on the request"))
}

/// Decode an optional opaque cursor query parameter.
pub(crate) fn decode_cursor(blob: Option<&str>) -> Result<Option<Cursor>, ApiError> {
    match blob {
        None => Ok(None),
        Some(blob) => Cursor::decode(blob)
            .map(Some)
            .map_err(|_| ApiError::bad_request("failed to parse the provided cursor")),
    }
}
