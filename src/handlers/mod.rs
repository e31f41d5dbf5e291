pub mod documents;
pub mod gateway;
pub mod users;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::api::status::RpcError;
use crate::domain::DomainError;

/// Domain error leaving an RPC server: logged if it is repository detail,
/// then shipped as the wire envelope with the matching HTTP status.
pub struct RpcFailure(pub DomainError);

impl From<DomainError> for RpcFailure {
    fn from(err: DomainError) -> Self {
        RpcFailure(err)
    }
}

impl IntoResponse for RpcFailure {
    fn into_response(self) -> Response {
        if let DomainError::Repo { .. } = &self.0 {
            error!(error = %self.0, "request failed with repository error");
        }
        let envelope = RpcError::from_domain(&self.0);
        let status = StatusCode::from_u16(envelope.code.http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(envelope)).into_response()
    }
}
