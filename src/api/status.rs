//! Wire status codes for the unary RPC protocol.
//!
//! The domain taxonomy must cross the service boundary without semantic
//! loss: each domain error kind maps onto exactly one wire status, and the
//! gateway maps that status onto an HTTP response. Repository-implementation
//! detail never leaves the service; it is logged there and travels as a
//! generic INTERNAL.

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcStatus {
    NotFound,
    InvalidArgument,
    AlreadyExists,
    PermissionDenied,
    Internal,
}

impl RpcStatus {
    pub fn http_status(self) -> u16 {
        match self {
            RpcStatus::NotFound => 404,
            RpcStatus::InvalidArgument => 400,
            RpcStatus::AlreadyExists => 409,
            RpcStatus::PermissionDenied => 403,
            RpcStatus::Internal => 500,
        }
    }
}

impl From<&DomainError> for RpcStatus {
    fn from(err: &DomainError) -> Self {
        match err {
            DomainError::NotFound(_) => RpcStatus::NotFound,
            DomainError::InvalidInput(_) => RpcStatus::InvalidArgument,
            DomainError::UniqueConflict(_) => RpcStatus::AlreadyExists,
            DomainError::PasswordMismatch => RpcStatus::PermissionDenied,
            DomainError::Repo { .. } => RpcStatus::Internal,
        }
    }
}

/// Error envelope carried in the body of non-2xx RPC responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: RpcStatus,
    pub message: String,
}

impl RpcError {
    /// Build the envelope for a domain error. Internal detail is not
    /// forwarded; the caller is expected to have logged it.
    pub fn from_domain(err: &DomainError) -> Self {
        let code = RpcStatus::from(err);
        let message = match code {
            RpcStatus::Internal => "internal server error encountered".to_string(),
            _ => err.to_string(),
        };
        Self { code, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_onto_the_status_table() {
        let cases = [
            (DomainError::not_found("x"), RpcStatus::NotFound, 404),
            (DomainError::invalid_input("x"), RpcStatus::InvalidArgument, 400),
            (DomainError::unique_conflict("x"), RpcStatus::AlreadyExists, 409),
            (DomainError::PasswordMismatch, RpcStatus::PermissionDenied, 403),
            (DomainError::repo_msg("x"), RpcStatus::Internal, 500),
        ];
        for (err, status, http) in cases {
            assert_eq!(RpcStatus::from(&err), status);
            assert_eq!(status.http_status(), http);
        }
    }

    #[test]
    fn internal_detail_is_not_forwarded() {
        let err = DomainError::repo_msg("connection pool exhausted on shard 7");
        let envelope = RpcError::from_domain(&err);
        assert_eq!(envelope.code, RpcStatus::Internal);
        assert!(!envelope.message.contains("shard 7"));
    }

    #[test]
    fn status_codes_serialize_in_screaming_snake_case() {
        let json = serde_json::to_string(&RpcStatus::InvalidArgument).unwrap();
        assert_eq!(json, "\"INVALID_ARGUMENT\"");
    }
}
