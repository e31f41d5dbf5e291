use vellum_api::api::status::{RpcError, RpcStatus};
use vellum_api::domain::DomainError;

#[test]
fn every_domain_error_kind_has_a_wire_and_http_status() {
    let table = [
        (DomainError::not_found("missing"), "NOT_FOUND", 404),
        (DomainError::invalid_input("bad"), "INVALID_ARGUMENT", 400),
        (DomainError::unique_conflict("dup"), "ALREADY_EXISTS", 409),
        (DomainError::PasswordMismatch, "PERMISSION_DENIED", 403),
        (DomainError::repo_msg("boom"), "INTERNAL", 500),
    ];
    for (err, wire_code, http) in table {
        let status = RpcStatus::from(&err);
        assert_eq!(serde_json::to_value(status).unwrap(), wire_code);
        assert_eq!(status.http_status(), http);
    }
}

#[test]
fn the_envelope_survives_a_serde_round_trip() {
    let envelope = RpcError {
        code: RpcStatus::AlreadyExists,
        message: "constraint violated: users_email_key".to_string(),
    };
    let json = serde_json::to_string(&envelope).unwrap();
    let parsed: RpcError = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed.code, RpcStatus::AlreadyExists);
    assert_eq!(parsed.message, envelope.message);
}

#[test]
fn expected_errors_keep_their_message_internal_ones_do_not() {
    let visible = RpcError::from_domain(&DomainError::not_found("no document found with id 42"));
    assert!(visible.message.contains("no document found"));

    let hidden = RpcError::from_domain(&DomainError::repo_msg("pool timeout on 10.0.0.3"));
    assert!(!hidden.message.contains("10.0.0.3"));
}
