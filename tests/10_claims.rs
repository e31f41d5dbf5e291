use uuid::Uuid;

use vellum_api::auth::{generate_token, validate_token, Claims};
use vellum_api::domain::PrincipalKind;

#[test]
fn user_tokens_carry_their_name_and_kind() {
    let user_id = Uuid::new_v4();
    let claims = Claims::for_user(user_id, "alice".to_string());
    let token = generate_token(&claims).expect("sign token");

    let decoded = validate_token(&token).expect("validate token");
    assert_eq!(decoded.kind(), PrincipalKind::User);
    assert_eq!(decoded.principal_id().unwrap(), user_id);
    assert_eq!(decoded.user_name.as_deref(), Some("alice"));
    assert!(decoded.exp > decoded.iat);
}

#[test]
fn guest_tokens_are_recognized_by_the_missing_name() {
    let guest_id = Uuid::new_v4();
    let token = generate_token(&Claims::for_guest(guest_id)).expect("sign token");

    let decoded = validate_token(&token).expect("validate token");
    assert_eq!(decoded.kind(), PrincipalKind::Guest);
    assert_eq!(decoded.principal_id().unwrap(), guest_id);
}

#[test]
fn garbage_tokens_do_not_validate() {
    assert!(validate_token("not-a-token").is_err());
    assert!(validate_token("").is_err());

    // A structurally valid token signed with a different key must fail too.
    let other_key = jsonwebtoken::EncodingKey::from_secret(b"some-other-secret");
    let claims = Claims::for_guest(Uuid::new_v4());
    let forged = jsonwebtoken::encode(&jsonwebtoken::Header::default(), &claims, &other_key)
        .expect("sign with other key");
    assert!(validate_token(&forged).is_err());
}
