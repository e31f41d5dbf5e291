//! Bearer token claims shared by the gateway's login handler and auth
//! middleware.
//!
//! The principal kind is encoded implicitly: a token carries `user_name` iff
//! it was minted for a user, and guest tokens omit the field. Call sites
//! never inspect `user_name` directly — `kind()` is the single accessor for
//! the distinction.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config;
use crate::domain::PrincipalKind;

pub const TOKEN_ISSUER: &str = "vellum";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id in canonical text form.
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn for_user(user_id: Uuid, user_name: String) -> Self {
        Self::new(user_id, Some(user_name))
    }

    pub fn for_guest(guest_id: Uuid) -> Self {
        Self::new(guest_id, None)
    }

    fn new(principal_id: Uuid, user_name: Option<String>) -> Self {
        let now = Utc::now();
        let lifetime = config::config().security.token_lifetime_seconds;
        Self {
            sub: principal_id.to_string(),
            user_name,
            iss: TOKEN_ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(lifetime)).timestamp(),
        }
    }

    /// The kind of principal this token was minted for.
    pub fn kind(&self) -> PrincipalKind {
        match &self.user_name {
            Some(name) if !name.is_empty() => PrincipalKind::User,
            _ => PrincipalKind::Guest,
        }
    }

    pub fn principal_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::MalformedSubject(self.sub.clone()))
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("failed to parse the principal id from the token subject: {0}")]
    MalformedSubject(String),

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("invalid token: {0}")]
    InvalidToken(jsonwebtoken::errors::Error),
}

pub fn generate_token(claims: &Claims) -> Result<String, AuthError> {
    let secret = &config::config().security.jwt_secret;
    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(AuthError::Signing)
}

pub fn validate_token(token: &str) -> Result<Claims, AuthError> {
    let secret = &config::config().security.jwt_secret;
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.set_issuer(&[TOKEN_ISSUER]);
    let token_data =
        decode::<Claims>(token, &decoding_key, &validation).map_err(AuthError::InvalidToken)?;
    Ok(token_data.claims)
}
