use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::auth::validate_token;
use crate::error::ApiError;

/// JWT authentication middleware: validates the bearer token and injects the
/// claims into the request extensions. Handlers read them back with
/// `Extension<Claims>`. Public routes (login, health) are mounted outside
/// this layer.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers).map_err(ApiError::unauthorized)?;

    let claims = validate_token(&token)
        .map_err(|e| ApiError::unauthorized(format!("invalid bearer token: {e}")))?;

    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

/// Extract the token from the Authorization header
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, String> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| "Missing Authorization header".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        Some(_) => Err("Empty bearer token".to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_extraction_requires_the_scheme() {
        let mut headers = HeaderMap::new();
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Token abc"));
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(extract_bearer_token(&headers).is_err());

        headers.insert("authorization", HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(extract_bearer_token(&headers).unwrap(), "abc.def.ghi");
    }
}
