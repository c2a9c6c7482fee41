use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::auth::{validate_jwt, Claims};
use crate::error::ApiError;

/// Authenticated user context extracted from the bearer credential.
/// Ownership scoping downstream relies on `id`; there is no separate
/// permission check.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            email: claims.email,
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;

    let claims = validate_jwt(&token).map_err(|msg| {
        tracing::debug!("Token rejected: {}", msg);
        ApiError::unauthorized("Invalid or expired token")
    })?;

    let auth_user = AuthUser::from(claims);
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Extract the token from the Authorization header.
/// Missing, non-Bearer, and empty credentials all read as "no token".
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .ok_or_else(|| ApiError::unauthorized("No token provided"))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::unauthorized("No token provided"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        _ => Err(ApiError::unauthorized("No token provided")),
    }
}
