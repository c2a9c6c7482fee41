use serde_json::{json, Value};

use crate::auth::{self, Claims};
use crate::database::manager::DatabaseError;
use crate::database::UserRepository;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{string_field, validate_body, CREDENTIAL_RULES};

/// POST /api/auth/login - verify credentials and issue a bearer token.
///
/// Unknown email and wrong password produce the same response.
pub async fn login(ApiJson(mut body): ApiJson) -> ApiResult<Value> {
    validate_body(&mut body, CREDENTIAL_RULES)?;
    let email = string_field(&body, "email").unwrap_or_default().to_lowercase();
    let password = string_field(&body, "password").unwrap_or_default();

    let repo = UserRepository::new().await.map_err(login_error)?;
    let user = repo
        .find_by_email(&email)
        .await
        .map_err(login_error)?
        .ok_or_else(|| ApiError::unauthorized("Invalid credentials"))?;

    if !auth::verify_password(&password, &user.password_hash)? {
        return Err(ApiError::unauthorized("Invalid credentials"));
    }

    let token = auth::generate_jwt(&Claims::new(user.id, user.email.clone()))?;

    Ok(ApiResponse::success(json!({
        "token": token,
        "user": { "id": user.id, "email": user.email },
    })))
}

fn login_error(e: DatabaseError) -> ApiError {
    tracing::error!("Failed to log in: {}", e);
    ApiError::internal_server_error("Failed to log in")
}
