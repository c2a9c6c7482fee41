use serde_json::{json, Value};

use crate::auth;
use crate::database::manager::DatabaseError;
use crate::database::UserRepository;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult};
use crate::validation::{string_field, validate_body, CREDENTIAL_RULES};

/// POST /api/auth/register - create a new account from email + password.
pub async fn register(ApiJson(mut body): ApiJson) -> ApiResult<Value> {
    validate_body(&mut body, CREDENTIAL_RULES)?;
    let email = string_field(&body, "email").unwrap_or_default().to_lowercase();
    let password = string_field(&body, "password").unwrap_or_default();

    let password_hash = auth::hash_password(&password)?;

    let repo = UserRepository::new().await.map_err(register_error)?;

    // Friendly pre-check; the unique index on email backstops the race
    if repo
        .find_by_email(&email)
        .await
        .map_err(register_error)?
        .is_some()
    {
        return Err(ApiError::conflict("User with this email already exists"));
    }

    let user = match repo.insert(&email, &password_hash).await {
        Ok(user) => user,
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::conflict("User with this email already exists"))
        }
        Err(e) => return Err(register_error(e)),
    };

    Ok(
        ApiResponse::created(json!({ "id": user.id, "email": user.email }))
            .with_message("User registered successfully"),
    )
}

fn register_error(e: DatabaseError) -> ApiError {
    tracing::error!("Failed to register user: {}", e);
    ApiError::internal_server_error("Failed to register user")
}
