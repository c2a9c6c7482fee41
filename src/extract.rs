use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde_json::Value;

use crate::error::ApiError;

/// JSON body extractor whose rejection uses the uniform error envelope.
pub struct ApiJson(pub Value);

#[async_trait]
impl<S> FromRequest<S> for ApiJson
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(ApiError::invalid_json(format!(
                "Invalid JSON payload: {}",
                rejection.body_text()
            ))),
        }
    }
}
