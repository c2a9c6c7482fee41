use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

/// Pagination block returned by list endpoints.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    #[serde(rename = "totalPages")]
    pub total_pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };
        Self { page, limit, total, total_pages }
    }
}

/// Wrapper for API responses that automatically adds the success envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status_code: Option<StatusCode>,
    pub message: Option<String>,
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful API response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data,
            status_code: None, // Default to 200 OK
            message: None,
            pagination: None,
        }
    }

    /// Create a 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            status_code: Some(StatusCode::CREATED),
            ..Self::success(data)
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status_code.unwrap_or(StatusCode::OK);

        let data_value = match serde_json::to_value(&self.data) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!("Failed to serialize response data: {}", e);
                return crate::error::ApiError::internal_server_error("Failed to format response")
                    .into_response();
            }
        };

        let mut envelope = json!({
            "success": true,
            "data": data_value,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        if let Some(message) = self.message {
            envelope["message"] = json!(message);
        }
        if let Some(pagination) = self.pagination {
            envelope["pagination"] = json!(pagination);
        }

        (status, Json(envelope)).into_response()
    }
}

// Convenience type alias
pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;
