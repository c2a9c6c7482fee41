use axum::{extract::Path, Extension};
use serde_json::{json, Value};

use crate::database::manager::DatabaseError;
use crate::database::BookRepository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::validate_id;

/// DELETE /api/books/:id - hard delete, scoped to the owner.
pub async fn delete(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = validate_id(&id)?;

    let repo = BookRepository::new().await.map_err(delete_error)?;
    let deleted = repo.delete(id, user.id).await.map_err(delete_error)?;

    match deleted {
        Some(book) => Ok(ApiResponse::success(json!({ "id": book.id }))
            .with_message("Book deleted successfully")),
        None => Err(ApiError::not_found("Book not found or unauthorized")),
    }
}

fn delete_error(e: DatabaseError) -> ApiError {
    tracing::error!("Failed to delete book: {}", e);
    ApiError::internal_server_error("Failed to delete book")
}
