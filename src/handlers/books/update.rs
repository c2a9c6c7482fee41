use axum::{extract::Path, Extension};

use crate::database::manager::DatabaseError;
use crate::database::models::Book;
use crate::database::BookRepository;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::{string_field, validate_body, validate_id, BOOK_UPDATE_RULES};

/// PUT /api/books/:id - partial update; only supplied fields change.
pub async fn update(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    ApiJson(mut body): ApiJson,
) -> ApiResult<Book> {
    let id = validate_id(&id)?;
    validate_body(&mut body, BOOK_UPDATE_RULES)?;

    let title = string_field(&body, "title");
    let author = string_field(&body, "author");
    if title.is_none() && author.is_none() {
        return Err(ApiError::validation_error(
            "Validation Error: At least one field (title or author) is required",
        ));
    }

    let repo = BookRepository::new().await.map_err(update_error)?;
    let book = repo
        .update_fields(id, user.id, title.as_deref(), author.as_deref())
        .await
        .map_err(update_error)?;

    book.map(|b| ApiResponse::success(b).with_message("Book updated successfully"))
        .ok_or_else(|| ApiError::not_found("Book not found or unauthorized"))
}

fn update_error(e: DatabaseError) -> ApiError {
    tracing::error!("Failed to update book: {}", e);
    ApiError::internal_server_error("Failed to update book")
}
