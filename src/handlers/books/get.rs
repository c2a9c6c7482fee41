use axum::{extract::Path, Extension};

use crate::database::manager::DatabaseError;
use crate::database::models::Book;
use crate::database::BookRepository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::validate_id;

/// GET /api/books/:id - single book, scoped to the owner.
///
/// A row owned by someone else reads as absent; the caller cannot tell
/// the two cases apart.
pub async fn get(
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Book> {
    let id = validate_id(&id)?;

    let repo = BookRepository::new().await.map_err(fetch_error)?;
    let book = repo.find_by_id(id, user.id).await.map_err(fetch_error)?;

    book.map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found("Book not found"))
}

fn fetch_error(e: DatabaseError) -> ApiError {
    tracing::error!("Failed to fetch book: {}", e);
    ApiError::internal_server_error("Failed to fetch book")
}
