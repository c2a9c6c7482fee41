use axum::Extension;

use crate::database::manager::DatabaseError;
use crate::database::models::Book;
use crate::database::BookRepository;
use crate::error::ApiError;
use crate::extract::ApiJson;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::validation::{string_field, validate_body, BOOK_RULES};

/// POST /api/books - create a book for the authenticated user.
///
/// The owner comes from the verified credential, never from the body.
pub async fn create(
    Extension(user): Extension<AuthUser>,
    ApiJson(mut body): ApiJson,
) -> ApiResult<Book> {
    validate_body(&mut body, BOOK_RULES)?;
    let title = string_field(&body, "title").unwrap_or_default();
    let author = string_field(&body, "author").unwrap_or_default();

    let repo = BookRepository::new().await.map_err(add_error)?;

    if repo
        .exists_duplicate(&title, &author, user.id)
        .await
        .map_err(add_error)?
    {
        return Err(ApiError::conflict(
            "Book with this title and author already exists",
        ));
    }

    // The unique index closes the check-then-insert race
    let book = match repo.insert(&title, &author, user.id).await {
        Ok(book) => book,
        Err(e) if e.is_unique_violation() => {
            return Err(ApiError::conflict(
                "Book with this title and author already exists",
            ))
        }
        Err(e) => return Err(add_error(e)),
    };

    Ok(ApiResponse::created(book).with_message("Book added successfully"))
}

fn add_error(e: DatabaseError) -> ApiError {
    tracing::error!("Failed to add book: {}", e);
    ApiError::internal_server_error("Failed to add book")
}
