use axum::{extract::Query, Extension};
use serde::Deserialize;

use crate::config;
use crate::database::manager::DatabaseError;
use crate::database::models::Book;
use crate::database::BookRepository;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser, Pagination};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

/// GET /api/books - page of the authenticated user's books, newest first.
///
/// Optional `search` matches title or author as a case-insensitive
/// substring. Unparseable paging values fall back to their defaults.
pub async fn list(
    Extension(user): Extension<AuthUser>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<Book>> {
    let api_config = &config::config().api;

    let page = query
        .page
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|p| *p >= 1)
        .unwrap_or(1);
    let limit = query
        .limit
        .as_deref()
        .and_then(|s| s.parse::<i64>().ok())
        .filter(|l| *l >= 1)
        .unwrap_or(api_config.default_page_size)
        .min(api_config.max_page_size);
    let search = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let repo = BookRepository::new().await.map_err(fetch_error)?;
    let (books, total) = repo
        .find_by_owner(user.id, page, limit, search)
        .await
        .map_err(fetch_error)?;

    Ok(ApiResponse::success(books).with_pagination(Pagination::new(page, limit, total)))
}

fn fetch_error(e: DatabaseError) -> ApiError {
    tracing::error!("Failed to fetch books: {}", e);
    ApiError::internal_server_error("Failed to fetch books")
}
