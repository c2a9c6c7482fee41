//! Data access for book rows.
//!
//! Every query is scoped by the owning user; that scoping is the only
//! authorization mechanism in the system.

use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::Book;

pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Page of books for one owner, newest first, with the total row count
    /// for pagination. `search` matches title OR author, case-insensitive.
    pub async fn find_by_owner(
        &self,
        owner: Uuid,
        page: i64,
        limit: i64,
        search: Option<&str>,
    ) -> Result<(Vec<Book>, i64), DatabaseError> {
        let offset = (page - 1) * limit;

        match search {
            Some(term) => {
                let pattern = format!("%{}%", term);
                let books = sqlx::query_as::<_, Book>(
                    "SELECT * FROM books \
                     WHERE user_id = $1 AND (title ILIKE $2 OR author ILIKE $2) \
                     ORDER BY created_at DESC LIMIT $3 OFFSET $4",
                )
                .bind(owner)
                .bind(&pattern)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM books \
                     WHERE user_id = $1 AND (title ILIKE $2 OR author ILIKE $2)",
                )
                .bind(owner)
                .bind(&pattern)
                .fetch_one(&self.pool)
                .await?;

                Ok((books, total))
            }
            None => {
                let books = sqlx::query_as::<_, Book>(
                    "SELECT * FROM books WHERE user_id = $1 \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3",
                )
                .bind(owner)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await?;

                let total: i64 =
                    sqlx::query_scalar("SELECT COUNT(*) FROM books WHERE user_id = $1")
                        .bind(owner)
                        .fetch_one(&self.pool)
                        .await?;

                Ok((books, total))
            }
        }
    }

    pub async fn find_by_id(&self, id: i64, owner: Uuid) -> Result<Option<Book>, DatabaseError> {
        let book = sqlx::query_as::<_, Book>(
            "SELECT * FROM books WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }

    /// Duplicate pre-check for create. Not atomic against a concurrent
    /// identical insert; the unique index on (user_id, title, author) closes
    /// that race at the storage layer.
    pub async fn exists_duplicate(
        &self,
        title: &str,
        author: &str,
        owner: Uuid,
    ) -> Result<bool, DatabaseError> {
        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM books WHERE title = $1 AND author = $2 AND user_id = $3",
        )
        .bind(title)
        .bind(author)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing.is_some())
    }

    pub async fn insert(
        &self,
        title: &str,
        author: &str,
        owner: Uuid,
    ) -> Result<Book, DatabaseError> {
        let book = sqlx::query_as::<_, Book>(
            "INSERT INTO books (title, author, user_id, created_at, updated_at) \
             VALUES ($1, $2, $3, NOW(), NOW()) RETURNING *",
        )
        .bind(title)
        .bind(author)
        .bind(owner)
        .fetch_one(&self.pool)
        .await?;

        Ok(book)
    }

    /// Update only the supplied columns; `updated_at` always refreshes.
    /// Returns None when the row does not exist or is not owned by `owner`.
    pub async fn update_fields(
        &self,
        id: i64,
        owner: Uuid,
        title: Option<&str>,
        author: Option<&str>,
    ) -> Result<Option<Book>, DatabaseError> {
        let sql = build_update_sql(title.is_some(), author.is_some());

        let mut query = sqlx::query_as::<_, Book>(&sql);
        if let Some(title) = title {
            query = query.bind(title);
        }
        if let Some(author) = author {
            query = query.bind(author);
        }
        let book = query
            .bind(id)
            .bind(owner)
            .fetch_optional(&self.pool)
            .await?;

        Ok(book)
    }

    /// Returns the deleted row, or None when nothing matched the owner scope.
    pub async fn delete(&self, id: i64, owner: Uuid) -> Result<Option<Book>, DatabaseError> {
        let book = sqlx::query_as::<_, Book>(
            "DELETE FROM books WHERE id = $1 AND user_id = $2 RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await?;

        Ok(book)
    }
}

fn build_update_sql(has_title: bool, has_author: bool) -> String {
    let mut sets: Vec<String> = Vec::new();
    let mut placeholder = 1;

    if has_title {
        sets.push(format!("title = ${}", placeholder));
        placeholder += 1;
    }
    if has_author {
        sets.push(format!("author = ${}", placeholder));
        placeholder += 1;
    }
    sets.push("updated_at = NOW()".to_string());

    format!(
        "UPDATE books SET {} WHERE id = ${} AND user_id = ${} RETURNING *",
        sets.join(", "),
        placeholder,
        placeholder + 1
    )
}
