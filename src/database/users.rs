use sqlx::PgPool;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::User;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub async fn new() -> Result<Self, DatabaseError> {
        Ok(Self {
            pool: DatabaseManager::pool().await?,
        })
    }

    pub fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    pub async fn insert(&self, email: &str, password_hash: &str) -> Result<User, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, password_hash, created_at) \
             VALUES ($1, $2, NOW()) RETURNING *",
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }
}
