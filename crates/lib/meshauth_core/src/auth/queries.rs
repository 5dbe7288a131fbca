//! PostgreSQL-backed user store.

use async_trait::async_trait;
use sqlx::PgPool;

use super::store::{StoreError, UserStore};
use crate::models::auth::{User, UserRecord};
use crate::uuid::uuidv7;

/// User store over the `users` table.
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let row = sqlx::query_as::<_, (String, String, String, String)>(
            "SELECT id::text, email, name, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id, email, name, password_hash)| UserRecord {
            user: User { id, email, name },
            password_hash,
        }))
    }

    async fn insert_user(
        &self,
        email: &str,
        password_hash: &str,
        name: &str,
    ) -> Result<User, StoreError> {
        let id = sqlx::query_scalar::<_, String>(
            "INSERT INTO users (id, email, name, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id::text",
        )
        .bind(uuidv7())
        .bind(email)
        .bind(name)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await?;
        Ok(User {
            id,
            email: email.to_string(),
            name: name.to_string(),
        })
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
