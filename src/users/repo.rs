use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{NewUser, User, UserRow};
use crate::db::StoreError;

const USER_COLUMNS: &str =
    "id, username, email, password_hash, token, token_created_at, created_at, updated_at";

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError>;
    /// Fails with [`StoreError::Conflict`] when the email is taken.
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    /// Writes every mutable field of `user` back to the store.
    async fn save(&self, user: &User) -> Result<User, StoreError>;
}

#[derive(Clone)]
pub struct PgUserRepo {
    db: PgPool,
}

impl PgUserRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    async fn find_one(&self, field: &str, value: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {field} = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }
}

#[async_trait]
impl UserRepo for PgUserRepo {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one("email", email).await
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        self.find_one("token", token).await
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let sql = format!(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let (token, issued_at) = match &user.reset_token {
            Some(t) => (Some(t.token.as_str()), Some(t.issued_at)),
            None => (None, None),
        };
        let sql = format!(
            "UPDATE users \
                SET username = $2, email = $3, password_hash = $4, \
                    token = $5, token_created_at = $6, updated_at = now() \
              WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user.id)
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(token)
            .bind(issued_at)
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }
}
