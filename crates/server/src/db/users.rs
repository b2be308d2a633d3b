//! User and access token repository.

use async_trait::async_trait;
use sqlx::PgPool;

use woo_bridge_core::{Email, TokenId, UserId};

use super::RepositoryError;
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "u.id, u.name, u.email, u.created_at, u.updated_at";

/// Storage for API accounts and their bearer tokens.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Look up an account with its password hash, for login.
    async fn find_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Store a token hash and return the new token's id.
    async fn create_token(
        &self,
        user_id: UserId,
        name: &str,
        token_hash: &str,
    ) -> Result<TokenId, RepositoryError>;

    /// Resolve a token to its owner and mark it as used.
    async fn find_by_token(
        &self,
        id: TokenId,
        token_hash: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// Delete a token. Unknown ids are ignored.
    async fn revoke_token(&self, id: TokenId) -> Result<(), RepositoryError>;
}

#[derive(sqlx::FromRow)]
struct UserWithPassword {
    #[sqlx(flatten)]
    user: User,
    password_hash: String,
}

/// `PostgreSQL`-backed [`UserStore`].
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, created_at, updated_at
            ",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email already exists"))
    }

    async fn find_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPassword>(&format!(
            "SELECT {USER_COLUMNS}, u.password_hash FROM users u WHERE u.email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (r.user, r.password_hash)))
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users u WHERE u.id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_token(
        &self,
        user_id: UserId,
        name: &str,
        token_hash: &str,
    ) -> Result<TokenId, RepositoryError> {
        let id: TokenId = sqlx::query_scalar(
            r"
            INSERT INTO personal_access_tokens (user_id, name, token_hash)
            VALUES ($1, $2, $3)
            RETURNING id
            ",
        )
        .bind(user_id)
        .bind(name)
        .bind(token_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "token already exists"))?;

        Ok(id)
    }

    async fn find_by_token(
        &self,
        id: TokenId,
        token_hash: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE personal_access_tokens t SET last_used_at = NOW() \
             FROM users u \
             WHERE t.id = $1 AND t.token_hash = $2 AND u.id = t.user_id \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn revoke_token(&self, id: TokenId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM personal_access_tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
