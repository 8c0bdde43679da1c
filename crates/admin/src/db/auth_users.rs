//! Password credential repository (`auth_users`).

use async_trait::async_trait;
use sqlx::PgPool;

use marigold_core::Email;

use super::RepositoryError;
use crate::store::CredentialStore;

/// Repository for password hashes.
#[derive(Clone)]
pub struct AuthUserRepository {
    pool: PgPool,
}

impl AuthUserRepository {
    /// Create a new credential repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for AuthUserRepository {
    async fn password_hash(&self, email: &Email) -> Result<Option<String>, RepositoryError> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM auth_users WHERE email = $1",
        )
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }

    async fn set_password_hash(&self, email: &Email, hash: &str) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO auth_users (email, password_hash)
            VALUES ($1, $2)
            ON CONFLICT (email)
            DO UPDATE SET password_hash = EXCLUDED.password_hash, updated_at = NOW()
            ",
        )
        .bind(email.as_str())
        .bind(hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
