//! Admin session repository.
//!
//! Rows are keyed by the SHA-256 digest of the bearer token. Liveness is
//! computed in SQL (`expires_at > $now`) so the expiry rule lives at the
//! query boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marigold_core::Email;

use super::RepositoryError;
use crate::models::session::{AdminSession, NewAdminSession, SessionLookup};
use crate::services::auth::TokenDigest;
use crate::store::SessionStore;

#[derive(Debug, sqlx::FromRow)]
struct AdminSessionRow {
    admin_email: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    live: bool,
}

impl TryFrom<AdminSessionRow> for AdminSession {
    type Error = RepositoryError;

    fn try_from(row: AdminSessionRow) -> Result<Self, Self::Error> {
        let admin_email = Email::parse(&row.admin_email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in admin_sessions: {e}"))
        })?;

        Ok(Self {
            admin_email,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

/// Repository for `admin_sessions`.
#[derive(Clone)]
pub struct AdminSessionRepository {
    pool: PgPool,
}

impl AdminSessionRepository {
    /// Create a new session repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionStore for AdminSessionRepository {
    async fn insert(&self, session: NewAdminSession) -> Result<AdminSession, RepositoryError> {
        let row = sqlx::query_as::<_, AdminSessionRow>(
            r"
            INSERT INTO admin_sessions (admin_email, session_token, expires_at)
            VALUES ($1, $2, $3)
            RETURNING admin_email, expires_at, created_at, TRUE AS live
            ",
        )
        .bind(session.admin_email.as_str())
        .bind(session.token_digest.as_str())
        .bind(session.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "session token collision"))?;

        row.try_into()
    }

    async fn lookup(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
    ) -> Result<SessionLookup, RepositoryError> {
        let row = sqlx::query_as::<_, AdminSessionRow>(
            r"
            SELECT admin_email, expires_at, created_at, expires_at > $2 AS live
            FROM admin_sessions
            WHERE session_token = $1
            ",
        )
        .bind(digest.as_str())
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            None => Ok(SessionLookup::Missing),
            Some(row) if !row.live => Ok(SessionLookup::Expired),
            Some(row) => Ok(SessionLookup::Live(row.try_into()?)),
        }
    }

    async fn delete(&self, digest: &TokenDigest) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE session_token = $1")
            .bind(digest.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_for_email(&self, email: &Email) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE admin_email = $1")
            .bind(email.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
