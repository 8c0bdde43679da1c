//! Trial user and trial session repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use marigold_core::{Email, TrialToken, TrialUserId};

use super::RepositoryError;
use crate::models::trial::{NewTrialUser, TrialSession, TrialUser};
use crate::store::TrialStore;

#[derive(Debug, sqlx::FromRow)]
struct TrialUserRow {
    id: i64,
    trial_token: String,
    name: Option<String>,
    email: Option<String>,
    is_active: bool,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TrialUserRow> for TrialUser {
    type Error = RepositoryError;

    fn try_from(row: TrialUserRow) -> Result<Self, Self::Error> {
        let token = TrialToken::parse(&row.trial_token).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid token in trial_users: {e}"))
        })?;
        // Trial emails are informational; a malformed one is dropped, not fatal.
        let email = row.email.as_deref().and_then(|e| Email::parse(e).ok());

        Ok(Self {
            id: TrialUserId::new(row.id),
            token,
            name: row.name,
            email,
            is_active: row.is_active,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct TrialSessionRow {
    id: Uuid,
    trial_token: String,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TrialSessionRow> for TrialSession {
    type Error = RepositoryError;

    fn try_from(row: TrialSessionRow) -> Result<Self, Self::Error> {
        let token = TrialToken::parse(&row.trial_token).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid token in trial_sessions: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            token,
            expires_at: row.expires_at,
            created_at: row.created_at,
        })
    }
}

const USER_COLUMNS: &str = "id, trial_token, name, email, is_active, expires_at, created_at";

/// Repository for `trial_users` and `trial_sessions`.
#[derive(Clone)]
pub struct TrialRepository {
    pool: PgPool,
}

impl TrialRepository {
    /// Create a new trial repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TrialStore for TrialRepository {
    async fn create_user(&self, new: NewTrialUser) -> Result<TrialUser, RepositoryError> {
        let row = sqlx::query_as::<_, TrialUserRow>(&format!(
            r"
            INSERT INTO trial_users (trial_token, name, email, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(new.token.expose())
        .bind(new.name.as_deref())
        .bind(new.email.as_ref().map(Email::as_str))
        .bind(new.expires_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "trial token already exists"))?;

        row.try_into()
    }

    async fn find_user(&self, token: &TrialToken) -> Result<Option<TrialUser>, RepositoryError> {
        let row = sqlx::query_as::<_, TrialUserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM trial_users WHERE trial_token = $1"
        ))
        .bind(token.expose())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn set_user_active(
        &self,
        token: &TrialToken,
        active: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE trial_users SET is_active = $1 WHERE trial_token = $2")
            .bind(active)
            .bind(token.expose())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn create_session(&self, session: &TrialSession) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO trial_sessions (id, trial_token, expires_at, created_at)
            VALUES ($1, $2, $3, $4)
            ",
        )
        .bind(session.id)
        .bind(session.token.expose())
        .bind(session.expires_at)
        .bind(session.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<TrialSession>, RepositoryError> {
        let row = sqlx::query_as::<_, TrialSessionRow>(
            "SELECT id, trial_token, expires_at, created_at FROM trial_sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM trial_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM trial_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
