//! Admin allow-list repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marigold_core::{AdminUserId, Email};

use super::RepositoryError;
use crate::models::admin_user::{AdminRole, AdminUser, NewAdminUser};
use crate::store::AdminDirectory;

/// Internal row type for `admin_users` queries.
#[derive(Debug, sqlx::FromRow)]
struct AdminUserRow {
    id: i64,
    email: String,
    name: String,
    role: AdminRole,
    is_active: bool,
    created_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<AdminUserRow> for AdminUser {
    type Error = RepositoryError;

    fn try_from(row: AdminUserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in admin_users: {e}"))
        })?;

        Ok(Self {
            id: AdminUserId::new(row.id),
            email,
            name: row.name,
            role: row.role,
            is_active: row.is_active,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

const SELECT_COLUMNS: &str = "id, email, name, role, is_active, created_by, created_at";

/// Repository for the admin allow-list.
#[derive(Clone)]
pub struct AdminUserRepository {
    pool: PgPool,
}

impl AdminUserRepository {
    /// Create a new admin user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AdminDirectory for AdminUserRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM admin_users WHERE email = $1"
        ))
        .bind(email.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn find_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM admin_users WHERE id = $1"
        ))
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    async fn list_all(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let rows = sqlx::query_as::<_, AdminUserRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM admin_users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    async fn create(&self, new: NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            r"
            INSERT INTO admin_users (email, name, role, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING {SELECT_COLUMNS}
            "
        ))
        .bind(new.email.as_str())
        .bind(&new.name)
        .bind(new.role)
        .bind(new.created_by.as_ref().map(Email::as_str))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::from_insert(e, "email already exists"))?;

        row.try_into()
    }

    async fn set_active(
        &self,
        id: AdminUserId,
        active: bool,
    ) -> Result<AdminUser, RepositoryError> {
        let row = sqlx::query_as::<_, AdminUserRow>(&format!(
            "UPDATE admin_users SET is_active = $1 WHERE id = $2 RETURNING {SELECT_COLUMNS}"
        ))
        .bind(active)
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    async fn delete(&self, id: AdminUserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM admin_users WHERE id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
