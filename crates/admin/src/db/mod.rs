//! `PostgreSQL` repositories for the admin console.
//!
//! ## Tables
//!
//! - `admin_users` - Admin allow-list (soft-deactivated, never deleted)
//! - `admin_sessions` - Admin sessions keyed by token digest
//! - `auth_users` - Password hashes checked at login
//! - `trial_users` / `trial_sessions` - Operator-provisioned demo access
//! - `tower_sessions.session` - Cookie session payloads (tower-sessions store)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! cargo run -p marigold-cli -- migrate
//! ```

pub mod admin_sessions;
pub mod admin_users;
pub mod auth_users;
pub mod trial;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use admin_sessions::AdminSessionRepository;
pub use admin_users::AdminUserRepository;
pub use auth_users::AuthUserRepository;
pub use trial::TrialRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Backend could not be reached (used by non-SQL stores).
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map a unique-constraint violation to `Conflict`, everything else to `Database`.
    pub(crate) fn from_insert(err: sqlx::Error, conflict: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(conflict.to_owned());
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
