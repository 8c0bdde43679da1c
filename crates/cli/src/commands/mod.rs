//! Subcommand implementations.
//!
//! Every command talks to the admin database through the same services the
//! console uses, so allow-list and trial rules are enforced identically.

pub mod admin;
pub mod migrate;
pub mod sessions;
pub mod trial;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

use marigold_admin::services::{AdminError, AuthError, TrialError};
use marigold_core::{EmailError, ParseRoleError, TokenError};

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error(transparent)]
    InvalidRole(#[from] ParseRoleError),

    #[error("Invalid trial token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("Could not read password: {0}")]
    PasswordInput(#[from] std::io::Error),

    #[error("Password cannot be empty")]
    EmptyPassword,

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Trial(#[from] TrialError),
}

/// Connect to the admin database.
///
/// Reads `ADMIN_DATABASE_URL`, falling back to `DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("ADMIN_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map_err(|_| CommandError::MissingEnvVar("ADMIN_DATABASE_URL"))?;

    tracing::info!("Connecting to admin database...");
    Ok(marigold_admin::db::create_pool(&SecretString::from(database_url)).await?)
}

/// Read a password from the first line of stdin.
pub fn read_password_from_stdin() -> Result<SecretString, CommandError> {
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CommandError::EmptyPassword);
    }
    Ok(SecretString::from(password.to_owned()))
}
