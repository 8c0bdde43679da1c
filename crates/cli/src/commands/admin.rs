//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create the first super admin, reading their password from stdin
//! echo "$PASSWORD" | mg-cli admin create -e admin@example.com -n "Admin Name" -r super_admin --password-stdin
//!
//! # Deactivate / reactivate by email
//! mg-cli admin deactivate -e admin@example.com
//! mg-cli admin activate -e admin@example.com
//!
//! # Reset a password
//! echo "$PASSWORD" | mg-cli admin set-password -e admin@example.com
//!
//! mg-cli admin list
//! ```
//!
//! # Environment Variables
//!
//! - `ADMIN_DATABASE_URL` - `PostgreSQL` connection string for admin database

use std::sync::Arc;

use marigold_admin::models::NewAdminUser;
use marigold_admin::services::{AdminManager, PasswordAuthenticator};
use marigold_admin::store::Backends;
use marigold_core::{AdminRole, Email};

use super::{CommandError, connect, read_password_from_stdin};

async fn manager() -> Result<(AdminManager, PasswordAuthenticator), CommandError> {
    let pool = connect().await?;
    let backends = Backends::postgres(&pool);
    let passwords = PasswordAuthenticator::new(Arc::clone(&backends.credentials));
    Ok((
        AdminManager::new(Arc::clone(&backends.admins), passwords.clone()),
        passwords,
    ))
}

/// Create a new admin user.
///
/// CLI-created admins have no `created_by`.
pub async fn create(
    email: &str,
    name: &str,
    role: &str,
    password_stdin: bool,
) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let role: AdminRole = role.parse()?;
    let password = password_stdin
        .then(read_password_from_stdin)
        .transpose()?;

    let (admins, _) = manager().await?;
    let admin = admins
        .create(
            NewAdminUser {
                email,
                name: name.trim().to_owned(),
                role,
                created_by: None,
            },
            password.as_ref(),
        )
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        admin.id,
        admin.email,
        admin.role
    );
    if password.is_none() {
        tracing::warn!(
            "Note: User has no password. Run 'mg-cli admin set-password' before they sign in."
        );
    }
    Ok(())
}

/// Activate or deactivate an admin by email.
pub async fn set_active(email: &str, active: bool) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let (admins, _) = manager().await?;

    let admin = admins.find_by_email(&email).await?;
    admins.set_active(admin.id, active, None).await?;

    if active {
        tracing::info!("Admin {} reactivated", email);
    } else {
        tracing::info!("Admin {} deactivated; open sessions end on their next request", email);
    }
    Ok(())
}

/// Set or replace an admin's login password, read from stdin.
pub async fn set_password(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let password = read_password_from_stdin()?;

    let (_, passwords) = manager().await?;
    passwords.set_password(&email, &password).await?;

    tracing::info!("Password updated for {}", email);
    Ok(())
}

/// Log every admin, newest first.
pub async fn list() -> Result<(), CommandError> {
    let (admins, _) = manager().await?;
    let users = admins.list().await?;

    tracing::info!("{} admin user(s)", users.len());
    for user in users {
        tracing::info!(
            "  {:>4}  {:<32} {:<12} {:<8} {}",
            user.id,
            user.email,
            user.role,
            if user.is_active { "active" } else { "inactive" },
            user.name
        );
    }
    Ok(())
}
