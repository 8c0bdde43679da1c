//! Trial user provisioning.
//!
//! # Usage
//!
//! ```bash
//! mg-cli trial create --name "Jane Prospect" --email jane@example.com --days 14
//! mg-cli trial revoke --token <TOKEN>
//! ```

use std::sync::Arc;

use chrono::Duration;

use marigold_admin::config::SessionConfig;
use marigold_admin::services::TrialManager;
use marigold_admin::store::Backends;
use marigold_core::{Email, TrialToken};

use super::{CommandError, connect};

async fn manager() -> Result<TrialManager, CommandError> {
    let pool = connect().await?;
    let backends = Backends::postgres(&pool);
    Ok(TrialManager::new(
        Arc::clone(&backends.trials),
        SessionConfig::default().trial_ttl,
    ))
}

/// Create a trial user and log its token.
pub async fn create(
    name: Option<String>,
    email: Option<&str>,
    days: u16,
) -> Result<(), CommandError> {
    let email = email.map(Email::parse).transpose()?;
    let trials = manager().await?;

    let user = trials
        .create_trial_user(name, email, Duration::days(i64::from(days)))
        .await?;

    tracing::info!("Trial user created successfully!");
    tracing::info!("  Name: {}", user.display_name());
    tracing::info!("  Expires: {}", user.expires_at);
    tracing::info!("");
    tracing::info!("Share this trial code:");
    tracing::info!("  {}", user.token.expose());
    Ok(())
}

/// Deactivate a trial user.
pub async fn revoke(token: &str) -> Result<(), CommandError> {
    let token = TrialToken::parse(token)?;
    manager().await?.revoke_trial_user(&token).await?;

    tracing::info!("Trial revoked");
    Ok(())
}
