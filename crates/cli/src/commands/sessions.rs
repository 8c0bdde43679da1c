//! Session maintenance.
//!
//! # Usage
//!
//! ```bash
//! # One-off sweep of expired admin and trial sessions
//! mg-cli sessions cleanup
//!
//! # Sign an admin out everywhere
//! mg-cli sessions revoke -e admin@example.com
//! ```

use std::sync::Arc;

use marigold_admin::config::SessionConfig;
use marigold_admin::services::{SessionManager, TrialManager};
use marigold_admin::store::Backends;
use marigold_core::Email;

use super::{CommandError, connect};

async fn backends() -> Result<(Backends, SessionConfig), CommandError> {
    let pool = connect().await?;
    Ok((Backends::postgres(&pool), SessionConfig::default()))
}

/// Delete expired admin and trial sessions.
pub async fn cleanup() -> Result<(), CommandError> {
    let (backends, config) = backends().await?;
    let sessions = SessionManager::from_backends(&backends, config.admin_ttl);
    let trials = TrialManager::new(Arc::clone(&backends.trials), config.trial_ttl);

    let admin_removed = sessions.cleanup_expired_sessions().await?;
    let trial_removed = trials.cleanup_expired_trial_sessions().await?;

    tracing::info!(
        "Removed {} expired admin session(s) and {} expired trial session(s)",
        admin_removed,
        trial_removed
    );
    Ok(())
}

/// Delete every session owned by an admin.
pub async fn revoke(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let (backends, config) = backends().await?;
    let sessions = SessionManager::from_backends(&backends, config.admin_ttl);

    let removed = sessions.revoke_sessions_for(&email).await?;
    tracing::info!("Revoked {} session(s) for {}", removed, email);
    Ok(())
}
