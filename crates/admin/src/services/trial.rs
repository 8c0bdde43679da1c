//! Trial/demo access.
//!
//! A trial visit is two hops: the [`TrialSession`] opened when the visitor
//! entered their token, and the operator-provisioned [`TrialUser`] behind it.
//! Both must still be usable for the visit to count.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use uuid::Uuid;

use marigold_core::{Email, TokenError, TrialToken};

use super::auth::generate_trial_token;
use crate::db::RepositoryError;
use crate::models::{NewTrialUser, TrialSession, TrialUser};
use crate::store::TrialStore;

/// Errors from trial validation and provisioning.
#[derive(Debug, Error)]
pub enum TrialError {
    /// The submitted token is not well-formed.
    #[error("invalid trial token: {0}")]
    InvalidToken(#[from] TokenError),

    /// No trial user or trial session matches.
    #[error("trial not found")]
    NotFound,

    /// The trial user has been revoked.
    #[error("trial has been revoked")]
    Inactive,

    /// The trial user or session is past its expiry.
    #[error("trial has expired")]
    Expired,

    #[error("trial backend error: {0}")]
    Backend(#[from] RepositoryError),
}

/// Validates trial tokens and manages trial sessions.
#[derive(Clone)]
pub struct TrialManager {
    store: Arc<dyn TrialStore>,
    session_ttl: Duration,
}

impl TrialManager {
    #[must_use]
    pub fn new(store: Arc<dyn TrialStore>, session_ttl: Duration) -> Self {
        Self { store, session_ttl }
    }

    /// Resolve a token to a usable trial user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Inactive` or `Expired` when the token cannot be
    /// used, `Backend` if the lookup fails.
    pub async fn validate_trial_token(&self, token: &TrialToken) -> Result<TrialUser, TrialError> {
        let user = self
            .store
            .find_user(token)
            .await?
            .ok_or(TrialError::NotFound)?;
        check_user(&user, Utc::now())?;
        Ok(user)
    }

    /// Open a trial session for a token.
    ///
    /// The session never outlives the trial user it belongs to.
    ///
    /// # Errors
    ///
    /// See [`Self::validate_trial_token`].
    #[tracing::instrument(skip(self, token))]
    pub async fn start_trial_session(
        &self,
        token: &TrialToken,
    ) -> Result<(TrialSession, TrialUser), TrialError> {
        let user = self.validate_trial_token(token).await?;
        let now = Utc::now();
        let session = TrialSession {
            id: Uuid::new_v4(),
            token: token.clone(),
            expires_at: (now + self.session_ttl).min(user.expires_at),
            created_at: now,
        };
        self.store.create_session(&session).await?;

        tracing::info!(trial_user = %user.id, session_id = %session.id, "trial session started");
        Ok((session, user))
    }

    /// Check both hops of a trial session.
    ///
    /// An expired session row is deleted as a side effect.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown session or a dangling token,
    /// `Expired`/`Inactive` if either hop is no longer usable, `Backend` if a
    /// lookup fails.
    pub async fn validate_trial_session(
        &self,
        session_id: Uuid,
    ) -> Result<(TrialSession, TrialUser), TrialError> {
        let now = Utc::now();
        let session = self
            .store
            .find_session(session_id)
            .await?
            .ok_or(TrialError::NotFound)?;

        if session.is_expired_at(now) {
            if let Err(e) = self.store.delete_session(session_id).await {
                tracing::warn!(error = %e, session_id = %session_id, "failed to delete expired trial session");
            }
            return Err(TrialError::Expired);
        }

        let user = self
            .store
            .find_user(&session.token)
            .await?
            .ok_or(TrialError::NotFound)?;
        check_user(&user, now)?;

        Ok((session, user))
    }

    /// End a trial session. Unknown ids are not an error.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the delete fails.
    pub async fn end_trial_session(&self, session_id: Uuid) -> Result<(), TrialError> {
        if self.store.delete_session(session_id).await? {
            tracing::info!(session_id = %session_id, "trial session ended");
        }
        Ok(())
    }

    /// Provision a trial user with a freshly generated token.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the insert fails.
    pub async fn create_trial_user(
        &self,
        name: Option<String>,
        email: Option<Email>,
        valid_for: Duration,
    ) -> Result<TrialUser, TrialError> {
        let user = self
            .store
            .create_user(NewTrialUser {
                token: generate_trial_token(),
                name,
                email,
                expires_at: Utc::now() + valid_for,
            })
            .await?;

        tracing::info!(trial_user = %user.id, expires_at = %user.expires_at, "trial user created");
        Ok(user)
    }

    /// Deactivate a trial user. Its sessions fail their next check.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown token, `Backend` if the update fails.
    pub async fn revoke_trial_user(&self, token: &TrialToken) -> Result<(), TrialError> {
        match self.store.set_user_active(token, false).await {
            Ok(()) => {
                tracing::info!("trial user revoked");
                Ok(())
            }
            Err(RepositoryError::NotFound) => Err(TrialError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete every expired trial session.
    ///
    /// # Errors
    ///
    /// Returns `Backend` if the delete fails.
    pub async fn cleanup_expired_trial_sessions(&self) -> Result<u64, TrialError> {
        let removed = self.store.delete_expired_sessions(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "expired trial sessions cleaned up");
        }
        Ok(removed)
    }
}

fn check_user(user: &TrialUser, now: DateTime<Utc>) -> Result<(), TrialError> {
    if !user.is_active {
        return Err(TrialError::Inactive);
    }
    if now >= user.expires_at {
        return Err(TrialError::Expired);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBackend;

    fn setup() -> (MemoryBackend, TrialManager) {
        let backend = MemoryBackend::new();
        let manager = TrialManager::new(Arc::new(backend.clone()), Duration::hours(2));
        (backend, manager)
    }

    #[tokio::test]
    async fn test_start_and_validate_session() {
        let (_, manager) = setup();
        let user = manager
            .create_trial_user(Some("Dana".to_owned()), None, Duration::days(7))
            .await
            .unwrap();

        let (session, _) = manager.start_trial_session(&user.token).await.unwrap();
        let (_, found) = manager.validate_trial_session(session.id).await.unwrap();
        assert_eq!(found.display_name(), "Dana");
    }

    #[tokio::test]
    async fn test_session_is_capped_at_user_expiry() {
        let (_, manager) = setup();
        let user = manager
            .create_trial_user(None, None, Duration::minutes(30))
            .await
            .unwrap();

        let (session, _) = manager.start_trial_session(&user.token).await.unwrap();
        assert_eq!(session.expires_at, user.expires_at);
    }

    #[tokio::test]
    async fn test_expired_user_invalidates_unexpired_session() {
        let (backend, manager) = setup();
        let user = manager
            .create_trial_user(None, None, Duration::days(1))
            .await
            .unwrap();
        let (session, _) = manager.start_trial_session(&user.token).await.unwrap();

        backend.set_trial_expiry(&user.token, Utc::now() - Duration::seconds(1));
        assert!(matches!(
            manager.validate_trial_session(session.id).await,
            Err(TrialError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_revoked_user_is_rejected() {
        let (_, manager) = setup();
        let user = manager
            .create_trial_user(None, None, Duration::days(1))
            .await
            .unwrap();
        let (session, _) = manager.start_trial_session(&user.token).await.unwrap();

        manager.revoke_trial_user(&user.token).await.unwrap();
        assert!(matches!(
            manager.validate_trial_token(&user.token).await,
            Err(TrialError::Inactive)
        ));
        assert!(matches!(
            manager.validate_trial_session(session.id).await,
            Err(TrialError::Inactive)
        ));
    }

    #[tokio::test]
    async fn test_unknown_token_and_session() {
        let (_, manager) = setup();
        let token = TrialToken::parse("not-issued").unwrap();
        assert!(matches!(
            manager.validate_trial_token(&token).await,
            Err(TrialError::NotFound)
        ));
        assert!(matches!(
            manager.revoke_trial_user(&token).await,
            Err(TrialError::NotFound)
        ));
        assert!(matches!(
            manager.validate_trial_session(Uuid::new_v4()).await,
            Err(TrialError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_end_session_and_cleanup() {
        let (backend, manager) = setup();
        let user = manager
            .create_trial_user(None, None, Duration::days(1))
            .await
            .unwrap();
        let (first, _) = manager.start_trial_session(&user.token).await.unwrap();
        manager.start_trial_session(&user.token).await.unwrap();

        manager.end_trial_session(first.id).await.unwrap();
        manager.end_trial_session(first.id).await.unwrap();
        assert_eq!(backend.trial_session_count(), 1);
        assert_eq!(manager.cleanup_expired_trial_sessions().await.unwrap(), 0);
    }
}
