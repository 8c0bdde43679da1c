//! Admin session authorization.
//!
//! [`SessionManager`] owns the server-side half of an admin login: it opens
//! sessions for allow-listed admins, validates tokens presented by the
//! client, and tears sessions down. The client half (token and email) lives
//! in a [`ClientStore`].
//!
//! Every operation comes in two shapes. The `try_*`/`check_*`/`authorize`
//! primitives return `Result<_, AuthError>` so callers can log why access
//! was refused. The `bool`/`Option` wrappers collapse every failure,
//! including backend outages, into "not authorized".

mod client;
mod error;
mod login;
mod password;
mod token;

pub use client::{ClientCredentials, ClientStore, ClientStoreError, MemoryClientStore};
pub use error::AuthError;
pub use login::PasswordAuthenticator;
pub use password::{hash_password, verify_password};
pub use token::{TokenDigest, generate_session_token, generate_trial_token};

use std::sync::Arc;

use chrono::{Duration, Utc};

use marigold_core::{Email, SessionToken};

use crate::models::{AdminSession, AdminUser, NewAdminSession, SessionLookup};
use crate::store::{AdminDirectory, Backends, SessionStore};

/// Opens, validates and destroys admin sessions.
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    admins: Arc<dyn AdminDirectory>,
    ttl: Duration,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        admins: Arc<dyn AdminDirectory>,
        ttl: Duration,
    ) -> Self {
        Self {
            sessions,
            admins,
            ttl,
        }
    }

    /// Build a manager over the session and admin stores of `backends`.
    #[must_use]
    pub fn from_backends(backends: &Backends, ttl: Duration) -> Self {
        Self::new(
            Arc::clone(&backends.sessions),
            Arc::clone(&backends.admins),
            ttl,
        )
    }

    /// How long a new session lives.
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }

    // =========================================================================
    // Authorization
    // =========================================================================

    /// Look `email` up on the allow-list and require it to be active.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotAdmin` if there is no row, `AuthError::Inactive`
    /// if the row is deactivated, `AuthError::Backend` if the lookup fails.
    pub async fn authorize(&self, email: &Email) -> Result<AdminUser, AuthError> {
        match self.admins.find_by_email(email).await? {
            None => Err(AuthError::NotAdmin),
            Some(admin) if !admin.is_active => Err(AuthError::Inactive),
            Some(admin) => Ok(admin),
        }
    }

    /// Returns true if `email` is an active admin. Any failure reads as false.
    pub async fn is_admin(&self, email: &Email) -> bool {
        self.get_admin_user(email).await.is_some()
    }

    /// The active admin record for `email`, or `None`.
    pub async fn get_admin_user(&self, email: &Email) -> Option<AdminUser> {
        match self.authorize(email).await {
            Ok(admin) => Some(admin),
            Err(e) => {
                log_refusal(&e, "admin lookup refused");
                None
            }
        }
    }

    // =========================================================================
    // Session lifecycle
    // =========================================================================

    /// Open a session for `email` and write the credentials to `client`.
    ///
    /// The caller is expected to have authorized `email` already. If the
    /// client store cannot be written the new row is removed again, so a
    /// failed login never leaves an orphaned session behind.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` if the row cannot be inserted and
    /// `AuthError::ClientStore` if the client cannot be written.
    #[tracing::instrument(skip(self, client), fields(email = %email))]
    pub async fn try_create_session(
        &self,
        email: &Email,
        client: &dyn ClientStore,
    ) -> Result<(SessionToken, AdminSession), AuthError> {
        let token = generate_session_token();
        let digest = TokenDigest::of(&token);
        let session = self
            .sessions
            .insert(NewAdminSession {
                admin_email: email.clone(),
                token_digest: digest.clone(),
                expires_at: Utc::now() + self.ttl,
            })
            .await?;

        let credentials = ClientCredentials {
            token: token.clone(),
            email: email.clone(),
        };
        if let Err(e) = client.store_credentials(&credentials).await {
            if let Err(cleanup) = self.sessions.delete(&digest).await {
                tracing::warn!(error = %cleanup, "failed to remove session after client store error");
            }
            return Err(e.into());
        }

        tracing::info!(expires_at = %session.expires_at, "admin session opened");
        Ok((token, session))
    }

    /// Open a session for `email`, returning the token or `None` on any failure.
    pub async fn create_session(
        &self,
        email: &Email,
        client: &dyn ClientStore,
    ) -> Option<SessionToken> {
        match self.try_create_session(email, client).await {
            Ok((token, _)) => Some(token),
            Err(e) => {
                tracing::error!(error = %e, "could not open admin session");
                None
            }
        }
    }

    /// Resolve `token` to a live session.
    ///
    /// An expired row is deleted as a side effect.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SessionNotFound`, `AuthError::SessionExpired`, or
    /// `AuthError::Backend` if the lookup fails.
    pub async fn check_session(&self, token: &SessionToken) -> Result<AdminSession, AuthError> {
        let digest = TokenDigest::of(token);
        match self.sessions.lookup(&digest, Utc::now()).await? {
            SessionLookup::Live(session) => Ok(session),
            SessionLookup::Missing => Err(AuthError::SessionNotFound),
            SessionLookup::Expired => {
                if let Err(e) = self.sessions.delete(&digest).await {
                    tracing::warn!(error = %e, digest = ?digest, "failed to delete expired session");
                }
                Err(AuthError::SessionExpired)
            }
        }
    }

    /// Returns true if `token` names a live session. Any failure reads as false.
    pub async fn validate_session(&self, token: &SessionToken) -> bool {
        match self.check_session(token).await {
            Ok(_) => true,
            Err(e) => {
                log_refusal(&e, "session validation refused");
                false
            }
        }
    }

    /// Delete the session for `token` and clear `client`.
    ///
    /// Idempotent: an unknown token is not an error. The client is cleared
    /// even if the backend delete fails.
    ///
    /// # Errors
    ///
    /// Returns the first failure after attempting both steps.
    pub async fn destroy_session(
        &self,
        token: &SessionToken,
        client: &dyn ClientStore,
    ) -> Result<(), AuthError> {
        let deleted = self.sessions.delete(&TokenDigest::of(token)).await;
        let cleared = client.clear_credentials().await;

        if deleted? {
            tracing::info!("admin session destroyed");
        }
        cleared?;
        Ok(())
    }

    /// Sign the client out: destroy whatever session it holds and clear it.
    ///
    /// # Errors
    ///
    /// See [`Self::destroy_session`].
    pub async fn sign_out(&self, client: &dyn ClientStore) -> Result<(), AuthError> {
        match client.load_credentials().await? {
            Some(credentials) => self.destroy_session(&credentials.token, client).await,
            None => Ok(client.clear_credentials().await?),
        }
    }

    /// Revoke every session owned by `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` if the delete fails.
    pub async fn revoke_sessions_for(&self, email: &Email) -> Result<u64, AuthError> {
        let revoked = self.sessions.delete_for_email(email).await?;
        tracing::info!(email = %email, revoked, "admin sessions revoked");
        Ok(revoked)
    }

    /// Delete every expired session row.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` if the delete fails.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, AuthError> {
        let removed = self.sessions.delete_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "expired admin sessions cleaned up");
        }
        Ok(removed)
    }
}

/// Decisions are routine; infrastructure failures are not.
fn log_refusal(error: &AuthError, message: &str) {
    if error.is_backend_failure() {
        tracing::error!(error = %error, "{message}");
    } else {
        tracing::debug!(error = %error, "{message}");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryBackend;
    use marigold_core::AdminRole;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    fn setup() -> (MemoryBackend, SessionManager) {
        let backend = MemoryBackend::new();
        let manager =
            SessionManager::from_backends(&Backends::memory(&backend), Duration::hours(8));
        (backend, manager)
    }

    #[tokio::test]
    async fn test_authorize_requires_active_allow_list_row() {
        let (backend, manager) = setup();
        let admin = email("ops@shop.test");
        backend.seed_admin(&admin, "Ops", AdminRole::Admin);

        assert!(manager.is_admin(&admin).await);
        assert!(!manager.is_admin(&email("nobody@shop.test")).await);
        assert!(matches!(
            manager.authorize(&email("nobody@shop.test")).await,
            Err(AuthError::NotAdmin)
        ));

        backend.set_admin_active(&admin, false);
        assert!(!manager.is_admin(&admin).await);
        assert!(manager.get_admin_user(&admin).await.is_none());
        assert!(matches!(
            manager.authorize(&admin).await,
            Err(AuthError::Inactive)
        ));
    }

    #[tokio::test]
    async fn test_create_validate_destroy() {
        let (backend, manager) = setup();
        let admin = email("ops@shop.test");
        let client = MemoryClientStore::new();

        let token = manager.create_session(&admin, &client).await.unwrap();
        assert!(manager.validate_session(&token).await);
        assert_eq!(
            client.load_credentials().await.unwrap(),
            Some(ClientCredentials {
                token: token.clone(),
                email: admin.clone(),
            })
        );
        assert!(backend.has_session(&TokenDigest::of(&token)));

        manager.destroy_session(&token, &client).await.unwrap();
        assert!(!manager.validate_session(&token).await);
        assert!(client.is_empty());
        assert_eq!(backend.session_count(), 0);
    }

    #[tokio::test]
    async fn test_session_expires_after_ttl() {
        let (_, manager) = setup();
        let client = MemoryClientStore::new();
        let before = Utc::now();

        let (_, session) = manager
            .try_create_session(&email("ops@shop.test"), &client)
            .await
            .unwrap();

        let lifetime = session.expires_at - before;
        assert!(lifetime >= Duration::hours(8));
        assert!(lifetime < Duration::hours(8) + Duration::minutes(1));
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_deleted() {
        let (backend, manager) = setup();
        let token = generate_session_token();
        let digest = TokenDigest::of(&token);
        backend.put_session(
            digest.clone(),
            &email("ops@shop.test"),
            Utc::now() - Duration::seconds(1),
        );

        assert!(matches!(
            manager.check_session(&token).await,
            Err(AuthError::SessionExpired)
        ));
        assert!(!backend.has_session(&digest));
        assert!(!manager.validate_session(&token).await);
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let (_, manager) = setup();
        assert!(matches!(
            manager.check_session(&generate_session_token()).await,
            Err(AuthError::SessionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let (_, manager) = setup();
        let client = MemoryClientStore::new();
        let token = generate_session_token();

        manager.destroy_session(&token, &client).await.unwrap();
        manager.destroy_session(&token, &client).await.unwrap();
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_backend_outage_fails_closed() {
        let (backend, manager) = setup();
        let admin = email("ops@shop.test");
        backend.seed_admin(&admin, "Ops", AdminRole::Admin);
        let client = MemoryClientStore::new();
        let token = manager.create_session(&admin, &client).await.unwrap();

        backend.set_unavailable(true);
        assert!(!manager.is_admin(&admin).await);
        assert!(!manager.validate_session(&token).await);
        assert!(manager.create_session(&admin, &client).await.is_none());
        assert!(matches!(
            manager.check_session(&token).await,
            Err(AuthError::Backend(_))
        ));
    }

    #[tokio::test]
    async fn test_destroy_clears_client_even_when_backend_fails() {
        let (backend, manager) = setup();
        let client = MemoryClientStore::new();
        let token = manager
            .create_session(&email("ops@shop.test"), &client)
            .await
            .unwrap();

        backend.set_unavailable(true);
        assert!(manager.destroy_session(&token, &client).await.is_err());
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_sign_out_without_credentials_touches_no_backend() {
        let (backend, manager) = setup();
        let client = MemoryClientStore::new();
        client.put_raw(Some("tok_only"), None);

        manager.sign_out(&client).await.unwrap();
        assert!(client.is_empty());
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_expired_rows() {
        let (backend, manager) = setup();
        let owner = email("ops@shop.test");
        backend.put_session(
            TokenDigest::of(&generate_session_token()),
            &owner,
            Utc::now() - Duration::minutes(5),
        );
        backend.put_session(
            TokenDigest::of(&generate_session_token()),
            &owner,
            Utc::now() + Duration::hours(1),
        );

        assert_eq!(manager.cleanup_expired_sessions().await.unwrap(), 1);
        assert_eq!(backend.session_count(), 1);
    }

    #[tokio::test]
    async fn test_revoke_sessions_for_owner() {
        let (backend, manager) = setup();
        let owner = email("ops@shop.test");
        let other = email("other@shop.test");
        manager
            .create_session(&owner, &MemoryClientStore::new())
            .await
            .unwrap();
        manager
            .create_session(&owner, &MemoryClientStore::new())
            .await
            .unwrap();
        manager
            .create_session(&other, &MemoryClientStore::new())
            .await
            .unwrap();

        assert_eq!(manager.revoke_sessions_for(&owner).await.unwrap(), 2);
        assert_eq!(backend.session_count(), 1);
    }
}
