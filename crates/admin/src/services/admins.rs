//! Admin allow-list management.
//!
//! Shared by the super-admin pages and `mg-cli admin`.

use std::sync::Arc;

use secrecy::SecretString;
use thiserror::Error;

use marigold_core::{AdminUserId, Email};

use super::auth::{AuthError, PasswordAuthenticator};
use crate::db::RepositoryError;
use crate::models::{AdminUser, NewAdminUser};
use crate::store::AdminDirectory;

/// Errors from allow-list management.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("an admin with email {0} already exists")]
    AlreadyExists(Email),

    #[error("admin not found")]
    NotFound,

    /// Super admins may not lock themselves out.
    #[error("you cannot deactivate your own account")]
    SelfDeactivation,

    #[error(transparent)]
    Password(#[from] AuthError),

    #[error("admin backend error: {0}")]
    Backend(RepositoryError),
}

impl From<RepositoryError> for AdminError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Backend(other),
        }
    }
}

/// Creates, lists and (de)activates admins.
#[derive(Clone)]
pub struct AdminManager {
    admins: Arc<dyn AdminDirectory>,
    passwords: PasswordAuthenticator,
}

impl AdminManager {
    #[must_use]
    pub fn new(admins: Arc<dyn AdminDirectory>, passwords: PasswordAuthenticator) -> Self {
        Self { admins, passwords }
    }

    /// All admins, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::Backend` if the lookup fails.
    pub async fn list(&self) -> Result<Vec<AdminUser>, AdminError> {
        Ok(self.admins.list_all().await?)
    }

    /// Add an admin, optionally setting their login password.
    ///
    /// The password is hashed before the row is inserted. If the hash cannot
    /// be stored the new row is removed again, so a failed create can be
    /// retried.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::AlreadyExists` for a duplicate email,
    /// `AdminError::Password` if the password cannot be stored, or
    /// `AdminError::Backend` if the insert fails.
    #[tracing::instrument(skip(self, new, password), fields(email = %new.email, role = %new.role))]
    pub async fn create(
        &self,
        new: NewAdminUser,
        password: Option<&SecretString>,
    ) -> Result<AdminUser, AdminError> {
        let hash = match password {
            Some(password) => Some(PasswordAuthenticator::hash(password).await?),
            None => None,
        };

        let email = new.email.clone();
        let admin = match self.admins.create(new).await {
            Ok(admin) => admin,
            Err(RepositoryError::Conflict(_)) => return Err(AdminError::AlreadyExists(email)),
            Err(e) => return Err(e.into()),
        };

        if let Some(hash) = hash
            && let Err(e) = self.passwords.store_hash(&admin.email, &hash).await
        {
            match self.admins.delete(admin.id).await {
                Ok(_) => tracing::warn!(
                    id = %admin.id,
                    error = %e,
                    "password not stored; admin creation rolled back"
                ),
                Err(cleanup) => tracing::error!(
                    id = %admin.id,
                    error = %e,
                    cleanup_error = %cleanup,
                    "password not stored and admin row could not be removed"
                ),
            }
            return Err(e.into());
        }

        tracing::info!(id = %admin.id, "admin created");
        Ok(admin)
    }

    /// Activate or deactivate an admin.
    ///
    /// Deactivation does not touch existing sessions; the route guard refuses
    /// and deletes them on their next use.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::SelfDeactivation` if `actor` tries to deactivate
    /// their own account, `AdminError::NotFound` for an unknown id, or
    /// `AdminError::Backend` if the update fails.
    pub async fn set_active(
        &self,
        id: AdminUserId,
        active: bool,
        actor: Option<&Email>,
    ) -> Result<AdminUser, AdminError> {
        if !active && let Some(actor) = actor {
            let target = self
                .admins
                .find_by_id(id)
                .await?
                .ok_or(AdminError::NotFound)?;
            if &target.email == actor {
                return Err(AdminError::SelfDeactivation);
            }
        }

        let admin = self.admins.set_active(id, active).await?;
        tracing::info!(id = %admin.id, email = %admin.email, active, "admin active flag changed");
        Ok(admin)
    }

    /// Look an admin up by email, active or not.
    ///
    /// # Errors
    ///
    /// Returns `AdminError::NotFound` if there is no such admin.
    pub async fn find_by_email(&self, email: &Email) -> Result<AdminUser, AdminError> {
        self.admins
            .find_by_email(email)
            .await?
            .ok_or(AdminError::NotFound)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::CredentialStore;
    use crate::store::memory::MemoryBackend;
    use marigold_core::AdminRole;

    fn setup() -> (MemoryBackend, AdminManager) {
        let backend = MemoryBackend::new();
        let manager = AdminManager::new(
            Arc::new(backend.clone()),
            PasswordAuthenticator::new(Arc::new(backend.clone())),
        );
        (backend, manager)
    }

    fn new_admin(email: &str) -> NewAdminUser {
        NewAdminUser {
            email: Email::parse(email).unwrap(),
            name: "Ops".to_owned(),
            role: AdminRole::Admin,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_reported() {
        let (_, manager) = setup();
        manager.create(new_admin("ops@shop.test"), None).await.unwrap();
        assert!(matches!(
            manager.create(new_admin("OPS@shop.test"), None).await,
            Err(AdminError::AlreadyExists(_))
        ));
    }

    #[tokio::test]
    async fn test_super_admin_cannot_deactivate_self() {
        let (backend, manager) = setup();
        let me = Email::parse("root@shop.test").unwrap();
        let admin = backend.seed_admin(&me, "Root", AdminRole::SuperAdmin);

        assert!(matches!(
            manager.set_active(admin.id, false, Some(&me)).await,
            Err(AdminError::SelfDeactivation)
        ));
        // Reactivating yourself is harmless.
        assert!(manager.set_active(admin.id, true, Some(&me)).await.is_ok());
    }

    #[tokio::test]
    async fn test_deactivate_and_reactivate() {
        let (_, manager) = setup();
        let created = manager.create(new_admin("ops@shop.test"), None).await.unwrap();
        let actor = Email::parse("root@shop.test").unwrap();

        let off = manager.set_active(created.id, false, Some(&actor)).await.unwrap();
        assert!(!off.is_active);
        let on = manager.set_active(created.id, true, None).await.unwrap();
        assert!(on.is_active);
    }

    /// Credential store that refuses every write.
    struct BrokenCredentials;

    #[async_trait::async_trait]
    impl CredentialStore for BrokenCredentials {
        async fn password_hash(&self, _email: &Email) -> Result<Option<String>, RepositoryError> {
            Ok(None)
        }

        async fn set_password_hash(
            &self,
            _email: &Email,
            _hash: &str,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("down".to_owned()))
        }
    }

    #[tokio::test]
    async fn test_failed_password_store_rolls_back_admin_row() {
        let backend = MemoryBackend::new();
        let manager = AdminManager::new(
            Arc::new(backend.clone()),
            PasswordAuthenticator::new(Arc::new(BrokenCredentials)),
        );
        let password = SecretString::from("a-long-enough-password");

        let first = manager.create(new_admin("n@x.com"), Some(&password)).await;
        assert!(matches!(first, Err(AdminError::Password(AuthError::Backend(_)))));
        assert!(matches!(
            manager.find_by_email(&Email::parse("n@x.com").unwrap()).await,
            Err(AdminError::NotFound)
        ));

        // The retry is not blocked by a leftover row.
        let retry = manager.create(new_admin("n@x.com"), Some(&password)).await;
        assert!(matches!(retry, Err(AdminError::Password(_))));
        assert!(manager.create(new_admin("n@x.com"), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_with_password_allows_login() {
        let (_, manager) = setup();
        let password = SecretString::from("a-long-enough-password");
        let created = manager
            .create(new_admin("ops@shop.test"), Some(&password))
            .await
            .unwrap();

        assert!(manager.passwords.verify(&created.email, &password).await.is_ok());
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let (_, manager) = setup();
        assert!(matches!(
            manager.set_active(AdminUserId::new(99), true, None).await,
            Err(AdminError::NotFound)
        ));
    }
}
