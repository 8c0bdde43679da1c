//! Password login collaborator.
//!
//! Answers "is this the right password for this email" and nothing else.
//! Admin authorization is a separate allow-list check in
//! [`SessionManager::authorize`](super::SessionManager::authorize).

use std::sync::{Arc, LazyLock};

use secrecy::SecretString;

use marigold_core::Email;

use super::AuthError;
use super::password::{hash_password, verify_password};
use crate::store::CredentialStore;

/// Hash checked for unknown emails so both outcomes pay the same argon2 cost.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    hash_password(&SecretString::from("marigold-unknown-account")).ok()
});

/// Verifies and sets login passwords.
#[derive(Clone)]
pub struct PasswordAuthenticator {
    credentials: Arc<dyn CredentialStore>,
}

impl PasswordAuthenticator {
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }

    /// Check `password` for `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a wrong
    /// password, `AuthError::Backend` if the credential store fails.
    pub async fn verify(&self, email: &Email, password: &SecretString) -> Result<(), AuthError> {
        let stored_hash = self.credentials.password_hash(email).await?;
        let known = stored_hash.is_some();

        // argon2 is deliberately slow; keep it off the async workers.
        let password = password.clone();
        let matches = tokio::task::spawn_blocking(move || match stored_hash {
            Some(hash) => verify_password(&password, &hash),
            None => {
                if let Some(dummy) = DUMMY_HASH.as_deref() {
                    let _ = verify_password(&password, dummy);
                }
                false
            }
        })
        .await
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;

        if matches {
            Ok(())
        } else if known {
            tracing::info!(email = %email, "login attempt with wrong password");
            Err(AuthError::InvalidCredentials)
        } else {
            tracing::info!(email = %email, "login attempt for unknown email");
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Hash `password` on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails.
    pub async fn hash(password: &SecretString) -> Result<String, AuthError> {
        let password = password.clone();
        tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| AuthError::PasswordHash(e.to_string()))?
    }

    /// Store an already computed hash for `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Backend` if the credential store fails.
    pub async fn store_hash(&self, email: &Email, hash: &str) -> Result<(), AuthError> {
        self.credentials.set_password_hash(email, hash).await?;
        tracing::info!(email = %email, "password updated");
        Ok(())
    }

    /// Set or replace the password for `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordHash` if hashing fails, `AuthError::Backend`
    /// if the credential store fails.
    pub async fn set_password(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<(), AuthError> {
        let hash = Self::hash(password).await?;
        self.store_hash(email, &hash).await
    }
}
