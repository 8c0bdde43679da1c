//! Admin authentication error types.

use thiserror::Error;

use super::client::ClientStoreError;
use crate::db::RepositoryError;

/// Why an admin request was not authorized.
///
/// Every variant is shown to the user the same way (redirect to login); the
/// distinction only exists for logs.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token/email pair in the client store.
    #[error("no admin credentials in client session")]
    MissingClientSession,

    /// Token does not match any session row.
    #[error("admin session not found")]
    SessionNotFound,

    /// Session row existed but had expired (and has been deleted).
    #[error("admin session expired")]
    SessionExpired,

    /// Session row belongs to a different email than the client claims.
    #[error("admin session owner does not match client email")]
    SessionOwnerMismatch,

    /// Email is not on the admin allow-list.
    #[error("not an admin")]
    NotAdmin,

    /// Email is on the allow-list but deactivated.
    #[error("admin account is inactive")]
    Inactive,

    /// Password check against the credential backend failed.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Email could not be parsed.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] marigold_core::EmailError),

    /// Password could not be hashed.
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// Client-side store failed.
    #[error(transparent)]
    ClientStore(#[from] ClientStoreError),

    /// Backend lookup or write failed.
    #[error("auth backend error: {0}")]
    Backend(#[from] RepositoryError),
}

impl AuthError {
    /// Returns true for infrastructure failures as opposed to authorization decisions.
    #[must_use]
    pub const fn is_backend_failure(&self) -> bool {
        matches!(
            self,
            Self::Backend(_) | Self::ClientStore(_) | Self::PasswordHash(_)
        )
    }
}
