//! Storage seams for the auth subsystem.
//!
//! Every backend call the session manager, trial manager and admin routes
//! make goes through one of these traits. [`Backends::postgres`] wires the
//! sqlx repositories from [`crate::db`]; [`memory::MemoryBackend`] backs
//! tests and local demos.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use marigold_core::{AdminUserId, Email, TrialToken};

use crate::db::{
    AdminSessionRepository, AdminUserRepository, AuthUserRepository, RepositoryError,
    TrialRepository,
};
use crate::models::{
    AdminSession, AdminUser, NewAdminSession, NewAdminUser, NewTrialUser, SessionLookup,
    TrialSession, TrialUser,
};
use crate::services::auth::TokenDigest;

/// Admin session rows.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session.
    async fn insert(&self, session: NewAdminSession) -> Result<AdminSession, RepositoryError>;

    /// Look a session up, classifying it as live or expired relative to `now`.
    async fn lookup(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
    ) -> Result<SessionLookup, RepositoryError>;

    /// Delete one session. Returns false if no row matched.
    async fn delete(&self, digest: &TokenDigest) -> Result<bool, RepositoryError>;

    /// Delete every session owned by `email`.
    async fn delete_for_email(&self, email: &Email) -> Result<u64, RepositoryError>;

    /// Delete every session with `expires_at <= now`.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;

    /// Cheap connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// The admin allow-list.
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    /// Find an admin by email regardless of the active flag.
    async fn find_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError>;

    async fn find_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError>;

    /// All admins, newest first.
    async fn list_all(&self) -> Result<Vec<AdminUser>, RepositoryError>;

    /// Insert a new admin. Duplicate emails yield `RepositoryError::Conflict`.
    async fn create(&self, new: NewAdminUser) -> Result<AdminUser, RepositoryError>;

    /// Flip the soft-deactivation flag.
    async fn set_active(&self, id: AdminUserId, active: bool)
    -> Result<AdminUser, RepositoryError>;

    /// Remove an admin row outright. Returns false if no row matched.
    async fn delete(&self, id: AdminUserId) -> Result<bool, RepositoryError>;
}

/// Password hashes for the login collaborator.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn password_hash(&self, email: &Email) -> Result<Option<String>, RepositoryError>;

    /// Insert or replace the hash for `email`.
    async fn set_password_hash(&self, email: &Email, hash: &str) -> Result<(), RepositoryError>;
}

/// Trial users and trial sessions.
#[async_trait]
pub trait TrialStore: Send + Sync {
    async fn create_user(&self, new: NewTrialUser) -> Result<TrialUser, RepositoryError>;

    async fn find_user(&self, token: &TrialToken) -> Result<Option<TrialUser>, RepositoryError>;

    /// Returns `RepositoryError::NotFound` if no trial user has this token.
    async fn set_user_active(&self, token: &TrialToken, active: bool)
    -> Result<(), RepositoryError>;

    async fn create_session(&self, session: &TrialSession) -> Result<(), RepositoryError>;

    async fn find_session(&self, id: Uuid) -> Result<Option<TrialSession>, RepositoryError>;

    async fn delete_session(&self, id: Uuid) -> Result<bool, RepositoryError>;

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError>;
}

/// The set of stores the application runs against.
#[derive(Clone)]
pub struct Backends {
    pub sessions: Arc<dyn SessionStore>,
    pub admins: Arc<dyn AdminDirectory>,
    pub credentials: Arc<dyn CredentialStore>,
    pub trials: Arc<dyn TrialStore>,
}

impl Backends {
    /// Wire the `PostgreSQL` repositories.
    #[must_use]
    pub fn postgres(pool: &PgPool) -> Self {
        Self {
            sessions: Arc::new(AdminSessionRepository::new(pool.clone())),
            admins: Arc::new(AdminUserRepository::new(pool.clone())),
            credentials: Arc::new(AuthUserRepository::new(pool.clone())),
            trials: Arc::new(TrialRepository::new(pool.clone())),
        }
    }

    /// Wire a single in-memory backend behind every seam.
    #[must_use]
    pub fn memory(backend: &memory::MemoryBackend) -> Self {
        Self {
            sessions: Arc::new(backend.clone()),
            admins: Arc::new(backend.clone()),
            credentials: Arc::new(backend.clone()),
            trials: Arc::new(backend.clone()),
        }
    }
}
