//! In-memory implementation of every store seam.
//!
//! Used by the test suites and by `marigold-admin` when started with
//! `ADMIN_BACKEND=memory`. Besides the trait methods it exposes a few
//! inspection hooks: a backend call counter, an outage switch, and direct
//! row access for setting up expired fixtures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use marigold_core::{AdminRole, AdminUserId, Email, TrialToken, TrialUserId};

use super::{AdminDirectory, CredentialStore, SessionStore, TrialStore};
use crate::db::RepositoryError;
use crate::models::{
    AdminSession, AdminUser, NewAdminSession, NewAdminUser, NewTrialUser, SessionLookup,
    TrialSession, TrialUser,
};
use crate::services::auth::TokenDigest;

#[derive(Default)]
struct State {
    admins: Vec<AdminUser>,
    next_admin_id: i64,
    sessions: HashMap<TokenDigest, AdminSession>,
    passwords: HashMap<Email, String>,
    trial_users: HashMap<TrialToken, TrialUser>,
    next_trial_id: i64,
    trial_sessions: HashMap<Uuid, TrialSession>,
}

#[derive(Default)]
struct Inner {
    state: Mutex<State>,
    calls: AtomicUsize,
    unavailable: AtomicBool,
}

/// Shared in-memory backend. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Entry point for trait methods: counts the call and honours the outage switch.
    fn enter(&self) -> Result<MutexGuard<'_, State>, RepositoryError> {
        self.inner.calls.fetch_add(1, Ordering::SeqCst);
        if self.inner.unavailable.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "in-memory backend switched off".to_owned(),
            ));
        }
        Ok(self.state())
    }

    /// Number of trait calls made so far.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.calls.load(Ordering::SeqCst)
    }

    /// Make every trait call fail with `RepositoryError::Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Add an admin directly, bypassing the call counter.
    pub fn seed_admin(&self, email: &Email, name: &str, role: AdminRole) -> AdminUser {
        let mut state = self.state();
        insert_admin(
            &mut state,
            NewAdminUser {
                email: email.clone(),
                name: name.to_owned(),
                role,
                created_by: None,
            },
        )
    }

    /// Flip an admin's active flag directly, as an operator would.
    pub fn set_admin_active(&self, email: &Email, active: bool) {
        let mut state = self.state();
        if let Some(admin) = state.admins.iter_mut().find(|a| &a.email == email) {
            admin.is_active = active;
        }
    }

    /// Insert a session row directly, e.g. one that is already expired.
    pub fn put_session(&self, digest: TokenDigest, email: &Email, expires_at: DateTime<Utc>) {
        self.state().sessions.insert(
            digest,
            AdminSession {
                admin_email: email.clone(),
                expires_at,
                created_at: Utc::now(),
            },
        );
    }

    /// Returns true if a session row exists for `digest`.
    #[must_use]
    pub fn has_session(&self, digest: &TokenDigest) -> bool {
        self.state().sessions.contains_key(digest)
    }

    /// Number of session rows, live or expired.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.state().sessions.len()
    }

    /// Number of trial session rows.
    #[must_use]
    pub fn trial_session_count(&self) -> usize {
        self.state().trial_sessions.len()
    }

    /// Overwrite a trial user's expiry directly.
    pub fn set_trial_expiry(&self, token: &TrialToken, expires_at: DateTime<Utc>) {
        if let Some(user) = self.state().trial_users.get_mut(token) {
            user.expires_at = expires_at;
        }
    }
}

fn insert_admin(state: &mut State, new: NewAdminUser) -> AdminUser {
    state.next_admin_id += 1;
    let admin = AdminUser {
        id: AdminUserId::new(state.next_admin_id),
        email: new.email,
        name: new.name,
        role: new.role,
        is_active: true,
        created_by: new.created_by.map(Email::into_inner),
        created_at: Utc::now(),
    };
    state.admins.push(admin.clone());
    admin
}

#[async_trait]
impl SessionStore for MemoryBackend {
    async fn insert(&self, session: NewAdminSession) -> Result<AdminSession, RepositoryError> {
        let mut state = self.enter()?;
        if state.sessions.contains_key(&session.token_digest) {
            return Err(RepositoryError::Conflict(
                "session token collision".to_owned(),
            ));
        }
        let row = AdminSession {
            admin_email: session.admin_email,
            expires_at: session.expires_at,
            created_at: Utc::now(),
        };
        state.sessions.insert(session.token_digest, row.clone());
        Ok(row)
    }

    async fn lookup(
        &self,
        digest: &TokenDigest,
        now: DateTime<Utc>,
    ) -> Result<SessionLookup, RepositoryError> {
        let state = self.enter()?;
        Ok(match state.sessions.get(digest) {
            None => SessionLookup::Missing,
            Some(session) if session.is_expired_at(now) => SessionLookup::Expired,
            Some(session) => SessionLookup::Live(session.clone()),
        })
    }

    async fn delete(&self, digest: &TokenDigest) -> Result<bool, RepositoryError> {
        Ok(self.enter()?.sessions.remove(digest).is_some())
    }

    async fn delete_for_email(&self, email: &Email) -> Result<u64, RepositoryError> {
        let mut state = self.enter()?;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| &s.admin_email != email);
        Ok((before - state.sessions.len()) as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut state = self.enter()?;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - state.sessions.len()) as u64)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        self.enter().map(drop)
    }
}

#[async_trait]
impl AdminDirectory for MemoryBackend {
    async fn find_by_email(&self, email: &Email) -> Result<Option<AdminUser>, RepositoryError> {
        let state = self.enter()?;
        Ok(state.admins.iter().find(|a| &a.email == email).cloned())
    }

    async fn find_by_id(&self, id: AdminUserId) -> Result<Option<AdminUser>, RepositoryError> {
        let state = self.enter()?;
        Ok(state.admins.iter().find(|a| a.id == id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<AdminUser>, RepositoryError> {
        let state = self.enter()?;
        Ok(state.admins.iter().rev().cloned().collect())
    }

    async fn create(&self, new: NewAdminUser) -> Result<AdminUser, RepositoryError> {
        let mut state = self.enter()?;
        if state.admins.iter().any(|a| a.email == new.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }
        Ok(insert_admin(&mut state, new))
    }

    async fn set_active(
        &self,
        id: AdminUserId,
        active: bool,
    ) -> Result<AdminUser, RepositoryError> {
        let mut state = self.enter()?;
        let admin = state
            .admins
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        admin.is_active = active;
        Ok(admin.clone())
    }

    async fn delete(&self, id: AdminUserId) -> Result<bool, RepositoryError> {
        let mut state = self.enter()?;
        let before = state.admins.len();
        state.admins.retain(|a| a.id != id);
        Ok(state.admins.len() < before)
    }
}

#[async_trait]
impl CredentialStore for MemoryBackend {
    async fn password_hash(&self, email: &Email) -> Result<Option<String>, RepositoryError> {
        Ok(self.enter()?.passwords.get(email).cloned())
    }

    async fn set_password_hash(&self, email: &Email, hash: &str) -> Result<(), RepositoryError> {
        self.enter()?
            .passwords
            .insert(email.clone(), hash.to_owned());
        Ok(())
    }
}

#[async_trait]
impl TrialStore for MemoryBackend {
    async fn create_user(&self, new: NewTrialUser) -> Result<TrialUser, RepositoryError> {
        let mut state = self.enter()?;
        if state.trial_users.contains_key(&new.token) {
            return Err(RepositoryError::Conflict(
                "trial token already exists".to_owned(),
            ));
        }
        state.next_trial_id += 1;
        let user = TrialUser {
            id: TrialUserId::new(state.next_trial_id),
            token: new.token.clone(),
            name: new.name,
            email: new.email,
            is_active: true,
            expires_at: new.expires_at,
            created_at: Utc::now(),
        };
        state.trial_users.insert(new.token, user.clone());
        Ok(user)
    }

    async fn find_user(&self, token: &TrialToken) -> Result<Option<TrialUser>, RepositoryError> {
        Ok(self.enter()?.trial_users.get(token).cloned())
    }

    async fn set_user_active(
        &self,
        token: &TrialToken,
        active: bool,
    ) -> Result<(), RepositoryError> {
        let mut state = self.enter()?;
        let user = state
            .trial_users
            .get_mut(token)
            .ok_or(RepositoryError::NotFound)?;
        user.is_active = active;
        Ok(())
    }

    async fn create_session(&self, session: &TrialSession) -> Result<(), RepositoryError> {
        let mut state = self.enter()?;
        if !state.trial_users.contains_key(&session.token) {
            return Err(RepositoryError::Conflict(
                "trial session references unknown token".to_owned(),
            ));
        }
        state.trial_sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> Result<Option<TrialSession>, RepositoryError> {
        Ok(self.enter()?.trial_sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, RepositoryError> {
        Ok(self.enter()?.trial_sessions.remove(&id).is_some())
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, RepositoryError> {
        let mut state = self.enter()?;
        let before = state.trial_sessions.len();
        state.trial_sessions.retain(|_, s| !s.is_expired_at(now));
        Ok((before - state.trial_sessions.len()) as u64)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_lookup_classifies_expired_rows() {
        let backend = MemoryBackend::new();
        let now = Utc::now();
        let live = TokenDigest::from_hex("aa");
        let stale = TokenDigest::from_hex("bb");
        backend.put_session(live.clone(), &email("a@x.com"), now + Duration::hours(1));
        backend.put_session(stale.clone(), &email("a@x.com"), now - Duration::seconds(1));

        assert!(matches!(
            backend.lookup(&live, now).await.unwrap(),
            SessionLookup::Live(_)
        ));
        assert_eq!(
            backend.lookup(&stale, now).await.unwrap(),
            SessionLookup::Expired
        );
        assert_eq!(
            backend.lookup(&TokenDigest::from_hex("cc"), now).await.unwrap(),
            SessionLookup::Missing
        );
    }

    #[tokio::test]
    async fn test_outage_switch_fails_every_call() {
        let backend = MemoryBackend::new();
        backend.set_unavailable(true);
        assert!(matches!(
            backend.find_by_email(&email("a@x.com")).await,
            Err(RepositoryError::Unavailable(_))
        ));
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_admin_email_conflicts() {
        let backend = MemoryBackend::new();
        backend.seed_admin(&email("a@x.com"), "A", AdminRole::Admin);
        let err = backend
            .create(NewAdminUser {
                email: email("a@x.com"),
                name: "Again".to_owned(),
                role: AdminRole::Admin,
                created_by: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_delete_for_email_only_touches_owner() {
        let backend = MemoryBackend::new();
        let later = Utc::now() + Duration::hours(1);
        backend.put_session(TokenDigest::from_hex("01"), &email("a@x.com"), later);
        backend.put_session(TokenDigest::from_hex("02"), &email("a@x.com"), later);
        backend.put_session(TokenDigest::from_hex("03"), &email("b@x.com"), later);

        assert_eq!(backend.delete_for_email(&email("a@x.com")).await.unwrap(), 2);
        assert_eq!(backend.session_count(), 1);
    }
}
