//! Route guard for admin pages.
//!
//! Runs before every protected handler. The handler only executes once the
//! guard has reached [`GuardState::Authorized`]; nothing protected is
//! rendered while the check is pending. [`require_admin`] runs the same
//! validate-then-authorize sequence as [`GuardState::resolve`] and matches on
//! its two outcomes directly.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::CurrentAdmin;
use crate::services::SessionManager;
use crate::services::auth::{AuthError, ClientStore};
use crate::state::AppState;

/// Where a guard evaluation stands.
#[derive(Debug)]
pub enum GuardState {
    /// Not evaluated yet.
    Pending,
    /// Session is live and its owner is an active admin.
    Authorized(CurrentAdmin),
    /// Access refused; the error says why.
    Denied(AuthError),
}

impl GuardState {
    /// Drive a pending guard to a final state. Final states are returned unchanged.
    pub async fn resolve(self, manager: &SessionManager, client: &dyn ClientStore) -> Self {
        match self {
            Self::Pending => match authorize_client(manager, client).await {
                Ok(admin) => Self::Authorized(admin),
                Err(e) => Self::Denied(e),
            },
            done => done,
        }
    }
}

/// The validate-then-authorize sequence.
///
/// An empty client store is refused without touching the backend. A session
/// that is live but belongs to someone who may no longer use it is destroyed.
async fn authorize_client(
    manager: &SessionManager,
    client: &dyn ClientStore,
) -> Result<CurrentAdmin, AuthError> {
    let credentials = client
        .load_credentials()
        .await?
        .ok_or(AuthError::MissingClientSession)?;

    let session = manager.check_session(&credentials.token).await?;

    let authorized = if session.admin_email == credentials.email {
        manager.authorize(&credentials.email).await
    } else {
        Err(AuthError::SessionOwnerMismatch)
    };

    match authorized {
        Ok(admin) => Ok(CurrentAdmin::new(&admin, &session)),
        Err(e) => {
            // An outage says nothing about the session itself; keep it.
            if !e.is_backend_failure() {
                if let Err(destroy) = manager.destroy_session(&credentials.token, client).await {
                    tracing::warn!(error = %destroy, "failed to destroy refused session");
                }
            }
            Err(e)
        }
    }
}

/// Middleware that lets a request through only for an authorized admin.
///
/// On success the [`CurrentAdmin`] is placed in the request extensions for
/// the [`RequireAdmin`](super::RequireAdmin) extractor. Denied HTML requests
/// are redirected to `/login`; denied `/api/` requests get 401.
pub async fn require_admin(
    State(state): State<AppState>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let manager = state.sessions();

    match authorize_client(manager, &session).await {
        Ok(admin) => {
            set_sentry_user(&admin);
            tracing::Span::current().record("admin_email", tracing::field::display(&admin.email));

            if state.config().sessions.opportunistic_cleanup {
                let manager = manager.clone();
                tokio::spawn(async move {
                    if let Err(e) = manager.cleanup_expired_sessions().await {
                        tracing::warn!(error = %e, "opportunistic session cleanup failed");
                    }
                });
            }

            request.extensions_mut().insert(admin);
            next.run(request).await
        }
        Err(e) => {
            if e.is_backend_failure() {
                tracing::error!(error = %e, path = %request.uri().path(), "admin guard failed closed");
            } else {
                tracing::info!(reason = %e, path = %request.uri().path(), "admin guard denied request");
            }
            deny(request.uri().path())
        }
    }
}

/// Redirect HTML requests to the login page; API requests get a bare 401.
pub(crate) fn deny(path: &str) -> Response {
    if path.starts_with("/api/") {
        StatusCode::UNAUTHORIZED.into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::services::auth::MemoryClientStore;
    use crate::store::Backends;
    use crate::store::memory::MemoryBackend;
    use marigold_core::{AdminRole, Email};

    fn setup() -> (MemoryBackend, SessionManager) {
        let backend = MemoryBackend::new();
        let manager =
            SessionManager::from_backends(&Backends::memory(&backend), Duration::hours(8));
        (backend, manager)
    }

    fn email(s: &str) -> Email {
        Email::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_empty_client_is_denied_without_backend_calls() {
        let (backend, manager) = setup();
        let client = MemoryClientStore::new();

        let state = GuardState::Pending.resolve(&manager, &client).await;
        assert!(matches!(
            state,
            GuardState::Denied(AuthError::MissingClientSession)
        ));
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_active_admin_is_authorized() {
        let (backend, manager) = setup();
        let admin = email("a@x.com");
        backend.seed_admin(&admin, "Ada", AdminRole::SuperAdmin);
        let client = MemoryClientStore::new();
        manager.create_session(&admin, &client).await.unwrap();

        match GuardState::Pending.resolve(&manager, &client).await {
            GuardState::Authorized(current) => {
                assert_eq!(current.email, admin);
                assert_eq!(current.role, AdminRole::SuperAdmin);
            }
            other => panic!("expected Authorized, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deactivation_denies_and_deletes_session() {
        let (backend, manager) = setup();
        let admin = email("a@x.com");
        backend.seed_admin(&admin, "Ada", AdminRole::Admin);
        let client = MemoryClientStore::new();
        let token = manager.create_session(&admin, &client).await.unwrap();

        backend.set_admin_active(&admin, false);

        let state = GuardState::Pending.resolve(&manager, &client).await;
        assert!(matches!(state, GuardState::Denied(AuthError::Inactive)));
        assert!(!backend.has_session(&crate::services::auth::TokenDigest::of(&token)));
        assert!(client.is_empty());
    }

    #[tokio::test]
    async fn test_session_for_non_admin_is_destroyed() {
        let (backend, manager) = setup();
        let client = MemoryClientStore::new();
        manager
            .create_session(&email("stranger@x.com"), &client)
            .await
            .unwrap();

        let state = GuardState::Pending.resolve(&manager, &client).await;
        assert!(matches!(state, GuardState::Denied(AuthError::NotAdmin)));
        assert_eq!(backend.session_count(), 0);
    }

    #[tokio::test]
    async fn test_owner_mismatch_is_denied() {
        let (backend, manager) = setup();
        let owner = email("a@x.com");
        let other = email("b@x.com");
        backend.seed_admin(&owner, "Ada", AdminRole::Admin);
        backend.seed_admin(&other, "Bob", AdminRole::SuperAdmin);
        let client = MemoryClientStore::new();
        let token = manager.create_session(&owner, &client).await.unwrap();

        client.put_raw(Some(token.expose()), Some(other.as_str()));

        let state = GuardState::Pending.resolve(&manager, &client).await;
        assert!(matches!(
            state,
            GuardState::Denied(AuthError::SessionOwnerMismatch)
        ));
        assert_eq!(backend.session_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_token_is_denied_without_destroy() {
        let (backend, manager) = setup();
        let admin = email("a@x.com");
        backend.seed_admin(&admin, "Ada", AdminRole::Admin);
        let client = MemoryClientStore::new();
        client.put_raw(Some("never-issued"), Some(admin.as_str()));

        let state = GuardState::Pending.resolve(&manager, &client).await;
        assert!(matches!(
            state,
            GuardState::Denied(AuthError::SessionNotFound)
        ));
        assert!(!client.is_empty());
    }

    #[tokio::test]
    async fn test_outage_fails_closed() {
        let (backend, manager) = setup();
        let admin = email("a@x.com");
        backend.seed_admin(&admin, "Ada", AdminRole::Admin);
        let client = MemoryClientStore::new();
        manager.create_session(&admin, &client).await.unwrap();

        backend.set_unavailable(true);
        let state = GuardState::Pending.resolve(&manager, &client).await;
        assert!(matches!(state, GuardState::Denied(AuthError::Backend(_))));
    }

    #[test]
    fn test_deny_response_depends_on_path() {
        assert_eq!(deny("/api/session").status(), StatusCode::UNAUTHORIZED);
        let redirect = deny("/admin-users");
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(redirect.headers().get("location").unwrap(), "/login");
    }
}
