//! Session middleware configuration for admin.
//!
//! The cookie session carries the client half of an admin login (token and
//! email) and the trial keys. Payloads live server side in the tower-sessions
//! store; the cookie only holds the session id.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer, SessionStore};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::AdminConfig;

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "marigold_admin_session";

/// `PostgreSQL` store for cookie sessions (`tower_sessions.session`).
///
/// The table is created by `mg-cli migrate`, not at startup.
#[must_use]
pub fn postgres_session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
}

/// Create the session layer over any tower-sessions store.
///
/// The cookie lives as long as an admin session, is `SameSite=Strict`, and is
/// only marked `Secure` when the console is served over HTTPS.
#[must_use]
pub fn create_session_layer<S>(store: S, config: &AdminConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    let expiry = tower_sessions::cookie::time::Duration::seconds(
        config.sessions.admin_ttl.num_seconds(),
    );

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(expiry))
        .with_secure(config.secure_cookies())
        .with_same_site(tower_sessions::cookie::SameSite::Strict)
        .with_http_only(true)
        .with_path("/")
}
