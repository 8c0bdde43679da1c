//! Admin session types.
//!
//! [`AdminSession`] is the server-side row; [`CurrentAdmin`] is what the
//! route guard attaches to an authorized request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use marigold_core::{AdminUserId, Email};

use super::admin_user::{AdminRole, AdminUser};
use crate::services::auth::TokenDigest;

/// A persisted admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSession {
    /// Email of the admin that owns the session.
    pub admin_email: Email,
    /// The session is valid strictly before this instant.
    pub expires_at: DateTime<Utc>,
    /// When the session was opened.
    pub created_at: DateTime<Utc>,
}

impl AdminSession {
    /// Returns true once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Row to insert when opening a session.
#[derive(Debug, Clone)]
pub struct NewAdminSession {
    pub admin_email: Email,
    pub token_digest: TokenDigest,
    pub expires_at: DateTime<Utc>,
}

/// Result of looking a session up by token digest.
///
/// The store evaluates the `expires_at > now` predicate so expiry is decided
/// in exactly one place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionLookup {
    /// Row exists and is unexpired.
    Live(AdminSession),
    /// Row exists but has expired; the caller must delete it.
    Expired,
    /// No row for this digest.
    Missing,
}

/// Authorized admin identity attached to a request by the route guard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAdmin {
    pub id: AdminUserId,
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub session_expires_at: DateTime<Utc>,
}

impl CurrentAdmin {
    /// Build the request identity from an authorized admin and their session.
    #[must_use]
    pub fn new(admin: &AdminUser, session: &AdminSession) -> Self {
        Self {
            id: admin.id,
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role,
            session_expires_at: session.expires_at,
        }
    }
}

/// Client session keys.
///
/// The admin token and email are stored under two fixed names and are always
/// written and cleared together.
pub mod keys {
    /// Raw admin session token.
    pub const ADMIN_SESSION_TOKEN: &str = "admin_session_token";

    /// Email the admin token was issued to.
    pub const ADMIN_EMAIL: &str = "admin_email";

    /// Operator-issued trial token.
    pub const TRIAL_TOKEN: &str = "trial_token";

    /// Id of the trial session opened for the trial token.
    pub const TRIAL_SESSION_ID: &str = "trial_session_id";
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let session = AdminSession {
            admin_email: Email::parse("a@x.com").unwrap(),
            expires_at: now,
            created_at: now - Duration::hours(8),
        };
        assert!(session.is_expired_at(now));
        assert!(!session.is_expired_at(now - Duration::seconds(1)));
    }
}
