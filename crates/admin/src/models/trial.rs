//! Trial/demo identities.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use marigold_core::{Email, TrialToken, TrialUserId};

/// An operator-provisioned trial identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialUser {
    pub id: TrialUserId,
    pub token: TrialToken,
    pub name: Option<String>,
    pub email: Option<Email>,
    pub is_active: bool,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TrialUser {
    /// Returns true if the trial may be used at `now`.
    #[must_use]
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && now < self.expires_at
    }

    /// Name to greet the visitor with.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Guest")
    }
}

/// Fields for provisioning a trial user.
#[derive(Debug, Clone)]
pub struct NewTrialUser {
    pub token: TrialToken,
    pub name: Option<String>,
    pub email: Option<Email>,
    pub expires_at: DateTime<Utc>,
}

/// One visit opened with a trial token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialSession {
    pub id: Uuid,
    pub token: TrialToken,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl TrialSession {
    /// Returns true once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}
