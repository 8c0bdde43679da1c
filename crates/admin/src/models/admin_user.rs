//! Admin allow-list domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use marigold_core::{AdminUserId, Email};

// Re-export AdminRole from core for convenience
pub use marigold_core::AdminRole;

/// An admin allow-list entry.
///
/// Only rows with `is_active = true` grant access to the console.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminUser {
    /// Row id.
    pub id: AdminUserId,
    /// Normalized email, unique across admins.
    pub email: Email,
    /// Display name.
    pub name: String,
    /// Permission level.
    pub role: AdminRole,
    /// Soft-deactivation flag.
    pub is_active: bool,
    /// Email of the super admin who created the row (`None` for CLI-created).
    pub created_by: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl AdminUser {
    /// Returns true if this admin may manage other admins.
    #[must_use]
    pub const fn is_super_admin(&self) -> bool {
        self.role.can_manage_admins()
    }
}

/// Fields required to add an admin to the allow-list.
#[derive(Debug, Clone)]
pub struct NewAdminUser {
    pub email: Email,
    pub name: String,
    pub role: AdminRole,
    pub created_by: Option<Email>,
}
