//! Admin permission levels.

use serde::{Deserialize, Serialize};

/// Error returned when a role string is not recognized.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid admin role: {0} (expected admin or super_admin)")]
pub struct ParseRoleError(pub String);

/// Admin role stored on every allow-list row.
///
/// Only `super_admin` may manage other admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "admin_role", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    /// Store management access.
    Admin,
    /// Store management plus admin user management.
    SuperAdmin,
}

impl AdminRole {
    /// Returns true if this role may create and deactivate admins.
    #[must_use]
    pub const fn can_manage_admins(self) -> bool {
        matches!(self, Self::SuperAdmin)
    }

    /// Wire/database spelling of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::SuperAdmin => "super_admin",
        }
    }
}

impl std::fmt::Display for AdminRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "admin" => Ok(Self::Admin),
            "super_admin" => Ok(Self::SuperAdmin),
            other => Err(ParseRoleError(other.to_owned())),
        }
    }
}
