//! Authentication extractors for admin handlers.
//!
//! The [`require_admin`](super::require_admin) guard does the actual session
//! check and leaves a [`CurrentAdmin`] in the request extensions; these
//! extractors pick it up.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};

use crate::models::CurrentAdmin;

use super::guard::deny;

/// Extractor that requires an authorized admin.
///
/// If the guard did not run or did not authorize the request, returns a
/// redirect to the login page for HTML requests, or 401 Unauthorized for API
/// requests.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub CurrentAdmin);

/// Error returned when admin authentication is required but missing.
pub struct AdminAuthRejection {
    path: String,
}

impl IntoResponse for AdminAuthRejection {
    fn into_response(self) -> Response {
        deny(&self.path)
    }
}

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AdminAuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAdmin>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AdminAuthRejection {
                path: parts.uri.path().to_owned(),
            })
    }
}

/// Extractor that requires super admin authentication.
///
/// If the admin is not authorized, behaves like [`RequireAdmin`].
/// If the admin is not a super admin, returns 403 Forbidden.
pub struct RequireSuperAdmin(pub CurrentAdmin);

/// Error returned when super admin authentication is required.
pub enum SuperAdminRejection {
    /// Not authorized at all.
    NotAdmin(AdminAuthRejection),
    /// Forbidden - user is admin but not super admin.
    Forbidden,
}

impl IntoResponse for SuperAdminRejection {
    fn into_response(self) -> Response {
        match self {
            Self::NotAdmin(rejection) => rejection.into_response(),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                "Only super admins can access this resource",
            )
                .into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = SuperAdminRejection;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireAdmin(admin) = RequireAdmin::from_request_parts(parts, state)
            .await
            .map_err(SuperAdminRejection::NotAdmin)?;

        if !admin.role.can_manage_admins() {
            tracing::info!(email = %admin.email, "super admin route refused");
            return Err(SuperAdminRejection::Forbidden);
        }

        Ok(Self(admin))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::Request;
    use chrono::Utc;

    use super::*;
    use marigold_core::{AdminRole, AdminUserId, Email};

    fn parts_with(admin: Option<CurrentAdmin>, path: &str) -> Parts {
        let mut request = Request::builder().uri(path).body(()).unwrap();
        if let Some(admin) = admin {
            request.extensions_mut().insert(admin);
        }
        request.into_parts().0
    }

    fn admin(role: AdminRole) -> CurrentAdmin {
        CurrentAdmin {
            id: AdminUserId::new(1),
            email: Email::parse("a@x.com").unwrap(),
            name: "Ada".to_owned(),
            role,
            session_expires_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_require_admin_reads_extension() {
        let mut parts = parts_with(Some(admin(AdminRole::Admin)), "/");
        let RequireAdmin(found) = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .ok()
            .unwrap();
        assert_eq!(found.name, "Ada");
    }

    #[tokio::test]
    async fn test_missing_extension_on_api_is_unauthorized() {
        let mut parts = parts_with(None, "/api/session");
        let rejection = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection.into_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_plain_admin_is_forbidden_from_super_admin_routes() {
        let mut parts = parts_with(Some(admin(AdminRole::Admin)), "/admin-users");
        let rejection = RequireSuperAdmin::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(rejection.into_response().status(), StatusCode::FORBIDDEN);

        let mut parts = parts_with(Some(admin(AdminRole::SuperAdmin)), "/admin-users");
        assert!(
            RequireSuperAdmin::from_request_parts(&mut parts, &())
                .await
                .is_ok()
        );
    }
}
