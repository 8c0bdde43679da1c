//! JSON endpoints behind the route guard.

use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::middleware::RequireAdmin;

/// Response body for `GET /api/session`.
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub email: String,
    pub name: String,
    pub role: &'static str,
    pub expires_at: DateTime<Utc>,
}

/// Current admin and session expiry.
///
/// GET /api/session
pub async fn session_info(RequireAdmin(admin): RequireAdmin) -> Json<SessionInfo> {
    Json(SessionInfo {
        email: admin.email.into_inner(),
        name: admin.name,
        role: admin.role.as_str(),
        expires_at: admin.session_expires_at,
    })
}
