//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::{middleware::RequireAdmin, models::CurrentAdmin, state::AppState};

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserView {
    pub name: String,
    pub email: String,
    pub role: &'static str,
    pub is_super_admin: bool,
}

impl From<&CurrentAdmin> for AdminUserView {
    fn from(admin: &CurrentAdmin) -> Self {
        Self {
            name: admin.name.clone(),
            email: admin.email.to_string(),
            role: admin.role.as_str(),
            is_super_admin: admin.role.can_manage_admins(),
        }
    }
}

/// Allow-list summary shown to super admins.
#[derive(Debug, Clone, Default)]
pub struct TeamSummary {
    pub active: usize,
    pub inactive: usize,
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub session_expires_at: DateTime<Utc>,
    pub team: Option<TeamSummary>,
}

/// Dashboard page handler.
///
/// GET /
#[instrument(skip(admin, state))]
pub async fn index(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> DashboardTemplate {
    let team = if admin.role.can_manage_admins() {
        match state.backends().admins.list_all().await {
            Ok(users) => {
                let active = users.iter().filter(|u| u.is_active).count();
                Some(TeamSummary {
                    active,
                    inactive: users.len() - active,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load admin summary");
                None
            }
        }
    } else {
        None
    };

    DashboardTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/",
        session_expires_at: admin.session_expires_at,
        team,
    }
}
