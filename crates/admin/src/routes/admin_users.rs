//! Admin users management route handlers (`super_admin` only).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use marigold_core::{AdminRole, AdminUserId, Email};

use super::dashboard::AdminUserView;
use crate::{
    error::AppError,
    middleware::RequireSuperAdmin,
    models::{AdminUser, NewAdminUser},
    services::{AdminError, EmailNotification},
    state::AppState,
};

/// Admin user view for templates.
#[derive(Debug, Clone)]
pub struct AdminUserListItem {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: &'static str,
    pub is_active: bool,
    pub is_self: bool,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl AdminUserListItem {
    fn new(user: &AdminUser, viewer: &Email) -> Self {
        Self {
            id: user.id.as_i64(),
            email: user.email.to_string(),
            name: user.name.clone(),
            role: user.role.as_str(),
            is_active: user.is_active,
            is_self: &user.email == viewer,
            created_by: user.created_by.clone().unwrap_or_else(|| "cli".to_owned()),
            created_at: user.created_at,
        }
    }
}

/// Query parameters for flash messages.
#[derive(Debug, Deserialize)]
pub struct FlashQuery {
    pub error: Option<String>,
    pub success: Option<String>,
}

/// New admin form data.
#[derive(Deserialize)]
pub struct CreateAdminForm {
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub password: String,
}

/// Admin users page template.
#[derive(Template, WebTemplate)]
#[template(path = "admin_users/index.html")]
pub struct AdminUsersIndexTemplate {
    pub admin_user: AdminUserView,
    pub current_path: &'static str,
    pub users: Vec<AdminUserListItem>,
    pub error: Option<&'static str>,
    pub success: Option<&'static str>,
}

fn error_message(code: &str) -> &'static str {
    match code {
        "email" => "Enter a valid email address.",
        "name" => "Name is required.",
        "role" => "Unknown role.",
        "exists" => "An admin with that email already exists.",
        "self" => "You cannot deactivate your own account.",
        "not_found" => "That admin no longer exists.",
        _ => "Something went wrong. Please try again.",
    }
}

fn success_message(code: &str) -> &'static str {
    match code {
        "created" => "Admin created.",
        "deactivated" => "Admin deactivated. Their sessions end on their next request.",
        "activated" => "Admin reactivated.",
        _ => "Done.",
    }
}

fn error_code(err: &AdminError) -> &'static str {
    match err {
        AdminError::AlreadyExists(_) => "exists",
        AdminError::SelfDeactivation => "self",
        AdminError::NotFound => "not_found",
        AdminError::Password(_) | AdminError::Backend(_) => "internal",
    }
}

fn redirect_with(kind: &str, code: &str) -> Response {
    Redirect::to(&format!("/admin-users?{kind}={code}")).into_response()
}

/// Admin users list page handler.
///
/// GET /admin-users
#[instrument(skip(admin, state))]
pub async fn index(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Query(query): Query<FlashQuery>,
) -> Result<AdminUsersIndexTemplate, AppError> {
    let users = state
        .admins()
        .list()
        .await?
        .iter()
        .map(|u| AdminUserListItem::new(u, &admin.email))
        .collect();

    Ok(AdminUsersIndexTemplate {
        admin_user: AdminUserView::from(&admin),
        current_path: "/admin-users",
        users,
        error: query.error.as_deref().map(error_message),
        success: query.success.as_deref().map(success_message),
    })
}

/// Create an admin.
///
/// POST /admin-users
#[instrument(skip(admin, state, form), fields(actor = %admin.email))]
pub async fn create(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Form(form): Form<CreateAdminForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return redirect_with("error", "email");
    };
    let name = form.name.trim();
    if name.is_empty() {
        return redirect_with("error", "name");
    }
    let Ok(role) = form.role.parse::<AdminRole>() else {
        return redirect_with("error", "role");
    };
    let password = (!form.password.is_empty()).then(|| SecretString::from(form.password));

    let new = NewAdminUser {
        email,
        name: name.to_owned(),
        role,
        created_by: Some(admin.email.clone()),
    };

    match state.admins().create(new, password.as_ref()).await {
        Ok(created) => {
            state.notifier().send_email(EmailNotification {
                to: created.email.to_string(),
                subject: "You have been added to the Marigold admin console".to_owned(),
                message: format!(
                    "Hi {},\n\n{} added you as {} on the Marigold admin console. Sign in at {}login.",
                    created.name,
                    admin.name,
                    created.role,
                    state.config().base_url,
                ),
            });
            redirect_with("success", "created")
        }
        Err(e) => {
            tracing::warn!(error = %e, "admin creation failed");
            redirect_with("error", error_code(&e))
        }
    }
}

/// Soft-deactivate an admin.
///
/// POST /admin-users/{id}/deactivate
#[instrument(skip(admin, state), fields(actor = %admin.email))]
pub async fn deactivate(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    set_active(&state, &admin.email, AdminUserId::new(id), false).await
}

/// Reactivate an admin.
///
/// POST /admin-users/{id}/activate
#[instrument(skip(admin, state), fields(actor = %admin.email))]
pub async fn activate(
    RequireSuperAdmin(admin): RequireSuperAdmin,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Response {
    set_active(&state, &admin.email, AdminUserId::new(id), true).await
}

async fn set_active(state: &AppState, actor: &Email, id: AdminUserId, active: bool) -> Response {
    match state.admins().set_active(id, active, Some(actor)).await {
        Ok(_) => redirect_with("success", if active { "activated" } else { "deactivated" }),
        Err(e) => {
            tracing::warn!(error = %e, id = %id, "admin activation change failed");
            redirect_with("error", error_code(&e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_round_trip_to_messages() {
        let code = error_code(&AdminError::SelfDeactivation);
        assert_eq!(error_message(code), "You cannot deactivate your own account.");
        assert_eq!(
            error_message(error_code(&AdminError::NotFound)),
            "That admin no longer exists."
        );
    }
}
