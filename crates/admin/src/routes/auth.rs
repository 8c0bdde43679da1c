//! Login and logout.
//!
//! Login is two independent checks: the password against the credential
//! store, then the email against the admin allow-list. Only when both pass is
//! a session opened.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use marigold_core::Email;

use crate::error::clear_sentry_user;
use crate::services::AuthError;
use crate::state::AppState;

/// Login form data.
#[derive(Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct MessageQuery {
    pub error: Option<String>,
}

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<&'static str>,
}

/// Map an error code from the query string to the message shown on the form.
fn login_error_message(code: &str) -> &'static str {
    match code {
        "credentials" => "Invalid email or password.",
        "unauthorized" => "This account does not have admin access.",
        "unavailable" => "Sign-in is temporarily unavailable. Please try again.",
        _ => "Sign-in failed. Please try again.",
    }
}

/// Display the login page.
///
/// GET /login
pub async fn login_page(Query(query): Query<MessageQuery>) -> impl IntoResponse {
    LoginTemplate {
        error: query.error.as_deref().map(login_error_message),
    }
}

/// Handle login form submission.
///
/// POST /login
#[instrument(skip(state, session, form), fields(email = %form.email))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    let Ok(email) = Email::parse(&form.email) else {
        return Redirect::to("/login?error=credentials").into_response();
    };

    let password = SecretString::from(form.password);
    match sign_in(&state, &session, &email, &password).await {
        Ok(()) => Redirect::to("/").into_response(),
        Err(e) => {
            let code = match &e {
                AuthError::InvalidCredentials => "credentials",
                AuthError::NotAdmin | AuthError::Inactive => "unauthorized",
                e if e.is_backend_failure() => "unavailable",
                _ => "session",
            };
            if e.is_backend_failure() {
                tracing::error!(error = %e, "admin login failed");
            } else {
                tracing::info!(reason = %e, "admin login refused");
            }
            Redirect::to(&format!("/login?error={code}")).into_response()
        }
    }
}

async fn sign_in(
    state: &AppState,
    session: &Session,
    email: &Email,
    password: &SecretString,
) -> Result<(), AuthError> {
    state.passwords().verify(email, password).await?;
    state.sessions().authorize(email).await?;

    // A session this client already holds would otherwise outlive logout.
    if let Err(e) = state.sessions().sign_out(session).await {
        tracing::warn!(error = %e, "previous admin session not destroyed before re-login");
    }

    // New cookie id for the privileged session.
    session
        .cycle_id()
        .await
        .map_err(crate::services::auth::ClientStoreError::from)?;
    state.sessions().try_create_session(email, session).await?;
    Ok(())
}

/// Destroy the admin session and clear the client.
///
/// POST /logout
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Redirect {
    if let Err(e) = state.sessions().sign_out(&session).await {
        tracing::warn!(error = %e, "logout did not complete cleanly");
    }
    clear_sentry_user();
    Redirect::to("/login")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_error_messages() {
        assert_eq!(
            login_error_message("credentials"),
            "Invalid email or password."
        );
        assert_eq!(
            login_error_message("unauthorized"),
            "This account does not have admin access."
        );
        assert_eq!(
            login_error_message("bogus"),
            "Sign-in failed. Please try again."
        );
    }
}
