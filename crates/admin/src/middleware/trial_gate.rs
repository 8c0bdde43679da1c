//! Gate for the trial/demo pages.
//!
//! Presence of a trial token in the client session is enough to render trial
//! pages. The token is checked against the backend once, when it is entered
//! on `POST /trial`; the gate itself never calls the backend.

use axum::{
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::models::session_keys;

/// Trial token as held by the client. Inserted by [`require_trial_token`].
#[derive(Debug, Clone)]
pub struct TrialPresence {
    pub token: String,
}

/// Middleware redirecting to `/trial` unless the client holds a trial token.
pub async fn require_trial_token(session: Session, mut request: Request, next: Next) -> Response {
    let token = match session.get::<String>(session_keys::TRIAL_TOKEN).await {
        Ok(token) => token.filter(|t| !t.trim().is_empty()),
        Err(e) => {
            tracing::warn!(error = %e, "could not read trial token from session");
            None
        }
    };

    let Some(token) = token else {
        return Redirect::to("/trial").into_response();
    };

    request.extensions_mut().insert(TrialPresence { token });
    next.run(request).await
}

impl<S> FromRequestParts<S> for TrialPresence
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| Redirect::to("/trial"))
    }
}
