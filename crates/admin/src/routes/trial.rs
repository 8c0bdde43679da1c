//! Trial/demo pages.
//!
//! A visitor enters an operator-issued trial token on `/trial`. The token is
//! validated once, a trial session is opened, and both are remembered in the
//! cookie session. The demo dashboard only needs the token to be present.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;
use uuid::Uuid;

use marigold_core::TrialToken;

use crate::{
    middleware::TrialPresence,
    models::session_keys,
    services::TrialError,
    state::AppState,
};

/// Trial token form data.
#[derive(Deserialize)]
pub struct TrialForm {
    pub token: String,
}

/// Query parameters for error display.
#[derive(Debug, Deserialize)]
pub struct TrialQuery {
    pub error: Option<String>,
}

/// Headline numbers on the demo dashboard.
#[derive(Debug, Clone)]
pub struct DemoMetrics {
    pub orders: String,
    pub revenue: String,
    pub customers: String,
    pub products: String,
}

/// One row of the demo recent-orders table.
#[derive(Debug, Clone)]
pub struct DemoOrderView {
    pub number: String,
    pub customer_name: String,
    pub total: String,
    pub status: &'static str,
}

/// Token entry page.
#[derive(Template, WebTemplate)]
#[template(path = "trial/landing.html")]
pub struct TrialLandingTemplate {
    pub error: Option<&'static str>,
}

/// Demo dashboard.
#[derive(Template, WebTemplate)]
#[template(path = "trial/dashboard.html")]
pub struct TrialDashboardTemplate {
    pub visitor_name: String,
    pub metrics: DemoMetrics,
    pub recent_orders: Vec<DemoOrderView>,
}

fn trial_error_message(code: &str) -> &'static str {
    match code {
        "invalid" => "That trial code is not valid.",
        "expired" => "That trial has ended.",
        "unavailable" => "Trials are temporarily unavailable. Please try again.",
        _ => "Something went wrong. Please try again.",
    }
}

fn trial_error_code(err: &TrialError) -> &'static str {
    match err {
        TrialError::InvalidToken(_) | TrialError::NotFound => "invalid",
        TrialError::Inactive | TrialError::Expired => "expired",
        TrialError::Backend(_) => "unavailable",
    }
}

fn demo_metrics() -> DemoMetrics {
    DemoMetrics {
        orders: "1,284".to_owned(),
        revenue: "$48,213.90".to_owned(),
        customers: "932".to_owned(),
        products: "57".to_owned(),
    }
}

fn demo_orders() -> Vec<DemoOrderView> {
    [
        ("#1042", "Ada Lovelace", "$86.00", "Fulfilled"),
        ("#1041", "Grace Hopper", "$142.50", "Unfulfilled"),
        ("#1040", "Alan Turing", "$39.99", "Fulfilled"),
        ("#1039", "Katherine Johnson", "$210.00", "Refunded"),
    ]
    .into_iter()
    .map(|(number, customer, total, status)| DemoOrderView {
        number: number.to_owned(),
        customer_name: customer.to_owned(),
        total: total.to_owned(),
        status,
    })
    .collect()
}

/// Token entry page.
///
/// GET /trial
pub async fn landing(Query(query): Query<TrialQuery>) -> TrialLandingTemplate {
    TrialLandingTemplate {
        error: query.error.as_deref().map(trial_error_message),
    }
}

/// Validate a trial token and open a trial session.
///
/// POST /trial
#[instrument(skip(state, session, form))]
pub async fn enter(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<TrialForm>,
) -> Response {
    let started = match TrialToken::parse(&form.token) {
        Ok(token) => state.trials().start_trial_session(&token).await,
        Err(e) => Err(TrialError::from(e)),
    };

    let (trial_session, _user) = match started {
        Ok(started) => started,
        Err(e) => {
            if matches!(e, TrialError::Backend(_)) {
                tracing::error!(error = %e, "trial sign-in failed");
            } else {
                tracing::info!(reason = %e, "trial token refused");
            }
            return Redirect::to(&format!("/trial?error={}", trial_error_code(&e))).into_response();
        }
    };

    let stored = async {
        session
            .insert(session_keys::TRIAL_TOKEN, trial_session.token.expose())
            .await?;
        session
            .insert(session_keys::TRIAL_SESSION_ID, trial_session.id.to_string())
            .await
    };
    if let Err(e) = stored.await {
        tracing::error!(error = %e, "failed to store trial session");
        if let Err(e) = state.trials().end_trial_session(trial_session.id).await {
            tracing::warn!(error = %e, "failed to roll back trial session");
        }
        return Redirect::to("/trial?error=unavailable").into_response();
    }

    Redirect::to("/trial/dashboard").into_response()
}

/// Demo dashboard with fabricated store data.
///
/// GET /trial/dashboard
#[instrument(skip_all)]
pub async fn dashboard(
    _presence: TrialPresence,
    State(state): State<AppState>,
    session: Session,
) -> TrialDashboardTemplate {
    let session_id = session
        .get::<String>(session_keys::TRIAL_SESSION_ID)
        .await
        .ok()
        .flatten()
        .and_then(|id| Uuid::parse_str(&id).ok());

    let visitor_name = match session_id {
        Some(id) => match state.trials().validate_trial_session(id).await {
            Ok((_, user)) => user.display_name().to_owned(),
            Err(e) => {
                tracing::debug!(reason = %e, "trial session not usable for greeting");
                "Guest".to_owned()
            }
        },
        None => "Guest".to_owned(),
    };

    TrialDashboardTemplate {
        visitor_name,
        metrics: demo_metrics(),
        recent_orders: demo_orders(),
    }
}

/// Leave the trial.
///
/// POST /trial/exit
#[instrument(skip(state, session))]
pub async fn exit(State(state): State<AppState>, session: Session) -> Redirect {
    let session_id = session
        .remove::<String>(session_keys::TRIAL_SESSION_ID)
        .await
        .ok()
        .flatten()
        .and_then(|id| Uuid::parse_str(&id).ok());

    if let Some(id) = session_id
        && let Err(e) = state.trials().end_trial_session(id).await
    {
        tracing::warn!(error = %e, "failed to end trial session");
    }
    if let Err(e) = session.remove::<String>(session_keys::TRIAL_TOKEN).await {
        tracing::warn!(error = %e, "failed to clear trial token");
    }

    Redirect::to("/trial")
}

#[cfg(test)]
mod tests {
    use super::*;
    use marigold_core::TokenError;

    #[test]
    fn test_malformed_token_reads_as_invalid() {
        let err = TrialError::from(TokenError::Empty);
        assert_eq!(trial_error_code(&err), "invalid");
        assert_eq!(trial_error_message("invalid"), "That trial code is not valid.");
    }

    #[test]
    fn test_demo_dashboard_has_orders() {
        assert_eq!(demo_orders().len(), 4);
        assert_eq!(demo_metrics().products, "57");
    }
}
