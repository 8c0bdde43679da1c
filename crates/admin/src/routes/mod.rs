//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! # Public
//! GET  /health                          - Liveness probe
//! GET  /health/ready                    - Readiness probe (session store)
//! GET  /login                           - Login page
//! POST /login                           - Email + password login
//! POST /logout                          - Logout
//!
//! # Admin (route guard)
//! GET  /                                - Dashboard overview
//! GET  /api/session                     - Current admin as JSON
//!
//! # Admin Users (super admin only)
//! GET  /admin-users                     - List admin users
//! POST /admin-users                     - Create admin user
//! POST /admin-users/{id}/deactivate     - Soft-deactivate
//! POST /admin-users/{id}/activate       - Reactivate
//!
//! # Trial
//! GET  /trial                           - Trial token entry
//! POST /trial                           - Validate token, open trial session
//! POST /trial/exit                      - Leave the trial
//! GET  /trial/dashboard                 - Demo dashboard (trial gate)
//! ```

pub mod admin_users;
pub mod api;
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod trial;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{require_admin, require_trial_token};
use crate::state::AppState;

/// Routes reachable without a session.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/trial", get(trial::landing).post(trial::enter))
        .route("/trial/exit", post(trial::exit))
}

/// Create the admin user management routes router.
pub fn admin_user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin_users::index).post(admin_users::create))
        .route("/{id}/deactivate", post(admin_users::deactivate))
        .route("/{id}/activate", post(admin_users::activate))
}

/// Routes behind the admin route guard.
pub fn protected_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/api/session", get(api::session_info))
        .nest("/admin-users", admin_user_routes())
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ))
}

/// Routes behind the trial gate.
pub fn trial_routes() -> Router<AppState> {
    Router::new()
        .route("/trial/dashboard", get(trial::dashboard))
        .route_layer(axum::middleware::from_fn(require_trial_token))
}

/// Create all routes for the admin console.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(protected_routes(state))
        .merge(trial_routes())
}
