//! Marigold Admin library.
//!
//! This crate provides the admin console as a library, allowing it to be
//! tested and reused by `mg-cli`.
//!
//! # Security
//!
//! Every page except login, health and the trial pages sits behind the
//! route guard in [`middleware::guard`]: a request is served only when the
//! cookie session holds a live admin session token and its owner is still
//! an active entry on the admin allow-list.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::create_session_layer;
use crate::state::AppState;

/// Build the admin console router over a cookie-session store.
///
/// Sentry layers are added by the binary; everything else a request needs
/// (routes, route guard, trial gate, cookie session and request span) is
/// wired here so tests can drive the same stack.
pub fn app<S>(state: AppState, store: S) -> Router
where
    S: tower_sessions::SessionStore + Clone,
{
    let session_layer = create_session_layer(store, state.config());

    routes::routes(&state)
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri().path(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                        admin_email = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}
