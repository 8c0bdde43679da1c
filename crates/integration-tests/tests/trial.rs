//! Trial token entry and the trial gate over the real router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use chrono::Duration;

use marigold_integration_tests::{TestApp, assert_redirect, body_text};

#[tokio::test]
async fn test_trial_dashboard_without_token_redirects_to_trial() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/trial/dashboard").await;
    assert_redirect(&response, "/trial");
}

#[tokio::test]
async fn test_valid_trial_token_opens_demo_dashboard() {
    let app = TestApp::new();
    let user = app
        .state
        .trials()
        .create_trial_user(Some("Jane".to_owned()), None, Duration::days(7))
        .await
        .unwrap();
    let mut client = app.client();

    let response = client
        .post_form("/trial", &format!("token={}", user.token.expose()))
        .await;
    assert_redirect(&response, "/trial/dashboard");
    assert_eq!(app.backend.trial_session_count(), 1);

    let response = client.get("/trial/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Hi, Jane"));
    assert!(body.contains("sample data"));
}

#[tokio::test]
async fn test_unknown_trial_token_is_refused() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.post_form("/trial", "token=not-a-real-token").await;
    assert_redirect(&response, "/trial?error=invalid");

    let response = client.get("/trial/dashboard").await;
    assert_redirect(&response, "/trial");
}

#[tokio::test]
async fn test_expired_trial_user_is_refused() {
    let app = TestApp::new();
    let user = app
        .state
        .trials()
        .create_trial_user(None, None, Duration::days(1))
        .await
        .unwrap();
    app.backend
        .set_trial_expiry(&user.token, chrono::Utc::now() - Duration::seconds(1));
    let mut client = app.client();

    let response = client
        .post_form("/trial", &format!("token={}", user.token.expose()))
        .await;
    assert_redirect(&response, "/trial?error=expired");
}

#[tokio::test]
async fn test_gate_only_checks_token_presence() {
    let app = TestApp::new();
    let user = app
        .state
        .trials()
        .create_trial_user(Some("Jane".to_owned()), None, Duration::days(7))
        .await
        .unwrap();
    let mut client = app.client();
    client
        .post_form("/trial", &format!("token={}", user.token.expose()))
        .await;

    app.state.trials().revoke_trial_user(&user.token).await.unwrap();

    // Still rendered, but no longer personalised.
    let response = client.get("/trial/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("Hi, Guest"));
}

#[tokio::test]
async fn test_exit_ends_trial_session() {
    let app = TestApp::new();
    let user = app
        .state
        .trials()
        .create_trial_user(None, None, Duration::days(7))
        .await
        .unwrap();
    let mut client = app.client();
    client
        .post_form("/trial", &format!("token={}", user.token.expose()))
        .await;
    assert_eq!(app.backend.trial_session_count(), 1);

    let response = client.post_form("/trial/exit", "").await;
    assert_redirect(&response, "/trial");
    assert_eq!(app.backend.trial_session_count(), 0);

    let response = client.get("/trial/dashboard").await;
    assert_redirect(&response, "/trial");
}

#[tokio::test]
async fn test_trial_visitor_cannot_reach_admin_pages() {
    let app = TestApp::new();
    let user = app
        .state
        .trials()
        .create_trial_user(None, None, Duration::days(7))
        .await
        .unwrap();
    let mut client = app.client();
    client
        .post_form("/trial", &format!("token={}", user.token.expose()))
        .await;

    let response = client.get("/").await;
    assert_redirect(&response, "/login");
}
