//! Login, route guard and logout over the real router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use marigold_core::AdminRole;
use marigold_integration_tests::{TestApp, assert_redirect, body_text};

#[tokio::test]
async fn test_anonymous_dashboard_redirects_to_login() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/").await;
    assert_redirect(&response, "/login");
    assert_eq!(app.backend.call_count(), 0);
}

#[tokio::test]
async fn test_anonymous_api_request_is_unauthorized() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/api/session").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_then_deactivation_sends_admin_back_to_login() {
    let app = TestApp::new();
    let email = app.seed_admin("a@x.com", AdminRole::Admin).await;
    let mut client = app.client();

    let response = client.login("a@x.com").await;
    assert_redirect(&response, "/");
    assert_eq!(app.backend.session_count(), 1);

    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("a@x.com"));

    app.backend.set_admin_active(&email, false);

    let response = client.get("/").await;
    assert_redirect(&response, "/login");
    assert_eq!(app.backend.session_count(), 0);
}

#[tokio::test]
async fn test_session_api_returns_current_admin() {
    let app = TestApp::new();
    app.seed_admin("ops@x.com", AdminRole::SuperAdmin).await;
    let mut client = app.client();
    client.login("ops@x.com").await;

    let response = client.get("/api/session").await;
    assert_eq!(response.status(), StatusCode::OK);

    let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(json["email"], "ops@x.com");
    assert_eq!(json["role"], "super_admin");
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let app = TestApp::new();
    app.seed_admin("a@x.com", AdminRole::Admin).await;
    let mut client = app.client();

    let response = client
        .post_form("/login", "email=a@x.com&password=not-the-password")
        .await;
    assert_redirect(&response, "/login?error=credentials");
    assert_eq!(app.backend.session_count(), 0);
}

#[tokio::test]
async fn test_valid_password_without_allow_list_entry_is_refused() {
    let app = TestApp::new();
    let email = marigold_core::Email::parse("customer@x.com").unwrap();
    app.set_password(&email).await;
    let mut client = app.client();

    let response = client.login("customer@x.com").await;
    assert_redirect(&response, "/login?error=unauthorized");
    assert_eq!(app.backend.session_count(), 0);
}

#[tokio::test]
async fn test_logout_destroys_session() {
    let app = TestApp::new();
    app.seed_admin("a@x.com", AdminRole::Admin).await;
    let mut client = app.client();
    client.login("a@x.com").await;
    assert_eq!(app.backend.session_count(), 1);

    let response = client.post_form("/logout", "").await;
    assert_redirect(&response, "/login");
    assert_eq!(app.backend.session_count(), 0);

    let response = client.get("/").await;
    assert_redirect(&response, "/login");
}

#[tokio::test]
async fn test_second_login_replaces_previous_session() {
    let app = TestApp::new();
    app.seed_admin("a@x.com", AdminRole::Admin).await;
    let mut client = app.client();

    assert_redirect(&client.login("a@x.com").await, "/");
    assert_redirect(&client.login("a@x.com").await, "/");
    assert_eq!(app.backend.session_count(), 1);

    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);

    client.post_form("/logout", "").await;
    assert_eq!(app.backend.session_count(), 0);
}

#[tokio::test]
async fn test_backend_outage_fails_closed_and_keeps_session() {
    let app = TestApp::new();
    app.seed_admin("a@x.com", AdminRole::Admin).await;
    let mut client = app.client();
    client.login("a@x.com").await;

    app.backend.set_unavailable(true);
    let response = client.get("/").await;
    assert_redirect(&response, "/login");

    app.backend.set_unavailable(false);
    assert_eq!(app.backend.session_count(), 1);
    let response = client.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_reports_backend_outage() {
    let app = TestApp::new();
    let mut client = app.client();

    assert_eq!(client.get("/health").await.status(), StatusCode::OK);
    assert_eq!(client.get("/health/ready").await.status(), StatusCode::OK);

    app.backend.set_unavailable(true);
    assert_eq!(
        client.get("/health/ready").await.status(),
        StatusCode::SERVICE_UNAVAILABLE
    );
}
