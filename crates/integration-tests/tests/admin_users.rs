//! Super admin allow-list management over the real router.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use marigold_core::{AdminRole, Email};
use marigold_integration_tests::{TestApp, assert_redirect, body_text};

#[tokio::test]
async fn test_plain_admin_is_forbidden() {
    let app = TestApp::new();
    app.seed_admin("a@x.com", AdminRole::Admin).await;
    let mut client = app.client();
    client.login("a@x.com").await;

    let response = client.get("/admin-users").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .post_form("/admin-users", "email=b@x.com&name=B&role=admin")
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_anonymous_admin_users_redirects_to_login() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/admin-users").await;
    assert_redirect(&response, "/login");
}

#[tokio::test]
async fn test_super_admin_creates_admin_who_can_sign_in() {
    let app = TestApp::new();
    app.seed_admin("root@x.com", AdminRole::SuperAdmin).await;
    let mut root = app.client();
    root.login("root@x.com").await;

    let response = root
        .post_form(
            "/admin-users",
            "email=new@x.com&name=New+Admin&role=admin&password=a-long-initial-password",
        )
        .await;
    assert_redirect(&response, "/admin-users?success=created");

    let response = root.get("/admin-users").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_text(response).await;
    assert!(body.contains("new@x.com"));
    assert!(body.contains("New Admin"));

    let mut newcomer = app.client();
    let response = newcomer
        .post_form("/login", "email=new@x.com&password=a-long-initial-password")
        .await;
    assert_redirect(&response, "/");
}

#[tokio::test]
async fn test_duplicate_admin_is_reported() {
    let app = TestApp::new();
    app.seed_admin("root@x.com", AdminRole::SuperAdmin).await;
    let mut root = app.client();
    root.login("root@x.com").await;

    let response = root
        .post_form("/admin-users", "email=ROOT@x.com&name=Again&role=admin")
        .await;
    assert_redirect(&response, "/admin-users?error=exists");
}

#[tokio::test]
async fn test_super_admin_cannot_deactivate_self() {
    let app = TestApp::new();
    let email = app.seed_admin("root@x.com", AdminRole::SuperAdmin).await;
    let other = app.backend.seed_admin(
        &Email::parse("other@x.com").unwrap(),
        "Other",
        AdminRole::Admin,
    );
    let mut root = app.client();
    root.login("root@x.com").await;

    let me = app.state.admins().find_by_email(&email).await.unwrap();
    let response = root
        .post_form(&format!("/admin-users/{}/deactivate", me.id), "")
        .await;
    assert_redirect(&response, "/admin-users?error=self");

    let response = root
        .post_form(&format!("/admin-users/{}/deactivate", other.id), "")
        .await;
    assert_redirect(&response, "/admin-users?success=deactivated");
    let reloaded = app
        .state
        .admins()
        .find_by_email(&Email::parse("other@x.com").unwrap())
        .await
        .unwrap();
    assert!(!reloaded.is_active);
}

#[tokio::test]
async fn test_deactivating_unknown_admin_reports_not_found() {
    let app = TestApp::new();
    app.seed_admin("root@x.com", AdminRole::SuperAdmin).await;
    let mut root = app.client();
    root.login("root@x.com").await;

    let response = root.post_form("/admin-users/999/deactivate", "").await;
    assert_redirect(&response, "/admin-users?error=not_found");
}
