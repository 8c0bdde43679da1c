//! Integration tests for Marigold.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p marigold-integration-tests
//! ```
//!
//! The tests drive the real admin router (route guard, trial gate, cookie
//! sessions, templates) in-process over the in-memory backend and a
//! `tower_sessions::MemoryStore`; no database or server is needed.
//!
//! # Test Categories
//!
//! - `admin_sessions` - Login, route guard, deactivation, logout
//! - `admin_users` - Super admin allow-list management
//! - `trial` - Trial token entry and the trial gate

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use secrecy::SecretString;
use tower::ServiceExt;
use url::Url;

use marigold_admin::config::AdminConfig;
use marigold_admin::state::AppState;
use marigold_admin::store::{Backends, memory::MemoryBackend};
use marigold_core::{AdminRole, Email};

/// Password given to every seeded admin.
pub const TEST_PASSWORD: &str = "correct-horse-battery-staple";

/// The admin router over a fresh in-memory backend.
pub struct TestApp {
    pub router: Router,
    pub backend: MemoryBackend,
    pub state: AppState,
}

impl TestApp {
    /// Build the router with default session settings.
    ///
    /// # Panics
    ///
    /// Panics if the application state cannot be built.
    #[must_use]
    pub fn new() -> Self {
        let backend = MemoryBackend::new();
        let base_url = Url::parse("http://localhost:3001/").expect("valid base url");
        let state = AppState::new(AdminConfig::in_memory(base_url), Backends::memory(&backend))
            .expect("state builds without notifications");
        let router = marigold_admin::app(state.clone(), tower_sessions::MemoryStore::default());

        Self {
            router,
            backend,
            state,
        }
    }

    /// Add an allow-listed admin with [`TEST_PASSWORD`].
    ///
    /// # Panics
    ///
    /// Panics if the email is invalid or the password cannot be stored.
    pub async fn seed_admin(&self, email: &str, role: AdminRole) -> Email {
        let email = Email::parse(email).expect("valid email");
        self.backend.seed_admin(&email, "Test Admin", role);
        self.set_password(&email).await;
        email
    }

    /// Store [`TEST_PASSWORD`] for an email without allow-listing it.
    ///
    /// # Panics
    ///
    /// Panics if the password cannot be stored.
    pub async fn set_password(&self, email: &Email) {
        self.state
            .passwords()
            .set_password(email, &SecretString::from(TEST_PASSWORD))
            .await
            .expect("password stored");
    }

    /// A client with an empty cookie jar.
    #[must_use]
    pub const fn client(&self) -> TestClient<'_> {
        TestClient {
            app: self,
            cookie: None,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Browser stand-in holding the session cookie between requests.
pub struct TestClient<'a> {
    app: &'a TestApp,
    cookie: Option<String>,
}

impl TestClient<'_> {
    /// Send a GET request.
    pub async fn get(&mut self, path: &str) -> Response<Body> {
        self.send(Request::get(path), Body::empty()).await
    }

    /// Send a url-encoded form POST.
    pub async fn post_form(&mut self, path: &str, form: &str) -> Response<Body> {
        let builder = Request::post(path).header(
            header::CONTENT_TYPE,
            "application/x-www-form-urlencoded",
        );
        self.send(builder, Body::from(form.to_owned())).await
    }

    /// Log in with [`TEST_PASSWORD`].
    pub async fn login(&mut self, email: &str) -> Response<Body> {
        self.post_form("/login", &format!("email={email}&password={TEST_PASSWORD}"))
            .await
    }

    /// Returns true if the client currently holds a session cookie.
    #[must_use]
    pub const fn has_cookie(&self) -> bool {
        self.cookie.is_some()
    }

    async fn send(&mut self, mut builder: axum::http::request::Builder, body: Body) -> Response<Body> {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let request = builder.body(body).expect("valid request");
        let response = self
            .app
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
        {
            if set_cookie.contains("Max-Age=0") {
                self.cookie = None;
            } else {
                self.cookie = set_cookie.split(';').next().map(str::to_owned);
            }
        }
        response
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &Response<Body>) -> Option<&str> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

/// Assert that `response` is a redirect to `to`.
///
/// # Panics
///
/// Panics if it is not.
pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), Some(to));
}

/// Read the whole body as UTF-8.
///
/// # Panics
///
/// Panics if the body cannot be read or is not UTF-8.
pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("readable body");
    String::from_utf8(bytes.to_vec()).expect("utf-8 body")
}
