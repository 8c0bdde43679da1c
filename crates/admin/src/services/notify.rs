//! Fire-and-forget notifications.
//!
//! Email and SMS are sent by serverless functions living under
//! `NOTIFY_FUNCTIONS_URL`. Dispatch never blocks the caller and never fails
//! it: each call is spawned, and errors end up in the logs.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::ExposeSecret;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::config::NotifyConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from a single notification call.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The function answered with a non-success status.
    #[error("function returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The configuration cannot be turned into a client.
    #[error("invalid notification config: {0}")]
    Config(String),
}

/// Email notification payload.
#[derive(Debug, Clone, Serialize)]
pub struct EmailNotification {
    pub to: String,
    pub subject: String,
    pub message: String,
}

/// SMS notification payload.
#[derive(Debug, Clone, Serialize)]
pub struct SmsNotification {
    pub phone: String,
    pub message: String,
}

/// Sends notifications to the configured functions.
///
/// Cheap to clone. Without configuration every dispatch is a logged no-op.
#[derive(Clone)]
pub struct NotificationDispatcher {
    inner: Option<Arc<DispatcherInner>>,
}

struct DispatcherInner {
    client: reqwest::Client,
    email_url: Url,
    sms_url: Url,
}

impl NotificationDispatcher {
    /// Build a dispatcher, or a no-op one when `config` is `None`.
    ///
    /// # Errors
    ///
    /// Returns `NotifyError::Config` if the key is not a valid header value or
    /// the function URLs cannot be derived, `NotifyError::Http` if the client
    /// fails to build.
    pub fn new(config: Option<&NotifyConfig>) -> Result<Self, NotifyError> {
        let Some(config) = config else {
            return Ok(Self::disabled());
        };

        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", config.functions_key.expose_secret());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value)
                .map_err(|e| NotifyError::Config(format!("invalid functions key: {e}")))?,
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            inner: Some(Arc::new(DispatcherInner {
                client,
                email_url: function_url(&config.functions_url, "send-email")?,
                sms_url: function_url(&config.functions_url, "send-sms")?,
            })),
        })
    }

    /// A dispatcher that drops every notification.
    #[must_use]
    pub const fn disabled() -> Self {
        Self { inner: None }
    }

    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Queue an email. Returns immediately.
    pub fn send_email(&self, notification: EmailNotification) {
        let Some(inner) = self.inner.clone() else {
            tracing::debug!(to = %notification.to, "notifications not configured, email dropped");
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = inner.post(inner.email_url.clone(), &notification).await {
                tracing::warn!(error = %e, to = %notification.to, "email notification failed");
            }
        });
    }

    /// Queue an SMS. Returns immediately.
    pub fn send_sms(&self, notification: SmsNotification) {
        let Some(inner) = self.inner.clone() else {
            tracing::debug!("notifications not configured, sms dropped");
            return;
        };
        tokio::spawn(async move {
            if let Err(e) = inner.post(inner.sms_url.clone(), &notification).await {
                tracing::warn!(error = %e, "sms notification failed");
            }
        });
    }
}

impl DispatcherInner {
    async fn post<B: Serialize + Sync>(&self, url: Url, body: &B) -> Result<(), NotifyError> {
        let response = self.client.post(url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(NotifyError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}

/// Resolve a function name against the base URL, tolerating a missing trailing slash.
fn function_url(base: &Url, name: &str) -> Result<Url, NotifyError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    base.join(name)
        .map_err(|e| NotifyError::Config(format!("invalid function url: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    #[test]
    fn test_function_url_handles_trailing_slash() {
        let with = Url::parse("https://fn.shop.test/functions/v1/").unwrap();
        let without = Url::parse("https://fn.shop.test/functions/v1").unwrap();
        assert_eq!(
            function_url(&with, "send-email").unwrap().as_str(),
            "https://fn.shop.test/functions/v1/send-email"
        );
        assert_eq!(
            function_url(&without, "send-sms").unwrap().as_str(),
            "https://fn.shop.test/functions/v1/send-sms"
        );
    }

    #[test]
    fn test_unconfigured_dispatcher_is_disabled() {
        let dispatcher = NotificationDispatcher::new(None).unwrap();
        assert!(!dispatcher.is_enabled());
        // No runtime needed: nothing is spawned.
        dispatcher.send_email(EmailNotification {
            to: "a@x.com".to_owned(),
            subject: "hi".to_owned(),
            message: "hello".to_owned(),
        });
    }

    #[test]
    fn test_configured_dispatcher_is_enabled() {
        let config = NotifyConfig {
            functions_url: Url::parse("https://fn.shop.test/functions/v1").unwrap(),
            functions_key: SecretString::from("k9Vq2mZ7pL4xR8"),
        };
        assert!(NotificationDispatcher::new(Some(&config)).unwrap().is_enabled());
    }

    #[test]
    fn test_payloads_serialize_expected_fields() {
        let sms = serde_json::to_value(SmsNotification {
            phone: "+15550100".to_owned(),
            message: "code 1234".to_owned(),
        })
        .unwrap();
        assert_eq!(sms["phone"], "+15550100");
        assert_eq!(sms["message"], "code 1234");
    }
}
