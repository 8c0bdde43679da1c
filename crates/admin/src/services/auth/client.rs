//! Client-held session credentials.
//!
//! The admin token and email live on the client side of the conversation.
//! [`ClientStore`] abstracts where: the HTTP app uses the tower-sessions
//! cookie session, tests use [`MemoryClientStore`].

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use thiserror::Error;
use tower_sessions::Session;

use marigold_core::{Email, SessionToken};

use crate::models::session_keys;

/// Token and email as held by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCredentials {
    pub token: SessionToken,
    pub email: Email,
}

/// The client-side store could not be read or written.
#[derive(Debug, Error)]
#[error("client session store error: {0}")]
pub struct ClientStoreError(pub String);

/// Where the current token and email are kept between requests.
///
/// Both values are written and cleared together; a store holding only one of
/// them reports no credentials.
#[async_trait]
pub trait ClientStore: Send + Sync {
    async fn store_credentials(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<(), ClientStoreError>;

    async fn load_credentials(&self) -> Result<Option<ClientCredentials>, ClientStoreError>;

    async fn clear_credentials(&self) -> Result<(), ClientStoreError>;
}

/// Turn the two raw stored strings into credentials; malformed values count as absent.
fn parse_credentials(token: Option<String>, email: Option<String>) -> Option<ClientCredentials> {
    let (token, email) = (token?, email?);
    match (SessionToken::parse(&token), Email::parse(&email)) {
        (Ok(token), Ok(email)) => Some(ClientCredentials { token, email }),
        _ => {
            tracing::warn!("discarding malformed admin credentials from client session");
            None
        }
    }
}

impl From<tower_sessions::session::Error> for ClientStoreError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self(err.to_string())
    }
}

#[async_trait]
impl ClientStore for Session {
    async fn store_credentials(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<(), ClientStoreError> {
        self.insert(
            session_keys::ADMIN_SESSION_TOKEN,
            credentials.token.expose(),
        )
        .await?;
        self.insert(session_keys::ADMIN_EMAIL, credentials.email.as_str())
            .await?;
        Ok(())
    }

    async fn load_credentials(&self) -> Result<Option<ClientCredentials>, ClientStoreError> {
        let token = self
            .get::<String>(session_keys::ADMIN_SESSION_TOKEN)
            .await?;
        let email = self.get::<String>(session_keys::ADMIN_EMAIL).await?;
        Ok(parse_credentials(token, email))
    }

    async fn clear_credentials(&self) -> Result<(), ClientStoreError> {
        self.remove::<String>(session_keys::ADMIN_SESSION_TOKEN)
            .await?;
        self.remove::<String>(session_keys::ADMIN_EMAIL).await?;
        Ok(())
    }
}

/// In-process client store for tests and tooling.
#[derive(Debug, Default)]
pub struct MemoryClientStore {
    slots: Mutex<(Option<String>, Option<String>)>,
}

impl MemoryClientStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store raw values as a client could, including half-populated state.
    pub fn put_raw(&self, token: Option<&str>, email: Option<&str>) {
        *self.slots.lock().unwrap_or_else(PoisonError::into_inner) =
            (token.map(str::to_owned), email.map(str::to_owned));
    }

    /// Returns true if neither value is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.0.is_none() && slots.1.is_none()
    }
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn store_credentials(
        &self,
        credentials: &ClientCredentials,
    ) -> Result<(), ClientStoreError> {
        self.put_raw(
            Some(credentials.token.expose()),
            Some(credentials.email.as_str()),
        );
        Ok(())
    }

    async fn load_credentials(&self) -> Result<Option<ClientCredentials>, ClientStoreError> {
        let (token, email) = self
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Ok(parse_credentials(token, email))
    }

    async fn clear_credentials(&self) -> Result<(), ClientStoreError> {
        self.put_raw(None, None);
        Ok(())
    }
}
