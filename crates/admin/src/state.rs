//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::services::{
    AdminManager, NotificationDispatcher, NotifyError, PasswordAuthenticator, SessionManager,
    TrialManager,
};
use crate::store::Backends;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// configuration, the storage backends and the services built over them.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AdminConfig,
    backends: Backends,
    sessions: SessionManager,
    passwords: PasswordAuthenticator,
    admins: AdminManager,
    trials: TrialManager,
    notifier: NotificationDispatcher,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Admin configuration
    /// * `backends` - Storage backends (`PostgreSQL` or in-memory)
    ///
    /// # Errors
    ///
    /// Returns an error if the notification client cannot be built.
    pub fn new(config: AdminConfig, backends: Backends) -> Result<Self, NotifyError> {
        let sessions = SessionManager::from_backends(&backends, config.sessions.admin_ttl);
        let passwords = PasswordAuthenticator::new(Arc::clone(&backends.credentials));
        let admins = AdminManager::new(Arc::clone(&backends.admins), passwords.clone());
        let trials = TrialManager::new(Arc::clone(&backends.trials), config.sessions.trial_ttl);
        let notifier = NotificationDispatcher::new(config.notify.as_ref())?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                backends,
                sessions,
                passwords,
                admins,
                trials,
                notifier,
            }),
        })
    }

    /// Get a reference to the admin configuration.
    #[must_use]
    pub fn config(&self) -> &AdminConfig {
        &self.inner.config
    }

    /// Get a reference to the storage backends.
    #[must_use]
    pub fn backends(&self) -> &Backends {
        &self.inner.backends
    }

    /// Get a reference to the admin session manager.
    #[must_use]
    pub fn sessions(&self) -> &SessionManager {
        &self.inner.sessions
    }

    /// Get a reference to the password collaborator.
    #[must_use]
    pub fn passwords(&self) -> &PasswordAuthenticator {
        &self.inner.passwords
    }

    /// Get a reference to the admin allow-list manager.
    #[must_use]
    pub fn admins(&self) -> &AdminManager {
        &self.inner.admins
    }

    /// Get a reference to the trial manager.
    #[must_use]
    pub fn trials(&self) -> &TrialManager {
        &self.inner.trials
    }

    /// Get a reference to the notification dispatcher.
    #[must_use]
    pub fn notifier(&self) -> &NotificationDispatcher {
        &self.inner.notifier
    }
}
