//! Periodic sweep of expired admin and trial sessions.
//!
//! Expiry is enforced at read time, so this only keeps the tables small.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{SessionManager, TrialManager};

/// Spawn a task that cleans up expired sessions every `every`.
///
/// The first sweep runs immediately. Failures are logged and the loop keeps
/// going; abort the returned handle to stop it.
pub fn spawn_session_janitor(
    sessions: SessionManager,
    trials: TrialManager,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            sweep(&sessions, &trials).await;
        }
    })
}

async fn sweep(sessions: &SessionManager, trials: &TrialManager) {
    if let Err(e) = sessions.cleanup_expired_sessions().await {
        tracing::warn!(error = %e, "admin session cleanup failed");
    }
    if let Err(e) = trials.cleanup_expired_trial_sessions().await {
        tracing::warn!(error = %e, "trial session cleanup failed");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::services::auth::{TokenDigest, generate_session_token};
    use crate::store::Backends;
    use crate::store::memory::MemoryBackend;
    use marigold_core::Email;

    #[tokio::test]
    async fn test_first_tick_sweeps_expired_sessions() {
        let backend = MemoryBackend::new();
        let backends = Backends::memory(&backend);
        let sessions = SessionManager::from_backends(&backends, chrono::Duration::hours(8));
        let trials = TrialManager::new(backends.trials.clone(), chrono::Duration::hours(2));
        backend.put_session(
            TokenDigest::of(&generate_session_token()),
            &Email::parse("a@x.com").unwrap(),
            Utc::now() - chrono::Duration::minutes(1),
        );

        let handle = spawn_session_janitor(sessions, trials, Duration::from_secs(3600));
        for _ in 0..100 {
            if backend.session_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert_eq!(backend.session_count(), 0);
    }
}
