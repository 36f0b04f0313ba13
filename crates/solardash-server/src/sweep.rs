//! Optional background sweep of expired sessions
//!
//! Lazy eviction on lookup is the default. The sweep only bounds memory when
//! many tokens are issued and never presented again.

use solardash_auth::SessionStore;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

/// Spawn a task that purges expired sessions every `every`
pub fn spawn_session_sweeper(sessions: SessionStore, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        // The first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                debug!("Swept {} expired sessions", purged);
            }
        }
    })
}
