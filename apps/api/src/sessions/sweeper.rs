//! Background eviction of idle sessions.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::info;

use crate::sessions::SessionManager;

/// Spawns a task that calls [`SessionManager::sweep_expired`] every `interval`.
/// The task runs until the runtime shuts down or the handle is aborted.
pub fn spawn_sweeper(
    sessions: SessionManager,
    interval: Duration,
    max_idle: chrono::Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            let removed = sessions.sweep_expired(max_idle);
            if removed > 0 {
                info!(
                    removed,
                    remaining = sessions.len(),
                    "Evicted idle sessions"
                );
            }
        }
    })
}
