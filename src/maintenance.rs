use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::state::SharedState;

/// Periodically drop blacklist rows for refresh tokens that have expired on
/// their own, and expired entries of an in-process token store.
pub fn spawn(
    state: SharedState,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        tracing::debug!("Maintenance task started");

        loop {
            tokio::select! {
                _ = ticker.tick() => run_once(&state).await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        tracing::debug!("Maintenance task stopped");
    })
}

pub async fn run_once(state: &SharedState) {
    match state.blacklist.purge_expired().await {
        Ok(0) => {}
        Ok(n) => tracing::info!("Purged {n} expired blacklist entries"),
        Err(e) => tracing::error!("Failed to purge blacklist: {e}"),
    }

    let evicted = state.token_store.purge_expired();
    if evicted > 0 {
        tracing::debug!("Evicted {evicted} expired token store entries");
    }
}
