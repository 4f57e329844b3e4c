//! Periodic background tasks. Both stop when the shutdown channel flips or
//! its sender is dropped.

use signcopy_library::LibraryStore;
use signcopy_replication::StagingCache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Evicts expired staging entries every `every`.
pub fn spawn_staging_cleanup(
    staging: Arc<StagingCache>,
    every: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let evicted = staging.cleanup_expired();
                    if evicted > 0 {
                        debug!(evicted, remaining = staging.len(), "Staging cleanup");
                    }
                }
                _ = stop.changed() => break,
            }
        }
        debug!("Staging cleanup worker stopped");
    })
}

/// Flushes the library every `every` when it has unsaved changes. Disk
/// writes run on the blocking pool.
pub fn spawn_auto_save(
    store: Arc<LibraryStore>,
    every: Duration,
    mut stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if !store.is_dirty() {
                        continue;
                    }
                    let store = Arc::clone(&store);
                    match tokio::task::spawn_blocking(move || store.flush()).await {
                        Ok(Ok(())) => debug!("Auto-saved sign libraries"),
                        Ok(Err(e)) => warn!("Auto-save of sign libraries failed: {}", e),
                        Err(e) => warn!("spawn_blocking panicked during auto-save: {}", e),
                    }
                }
                _ = stop.changed() => break,
            }
        }
        debug!("Auto-save worker stopped");
    })
}
