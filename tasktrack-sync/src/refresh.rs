/// Periodic refresh
///
/// Re-runs [`Synchronizer::refresh_all`] on a fixed interval until the
/// supplied token is cancelled. The first refresh happens one interval after
/// spawning; callers that need data immediately refresh once themselves.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use tasktrack_sync::refresh::spawn_periodic_refresh;
/// use tokio_util::sync::CancellationToken;
/// # use tasktrack_sync::synchronizer::Synchronizer;
///
/// # async fn example(sync: Synchronizer) {
/// let shutdown = CancellationToken::new();
/// let handle = spawn_periodic_refresh(sync, Duration::from_secs(30), shutdown.clone());
///
/// // Later
/// shutdown.cancel();
/// handle.await.ok();
/// # }
/// ```

use crate::synchronizer::Synchronizer;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Spawns the refresh loop
///
/// A zero interval disables periodic refresh; the returned handle then
/// completes immediately.
pub fn spawn_periodic_refresh(
    sync: Synchronizer,
    every: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    if every.is_zero() {
        tracing::info!("Periodic refresh disabled");
        return tokio::spawn(async {});
    }

    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        tracing::info!(interval = ?every, "Periodic refresh started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let report = sync.refresh_all().await;
                    if report.is_offline() {
                        tracing::debug!("Periodic refresh found the server unreachable");
                    }
                }
            }
        }

        tracing::info!("Periodic refresh stopped");
    })
}
