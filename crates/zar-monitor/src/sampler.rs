//! The periodic sampler task.

use crate::monitor::SystemMonitor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Sampling cadence: every five minutes.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(300);

/// Spawn the background sampler. It records one sample immediately, then
/// one per interval, and exits when `shutdown` flips. The caller joins
/// the handle (with a deadline) during shutdown.
pub fn spawn_sampler(
    monitor: Arc<SystemMonitor>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SAMPLE_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => monitor.sample(),
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        tracing::debug!("sampler stopping");
                        break;
                    }
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sampler_stops_on_shutdown() {
        let monitor = Arc::new(SystemMonitor::new());
        let (tx, rx) = watch::channel(false);
        let handle = spawn_sampler(monitor, rx);
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("sampler joined in time")
            .unwrap();
    }
}
