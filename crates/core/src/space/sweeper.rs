//! Scheduled cleanup.
//!
//! Runs [`SpaceService::clean_expired_files`] over every space on a fixed
//! interval in a background tokio task. A sweep can also be forced through
//! the handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use super::service::SpaceService;

/// Sweeper configuration.
#[derive(Debug, Clone)]
pub struct SweeperConfig {
    /// Time between sweeps.
    pub interval: Duration,
    /// Run a sweep right after starting instead of waiting one interval.
    pub run_on_start: bool,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3600),
            run_on_start: false,
        }
    }
}

impl SweeperConfig {
    /// Sweep every `interval`.
    #[must_use]
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            ..Self::default()
        }
    }

    /// Sweep once immediately after starting.
    #[must_use]
    pub fn with_run_on_start(mut self, run_on_start: bool) -> Self {
        self.run_on_start = run_on_start;
        self
    }
}

/// Handle to control the sweeper task.
pub struct SweeperHandle {
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
    sweeps: Arc<AtomicU64>,
    join_handle: Option<tokio::task::JoinHandle<()>>,
}

impl SweeperHandle {
    /// Force a sweep now (non-blocking).
    pub fn trigger(&self) {
        self.notify.notify_one();
    }

    /// Number of sweeps finished so far, failed ones included.
    #[must_use]
    pub fn completed_sweeps(&self) -> u64 {
        self.sweeps.load(Ordering::SeqCst)
    }

    /// Whether the task has not been told to stop.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.shutdown.load(Ordering::SeqCst)
    }

    /// Stop the sweeper, waiting up to five seconds for a sweep in flight.
    pub async fn shutdown(mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_one();

        if let Some(handle) = self.join_handle.take() {
            match tokio::time::timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(())) => debug!("Cleanup sweeper stopped"),
                Ok(Err(e)) => warn!(error = %e, "Cleanup sweeper panicked"),
                Err(_) => warn!("Cleanup sweeper did not stop in time"),
            }
        }
    }
}

/// Spawn the sweeper on the current tokio runtime.
#[must_use]
pub fn spawn_sweeper(service: Arc<SpaceService>, config: SweeperConfig) -> SweeperHandle {
    let shutdown = Arc::new(AtomicBool::new(false));
    let notify = Arc::new(Notify::new());
    let sweeps = Arc::new(AtomicU64::new(0));

    info!(interval = ?config.interval, "Cleanup sweeper started");

    let join_handle = tokio::spawn(run_sweeper(
        service,
        config,
        Arc::clone(&shutdown),
        Arc::clone(&notify),
        Arc::clone(&sweeps),
    ));

    SweeperHandle {
        shutdown,
        notify,
        sweeps,
        join_handle: Some(join_handle),
    }
}

async fn run_sweeper(
    service: Arc<SpaceService>,
    config: SweeperConfig,
    shutdown: Arc<AtomicBool>,
    notify: Arc<Notify>,
    sweeps: Arc<AtomicU64>,
) {
    if config.run_on_start {
        sweep(&service, &sweeps).await;
    }

    loop {
        tokio::select! {
            () = tokio::time::sleep(config.interval) => {}
            () = notify.notified() => {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                debug!("Cleanup sweep triggered manually");
            }
        }

        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        sweep(&service, &sweeps).await;
    }

    info!("Cleanup sweeper stopped");
}

async fn sweep(service: &SpaceService, sweeps: &AtomicU64) {
    match service.clean_expired_files(None).await {
        Ok(result) if result.deleted_count > 0 || result.failed_count > 0 => {
            info!(
                deleted = result.deleted_count,
                failed = result.failed_count,
                "Scheduled cleanup removed expired files"
            );
        }
        Ok(_) => debug!("Scheduled cleanup found nothing to remove"),
        Err(e) => warn!(error = %e, "Scheduled cleanup failed"),
    }
    sweeps.fetch_add(1, Ordering::SeqCst);
}
