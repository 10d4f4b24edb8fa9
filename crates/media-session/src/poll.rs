//! Background refresh loop shared by the polling connectors

use crate::config::ConnectorConfig;
use crate::publish::StateCell;
use crate::shutdown::ShutdownSignal;
use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{debug, warn};

/// Waits between two refreshes of the poll loop
#[async_trait]
pub trait PollTimer: Send + Sync + 'static {
    async fn sleep(&self, delay: Duration);
}

/// [`PollTimer`] backed by the tokio clock
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl PollTimer for TokioTimer {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[async_trait]
impl<T: PollTimer + ?Sized> PollTimer for Arc<T> {
    async fn sleep(&self, delay: Duration) {
        (**self).sleep(delay).await;
    }
}

/// One refresh of a connector's published state.
///
/// Runs on the blocking pool. Implementations absorb their own errors and
/// publish the default state instead.
pub trait Refresher: Send + Sync + 'static {
    fn refresh(&self);
}

/// Refresh, then sleep for the adaptive interval, until shutdown.
pub(crate) async fn run_poll_loop<R, T>(
    refresher: Arc<R>,
    state: &StateCell,
    timer: &T,
    config: &ConnectorConfig,
    shutdown: &ShutdownSignal,
) where
    R: Refresher + ?Sized,
    T: PollTimer + ?Sized,
{
    debug!("Media poll loop started");

    while !shutdown.is_requested() {
        let task = Arc::clone(&refresher);
        if let Err(e) = tokio::task::spawn_blocking(move || task.refresh()).await {
            warn!("Media refresh task failed: {}", e);
            state.reset();
        }

        if shutdown.is_requested() {
            break;
        }

        timer.sleep(config.poll_delay_for(state.is_playing())).await;
    }

    debug!("Media poll loop stopped");
}

/// Run `task` on its own thread with a single-threaded runtime.
///
/// The runtime handle is passed in so notification callbacks arriving on OS
/// threads can schedule work onto it.
pub(crate) fn spawn_dedicated<F, Fut>(name: &str, task: F)
where
    F: FnOnce(Handle) -> Fut + Send + 'static,
    Fut: Future<Output = ()>,
{
    let result = std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Failed to build media runtime: {}", e);
                    return;
                }
            };
            let handle = runtime.handle().clone();
            runtime.block_on(task(handle));
        });

    if let Err(e) = result {
        warn!("Failed to spawn {} thread: {}", name, e);
    }
}
