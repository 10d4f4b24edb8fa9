//! Session-tracking connector: startup, background loop and published state

use crate::config::ConnectorConfig;
use crate::error::Result;
use crate::platform::SessionManager;
use crate::poll::{run_poll_loop, spawn_dedicated, PollTimer, TokioTimer};
use crate::publish::StateCell;
use crate::shutdown::ShutdownSignal;
use crate::tracker::SessionTracker;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use tunewatch_core::{MediaPlayerState, MusicConnector};

/// [`MusicConnector`] that follows the OS's current media session
///
/// All OS work happens on a background task; `get_state` only loads the last
/// published snapshot. If the session manager cannot be acquired the
/// connector reports the default state for its whole lifetime.
pub struct SessionConnector {
    state: Arc<StateCell>,
}

impl SessionConnector {
    /// Start tracking on a dedicated thread.
    ///
    /// `request` acquires the platform session manager and may block.
    pub fn spawn<M, F>(request: F, config: ConnectorConfig, shutdown: ShutdownSignal) -> Self
    where
        M: SessionManager,
        F: FnOnce() -> Result<M> + Send + 'static,
    {
        let state = Arc::new(StateCell::new());
        let published = Arc::clone(&state);
        spawn_dedicated("media-session", move |runtime| {
            run_session_task(request, published, runtime, TokioTimer, config, shutdown)
        });
        Self { state }
    }

    /// Start tracking as a task on an existing runtime.
    pub fn spawn_on<M, F, T>(
        runtime: &Handle,
        request: F,
        timer: T,
        config: ConnectorConfig,
        shutdown: ShutdownSignal,
    ) -> (Self, JoinHandle<()>)
    where
        M: SessionManager,
        F: FnOnce() -> Result<M> + Send + 'static,
        T: PollTimer,
    {
        let state = Arc::new(StateCell::new());
        let task = runtime.spawn(run_session_task(
            request,
            Arc::clone(&state),
            runtime.clone(),
            timer,
            config,
            shutdown,
        ));
        (Self { state }, task)
    }
}

impl MusicConnector for SessionConnector {
    fn get_state(&self) -> MediaPlayerState {
        self.state.load()
    }
}

async fn run_session_task<M, F, T>(
    request: F,
    state: Arc<StateCell>,
    runtime: Handle,
    timer: T,
    config: ConnectorConfig,
    shutdown: ShutdownSignal,
) where
    M: SessionManager,
    F: FnOnce() -> Result<M> + Send + 'static,
    T: PollTimer,
{
    let manager = match tokio::task::spawn_blocking(request).await {
        Ok(Ok(manager)) => manager,
        Ok(Err(e)) => {
            warn!("Failed to initialize media session manager: {}", e);
            return;
        }
        Err(e) => {
            warn!("Media session manager request did not complete: {}", e);
            return;
        }
    };

    let tracker = Arc::new(SessionTracker::new(manager, Arc::clone(&state), runtime));
    let starting = Arc::clone(&tracker);
    match tokio::task::spawn_blocking(move || starting.start()).await {
        Ok(Ok(())) => debug!("Media session tracking started"),
        Ok(Err(e)) => {
            warn!("Failed to initialize media session tracking: {}", e);
            return;
        }
        Err(e) => {
            warn!("Media session tracking did not start: {}", e);
            return;
        }
    }

    run_poll_loop(tracker, &state, &timer, &config, &shutdown).await;
}
