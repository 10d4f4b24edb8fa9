//! Cross-platform "now playing" connectors
//!
//! This crate reports what the host's media session subsystem is playing:
//! - Windows: System Media Transport Controls (SMTC), tracking the current
//!   session through its change notifications plus an adaptive poll
//! - Linux: MPRIS via D-Bus, polled
//! - Anything else: an always-empty dummy connector
//!
//! Every connector implements [`MusicConnector`]: `get_state` never blocks
//! and never fails, it returns the last published snapshot.

pub mod config;
pub mod connector;
pub mod dummy;
pub mod error;
pub mod platform;
pub mod poll;
pub mod publish;
pub mod shutdown;
mod tracker;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(test)]
mod test_utils;

pub use config::{Backend, ConnectorConfig};
pub use connector::SessionConnector;
pub use dummy::DummyConnector;
pub use error::SessionError;
pub use shutdown::ShutdownSignal;
pub use tunewatch_core::{MediaPlayerState, MusicConnector};

use tracing::info;

/// Create the connector for this platform
///
/// Falls back to [`DummyConnector`] when the platform has no supported media
/// session API or the config asks for it. Platform connectors start their
/// background work immediately and stop once `shutdown` is requested.
pub fn create_connector(config: &ConnectorConfig, shutdown: ShutdownSignal) -> Box<dyn MusicConnector> {
    if config.backend == Backend::Dummy {
        info!("Using dummy media connector (configured)");
        return Box::new(DummyConnector);
    }

    platform_connector(config, shutdown)
}

#[cfg(target_os = "windows")]
fn platform_connector(config: &ConnectorConfig, shutdown: ShutdownSignal) -> Box<dyn MusicConnector> {
    info!("Using Windows media session connector (SMTC)");
    Box::new(SessionConnector::spawn(
        windows::SmtcManager::request,
        config.clone(),
        shutdown,
    ))
}

#[cfg(target_os = "linux")]
fn platform_connector(config: &ConnectorConfig, shutdown: ShutdownSignal) -> Box<dyn MusicConnector> {
    info!("Using MPRIS media connector");
    Box::new(linux::MprisConnector::spawn(config.clone(), shutdown))
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn platform_connector(_config: &ConnectorConfig, _shutdown: ShutdownSignal) -> Box<dyn MusicConnector> {
    info!("No media session support on this platform, using dummy media connector");
    Box::new(DummyConnector)
}
