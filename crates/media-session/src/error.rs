//! Errors raised while talking to the OS media session subsystem
//!
//! None of these ever reach a [`MusicConnector`](tunewatch_core::MusicConnector)
//! caller: connectors log them and fall back to the default state.

use crate::platform::SessionEvent;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The session manager could not be acquired at startup
    #[error("media session manager unavailable: {0}")]
    ManagerUnavailable(String),

    /// A query against a bound session failed
    #[error("failed to query {what}: {reason}")]
    Query { what: &'static str, reason: String },

    /// Attaching a change handler failed
    #[error("failed to subscribe to {event:?}: {reason}")]
    Subscribe { event: SessionEvent, reason: String },

    /// No MPRIS player is present on the session bus
    #[error("no MPRIS media players found")]
    NoPlayer,

    /// `dbus-send` output did not have the expected shape
    #[error("failed to parse {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(target_os = "windows")]
    #[error("Windows Runtime error: {0}")]
    Windows(#[from] windows::core::Error),
}

impl SessionError {
    pub fn query(what: &'static str, reason: impl ToString) -> Self {
        Self::Query {
            what,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
