use serde::{Deserialize, Serialize};
use std::time::Duration;
use tunewatch_core::MediaPlayerState;

/// Which connector [`create_connector`](crate::create_connector) installs
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Platform connector when one exists, dummy otherwise
    #[default]
    Auto,
    /// Always the dummy connector
    Dummy,
}

/// Connector settings, usually the `[connector]` table of the app config
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorConfig {
    pub backend: Backend,
    /// Delay between refreshes while media is playing
    pub playing_interval_ms: u64,
    /// Delay between refreshes otherwise
    pub idle_interval_ms: u64,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Auto,
            playing_interval_ms: 500,
            idle_interval_ms: 2000,
        }
    }
}

impl ConnectorConfig {
    /// Delay before the next refresh, based on the last published state
    pub fn poll_delay(&self, state: &MediaPlayerState) -> Duration {
        self.poll_delay_for(state.is_playing)
    }

    pub fn poll_delay_for(&self, is_playing: bool) -> Duration {
        if is_playing {
            Duration::from_millis(self.playing_interval_ms)
        } else {
            Duration::from_millis(self.idle_interval_ms)
        }
    }
}
