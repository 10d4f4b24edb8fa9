use tunewatch_core::{MediaPlayerState, MusicConnector};

/// Connector for platforms (or configurations) without media session support
#[derive(Debug, Clone, Copy, Default)]
pub struct DummyConnector;

impl MusicConnector for DummyConnector {
    fn get_state(&self) -> MediaPlayerState {
        MediaPlayerState::default()
    }
}
