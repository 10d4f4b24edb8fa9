use crate::models::MediaPlayerState;
use std::sync::Arc;

/// Source of "now playing" information for one platform
///
/// Implementations do their OS work elsewhere (usually a background task) and
/// only hand out the last published snapshot here.
pub trait MusicConnector: Send + Sync {
    /// Most recently published snapshot.
    ///
    /// Callable from any thread at any time. Never blocks and never fails:
    /// when nothing is known (not initialized yet, no session, an error) this
    /// is the default state.
    fn get_state(&self) -> MediaPlayerState;
}

impl<T: MusicConnector + ?Sized> MusicConnector for Box<T> {
    fn get_state(&self) -> MediaPlayerState {
        (**self).get_state()
    }
}

impl<T: MusicConnector + ?Sized> MusicConnector for Arc<T> {
    fn get_state(&self) -> MediaPlayerState {
        (**self).get_state()
    }
}
