//! Lock-free publication of the current snapshot.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tunewatch_core::MediaPlayerState;

/// Single published [`MediaPlayerState`]
///
/// Writers swap in a whole new snapshot; readers take one atomic load. A
/// reader never waits on a writer and never sees fields from two snapshots.
#[derive(Debug)]
pub struct StateCell {
    current: ArcSwap<MediaPlayerState>,
}

impl StateCell {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(MediaPlayerState::default()),
        }
    }

    pub fn load(&self) -> MediaPlayerState {
        MediaPlayerState::clone(&self.current.load())
    }

    pub fn is_playing(&self) -> bool {
        self.current.load().is_playing
    }

    pub fn publish(&self, state: MediaPlayerState) {
        self.current.store(Arc::new(state));
    }

    pub fn reset(&self) {
        self.publish(MediaPlayerState::default());
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}
