//! OS media session surface used by the session-tracking connector
//!
//! The Windows backend implements these traits over SMTC. Tests implement
//! them in memory.

use crate::error::Result;
use std::time::Duration;

/// Callback invoked by the platform when something changed.
///
/// May run on any thread, including an OS delivery thread, so it must be cheap.
pub type EventHandler = Box<dyn Fn() + Send + Sync + 'static>;

/// Registration token returned by a subscription, needed to remove it again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionToken(pub i64);

/// Change notifications a media session can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    /// Title, artist, album or artwork changed
    MediaProperties,
    /// Transport state changed (playing, paused, ...)
    PlaybackInfo,
    /// Position or length changed
    Timeline,
}

impl SessionEvent {
    pub const ALL: [SessionEvent; 3] = [
        SessionEvent::MediaProperties,
        SessionEvent::PlaybackInfo,
        SessionEvent::Timeline,
    ];
}

/// Transport status as reported by the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackStatus {
    Closed,
    Opened,
    Changing,
    Stopped,
    Playing,
    Paused,
    Unknown,
}

impl PlaybackStatus {
    /// Only an exact `Playing` counts; buffering, paused, stopped and unknown
    /// all report as not playing.
    pub fn is_playing(self) -> bool {
        self == PlaybackStatus::Playing
    }
}

/// Track metadata from the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaProperties {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub album_art_url: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimelineProperties {
    pub position: Duration,
    pub end_time: Duration,
}

/// Handle to the OS media session manager
pub trait SessionManager: Send + Sync + 'static {
    type Session: MediaSession;

    /// The session the OS currently considers in focus, if any
    fn current_session(&self) -> Result<Option<Self::Session>>;

    /// Register a handler for "the current session changed"
    fn on_current_session_changed(&self, handler: EventHandler) -> Result<SubscriptionToken>;
}

/// Handle to one application's media session
///
/// Cloning must be cheap and yield a handle to the same OS session.
pub trait MediaSession: Clone + Send + Sync + 'static {
    /// Identifier of the application owning the session, for logging
    fn source_app(&self) -> Option<String> {
        None
    }

    fn media_properties(&self) -> Result<MediaProperties>;

    fn playback_status(&self) -> Result<PlaybackStatus>;

    fn timeline(&self) -> Result<TimelineProperties>;

    fn subscribe(&self, event: SessionEvent, handler: EventHandler) -> Result<SubscriptionToken>;

    fn unsubscribe(&self, event: SessionEvent, token: SubscriptionToken) -> Result<()>;
}

/// Treat empty strings from the platform as "not reported"
pub(crate) fn non_empty(value: impl Into<String>) -> Option<String> {
    let value = value.into();
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_playing_counts_as_playing() {
        assert!(PlaybackStatus::Playing.is_playing());
        for status in [
            PlaybackStatus::Closed,
            PlaybackStatus::Opened,
            PlaybackStatus::Changing,
            PlaybackStatus::Stopped,
            PlaybackStatus::Paused,
            PlaybackStatus::Unknown,
        ] {
            assert!(!status.is_playing(), "{:?} should not be playing", status);
        }
    }

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("Song A").as_deref(), Some("Song A"));
        assert_eq!(non_empty(""), None);
        assert_eq!(non_empty("   "), None);
    }
}
