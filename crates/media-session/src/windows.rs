//! Windows media sessions via System Media Transport Controls (SMTC)
//!
//! Any application that integrates with SMTC (Spotify, browsers, the Media
//! Player app, ...) is visible here. Only the session Windows reports as
//! current is tracked.
//!
//! Requires Windows 10 version 1803 or later.

use crate::error::{Result, SessionError};
use crate::platform::{
    non_empty, EventHandler, MediaProperties, MediaSession, PlaybackStatus, SessionEvent,
    SessionManager, SubscriptionToken, TimelineProperties,
};
use std::time::Duration;
use tracing::debug;
use windows::{
    Foundation::{TimeSpan, TypedEventHandler},
    Media::Control::{
        GlobalSystemMediaTransportControlsSession,
        GlobalSystemMediaTransportControlsSessionManager,
        GlobalSystemMediaTransportControlsSessionPlaybackStatus,
    },
};

/// SMTC session manager handle, acquired once and held for the connector's lifetime
#[derive(Clone)]
pub struct SmtcManager {
    manager: GlobalSystemMediaTransportControlsSessionManager,
}

impl SmtcManager {
    /// Request the session manager (blocking call)
    pub fn request() -> Result<Self> {
        let manager = GlobalSystemMediaTransportControlsSessionManager::RequestAsync()
            .and_then(|operation| operation.get())
            .map_err(|e| SessionError::ManagerUnavailable(e.message().to_string()))?;
        Ok(Self { manager })
    }
}

impl SessionManager for SmtcManager {
    type Session = SmtcSession;

    fn current_session(&self) -> Result<Option<SmtcSession>> {
        // GetCurrentSession reports "no session" as an error
        match self.manager.GetCurrentSession() {
            Ok(session) => Ok(Some(SmtcSession { session })),
            Err(e) => {
                debug!("No current session: {}", e);
                Ok(None)
            }
        }
    }

    fn on_current_session_changed(&self, handler: EventHandler) -> Result<SubscriptionToken> {
        let token = self
            .manager
            .CurrentSessionChanged(&TypedEventHandler::new(move |_, _| {
                handler();
                Ok(())
            }))?;
        Ok(SubscriptionToken(token))
    }
}

/// One SMTC session
#[derive(Clone)]
pub struct SmtcSession {
    session: GlobalSystemMediaTransportControlsSession,
}

impl MediaSession for SmtcSession {
    fn source_app(&self) -> Option<String> {
        self.session
            .SourceAppUserModelId()
            .ok()
            .and_then(|id| non_empty(id.to_string_lossy()))
    }

    fn media_properties(&self) -> Result<MediaProperties> {
        let properties = self
            .session
            .TryGetMediaPropertiesAsync()
            .and_then(|operation| operation.get())
            .map_err(|e| SessionError::query("media properties", e.message()))?;

        // The thumbnail is a stream reference rather than a locator, so no
        // artwork reference is reported
        Ok(MediaProperties {
            title: non_empty(properties.Title()?.to_string_lossy()),
            artist: non_empty(properties.Artist()?.to_string_lossy()),
            album: non_empty(properties.AlbumTitle()?.to_string_lossy()),
            album_art_url: None,
        })
    }

    fn playback_status(&self) -> Result<PlaybackStatus> {
        let status = self
            .session
            .GetPlaybackInfo()
            .and_then(|info| info.PlaybackStatus())
            .map_err(|e| SessionError::query("playback info", e.message()))?;

        Ok(match status {
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Closed => PlaybackStatus::Closed,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Opened => PlaybackStatus::Opened,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Changing => PlaybackStatus::Changing,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Stopped => PlaybackStatus::Stopped,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Playing => PlaybackStatus::Playing,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Paused => PlaybackStatus::Paused,
            _ => PlaybackStatus::Unknown,
        })
    }

    fn timeline(&self) -> Result<TimelineProperties> {
        let timeline = self
            .session
            .GetTimelineProperties()
            .map_err(|e| SessionError::query("timeline properties", e.message()))?;

        Ok(TimelineProperties {
            position: time_span_to_duration(timeline.Position()?),
            end_time: time_span_to_duration(timeline.EndTime()?),
        })
    }

    fn subscribe(&self, event: SessionEvent, handler: EventHandler) -> Result<SubscriptionToken> {
        let token = match event {
            SessionEvent::MediaProperties => self
                .session
                .MediaPropertiesChanged(&TypedEventHandler::new(move |_, _| {
                    handler();
                    Ok(())
                })),
            SessionEvent::PlaybackInfo => self
                .session
                .PlaybackInfoChanged(&TypedEventHandler::new(move |_, _| {
                    handler();
                    Ok(())
                })),
            SessionEvent::Timeline => self
                .session
                .TimelinePropertiesChanged(&TypedEventHandler::new(move |_, _| {
                    handler();
                    Ok(())
                })),
        }
        .map_err(|e| SessionError::Subscribe {
            event,
            reason: e.message().to_string(),
        })?;

        Ok(SubscriptionToken(token))
    }

    fn unsubscribe(&self, event: SessionEvent, token: SubscriptionToken) -> Result<()> {
        match event {
            SessionEvent::MediaProperties => self.session.RemoveMediaPropertiesChanged(token.0)?,
            SessionEvent::PlaybackInfo => self.session.RemovePlaybackInfoChanged(token.0)?,
            SessionEvent::Timeline => self.session.RemoveTimelinePropertiesChanged(token.0)?,
        }
        Ok(())
    }
}

/// SMTC time spans count 100 ns ticks; negative spans clamp to zero
fn time_span_to_duration(span: TimeSpan) -> Duration {
    Duration::from_nanos((span.Duration.max(0) as u64).saturating_mul(100))
}
