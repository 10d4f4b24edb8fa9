use serde::{Deserialize, Serialize};

/// Snapshot of what the host's media session reports as "now playing"
///
/// Values are published whole: a connector replaces its snapshot on every
/// refresh and never edits one that has been handed to a reader.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaPlayerState {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// URI or opaque locator for the artwork (never fetched here)
    #[serde(default)]
    pub album_art_url: Option<String>,
    #[serde(default)]
    pub is_playing: bool,
    #[serde(default)]
    pub position_seconds: f64,
    /// 0 means unknown or no track
    #[serde(default)]
    pub length_seconds: f64,
}

impl MediaPlayerState {
    /// True when nothing is known about the current media
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Human readable "artist - title" label, if a title is known
    pub fn display_label(&self) -> Option<String> {
        let title = self.title.as_deref()?;
        match self.artist.as_deref() {
            Some(artist) if !artist.is_empty() => Some(format!("{} - {}", artist, title)),
            _ => Some(title.to_string()),
        }
    }

    /// Playback progress in `0.0..=1.0`, `None` when the length is unknown
    pub fn progress(&self) -> Option<f64> {
        if self.length_seconds <= 0.0 {
            return None;
        }
        Some((self.position_seconds / self.length_seconds).clamp(0.0, 1.0))
    }
}

/// Format seconds as `m:ss` (or `h:mm:ss` past the hour)
pub fn format_timestamp(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds as u64
    } else {
        0
    };
    let (hours, minutes, secs) = (total / 3600, (total / 60) % 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_empty() {
        let state = MediaPlayerState::default();
        assert!(state.is_empty());
        assert_eq!(state.title, None);
        assert_eq!(state.artist, None);
        assert_eq!(state.album, None);
        assert_eq!(state.album_art_url, None);
        assert!(!state.is_playing);
        assert_eq!(state.position_seconds, 0.0);
        assert_eq!(state.length_seconds, 0.0);
        assert_eq!(state.progress(), None);
    }

    #[test]
    fn test_display_label() {
        let state = MediaPlayerState {
            title: Some("Time".to_string()),
            artist: Some("Pink Floyd".to_string()),
            ..Default::default()
        };
        assert_eq!(state.display_label().as_deref(), Some("Pink Floyd - Time"));

        let untitled = MediaPlayerState {
            artist: Some("Pink Floyd".to_string()),
            ..Default::default()
        };
        assert_eq!(untitled.display_label(), None);
    }

    #[test]
    fn test_progress_is_clamped() {
        let state = MediaPlayerState {
            position_seconds: 250.0,
            length_seconds: 200.0,
            ..Default::default()
        };
        assert_eq!(state.progress(), Some(1.0));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let state: MediaPlayerState =
            serde_json::from_str(r#"{"title":"Song A","artist":"Artist A","album":null}"#).unwrap();
        assert_eq!(state.title.as_deref(), Some("Song A"));
        assert!(!state.is_playing);
        assert_eq!(state.length_seconds, 0.0);
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(30.4), "0:30");
        assert_eq!(format_timestamp(200.0), "3:20");
        assert_eq!(format_timestamp(3725.0), "1:02:05");
        assert_eq!(format_timestamp(-4.0), "0:00");
    }
}
