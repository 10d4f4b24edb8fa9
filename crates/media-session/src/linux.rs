//! Linux media sessions via MPRIS (Media Player Remote Interfacing Specification)
//!
//! This module queries D-Bus for MPRIS-compatible media players through
//! `dbus-send` and publishes the first suitable player's state on a poll.

use crate::config::ConnectorConfig;
use crate::error::{Result, SessionError};
use crate::platform::{non_empty, PlaybackStatus};
use crate::poll::{run_poll_loop, spawn_dedicated, Refresher, TokioTimer};
use crate::publish::StateCell;
use crate::shutdown::ShutdownSignal;
use std::collections::HashMap;
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, warn};
use tunewatch_core::{MediaPlayerState, MusicConnector};

const MPRIS_PREFIX: &str = "org.mpris.MediaPlayer2.";
const BROWSERS: [&str; 3] = ["firefox", "chrome", "chromium"];
const MICROS_PER_SECOND: f64 = 1_000_000.0;

/// [`MusicConnector`] backed by MPRIS players on the session bus
pub struct MprisConnector {
    state: Arc<StateCell>,
}

impl MprisConnector {
    /// Start polling on a dedicated thread
    pub fn spawn(config: ConnectorConfig, shutdown: ShutdownSignal) -> Self {
        let state = Arc::new(StateCell::new());
        let poller = Arc::new(MprisPoller::new(DbusSend, Arc::clone(&state)));
        let published = Arc::clone(&state);
        spawn_dedicated("mpris", move |_runtime| async move {
            run_poll_loop(poller, &published, &TokioTimer, &config, &shutdown).await;
        });
        Self { state }
    }
}

impl MusicConnector for MprisConnector {
    fn get_state(&self) -> MediaPlayerState {
        self.state.load()
    }
}

/// Raw access to the session bus. Both calls return `dbus-send` output.
pub(crate) trait MprisBus: Send + Sync + 'static {
    fn list_names(&self) -> Result<String>;

    fn get_property(&self, player: &str, property: &str) -> Result<String>;
}

/// [`MprisBus`] shelling out to `dbus-send`
struct DbusSend;

impl DbusSend {
    fn run(args: &[&str]) -> Result<String> {
        let output = Command::new("dbus-send")
            .arg("--session")
            .arg("--print-reply")
            .args(args)
            .output()?;

        if !output.status.success() {
            return Err(SessionError::query(
                "D-Bus",
                String::from_utf8_lossy(&output.stderr).trim(),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl MprisBus for DbusSend {
    fn list_names(&self) -> Result<String> {
        Self::run(&[
            "--dest=org.freedesktop.DBus",
            "/org/freedesktop/DBus",
            "org.freedesktop.DBus.ListNames",
        ])
    }

    fn get_property(&self, player: &str, property: &str) -> Result<String> {
        Self::run(&[
            &format!("--dest={}", player),
            "/org/mpris/MediaPlayer2",
            "org.freedesktop.DBus.Properties.Get",
            "string:org.mpris.MediaPlayer2.Player",
            &format!("string:{}", property),
        ])
    }
}

pub(crate) struct MprisPoller<B: MprisBus> {
    bus: B,
    state: Arc<StateCell>,
}

impl<B: MprisBus> MprisPoller<B> {
    pub(crate) fn new(bus: B, state: Arc<StateCell>) -> Self {
        Self { bus, state }
    }

    fn playback_status(&self, player: &str) -> Result<PlaybackStatus> {
        let output = self.bus.get_property(player, "PlaybackStatus")?;
        parse_variant_string(&output)
            .map(|status| parse_playback_status(&status))
            .ok_or_else(|| SessionError::Parse("PlaybackStatus".to_string()))
    }

    /// Pick the player to report: a playing one if any, otherwise the first
    /// (non-browser players sort first)
    fn active_player(&self) -> Result<String> {
        let players = parse_player_names(&self.bus.list_names()?);

        for player in &players {
            if let Ok(status) = self.playback_status(player) {
                if status.is_playing() {
                    debug!("Found playing player: {}", player);
                    return Ok(player.clone());
                }
            }
        }

        // No player is currently playing, use the first available (might be paused)
        players.into_iter().next().ok_or(SessionError::NoPlayer)
    }

    fn read_state(&self) -> Result<MediaPlayerState> {
        let player = self.active_player()?;
        let status = self.playback_status(&player)?;
        let mut metadata = parse_metadata(&self.bus.get_property(&player, "Metadata")?);

        // Position is optional in MPRIS and some players refuse to report it
        let position = self
            .bus
            .get_property(&player, "Position")
            .ok()
            .and_then(|output| parse_variant_i64(&output))
            .unwrap_or(0);

        // Usually int64, but some players send a double
        let length = metadata
            .get("mpris:length")
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|micros| micros.is_finite())
            .unwrap_or(0.0);

        let artist = metadata
            .remove("xesam:artist")
            .or_else(|| metadata.remove("xesam:albumArtist"));

        debug!("MPRIS state from {}: status={:?}, metadata={:?}", player, status, metadata);

        Ok(MediaPlayerState {
            title: metadata.remove("xesam:title").and_then(non_empty),
            artist: artist.and_then(non_empty),
            album: metadata.remove("xesam:album").and_then(non_empty),
            album_art_url: metadata.remove("mpris:artUrl").and_then(non_empty),
            is_playing: status.is_playing(),
            position_seconds: micros_to_seconds(position as f64),
            length_seconds: micros_to_seconds(length),
        })
    }
}

impl<B: MprisBus> Refresher for MprisPoller<B> {
    fn refresh(&self) {
        match self.read_state() {
            Ok(state) => self.state.publish(state),
            Err(SessionError::NoPlayer) => {
                debug!("No MPRIS player available");
                self.state.reset();
            }
            Err(e) => {
                warn!("Failed to update MPRIS status: {}", e);
                self.state.reset();
            }
        }
    }
}

fn micros_to_seconds(micros: f64) -> f64 {
    micros.max(0.0) / MICROS_PER_SECOND
}

fn parse_playback_status(status: &str) -> PlaybackStatus {
    match status {
        "Playing" => PlaybackStatus::Playing,
        "Paused" => PlaybackStatus::Paused,
        "Stopped" => PlaybackStatus::Stopped,
        _ => PlaybackStatus::Unknown,
    }
}

/// MPRIS bus names from `ListNames` output, dedicated players before browsers
pub(crate) fn parse_player_names(output: &str) -> Vec<String> {
    let mut browser_players = Vec::new();
    let mut other_players = Vec::new();

    for line in output.lines() {
        let Some(name) = quoted(line.trim()) else {
            continue;
        };
        if !name.starts_with(MPRIS_PREFIX) {
            continue;
        }

        // Deprioritize browser players as they might be playing videos
        if BROWSERS.iter().any(|browser| name.contains(browser)) {
            browser_players.push(name.to_string());
        } else {
            other_players.push(name.to_string());
        }
    }

    other_players.extend(browser_players);
    other_players
}

/// String value of a `variant string "..."` reply
pub(crate) fn parse_variant_string(output: &str) -> Option<String> {
    let lines: Vec<&str> = output.lines().map(str::trim).collect();
    for (i, line) in lines.iter().enumerate() {
        if line.starts_with("variant") {
            // Value is on the same line or the next one
            return quoted(line)
                .or_else(|| lines.get(i + 1).and_then(|next| quoted(next)))
                .map(str::to_string);
        }
    }
    None
}

/// Integer value of a `variant int64 ...` reply
pub(crate) fn parse_variant_i64(output: &str) -> Option<i64> {
    output
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("variant"))
        .and_then(numeric_variant)
        .and_then(|value| value.parse().ok())
}

/// Flatten the `Metadata` dictionary into strings.
///
/// Arrays keep their first string element; numbers keep their text form.
pub(crate) fn parse_metadata(output: &str) -> HashMap<String, String> {
    let lines: Vec<&str> = output.lines().map(str::trim).collect();
    let mut metadata = HashMap::new();

    for (i, line) in lines.iter().enumerate() {
        if !line.starts_with("dict entry(") {
            continue;
        }
        let Some(key) = lines
            .get(i + 1)
            .and_then(|key_line| key_line.strip_prefix("string "))
            .and_then(quoted)
        else {
            continue;
        };
        let Some(variant) = lines.get(i + 2).filter(|l| l.starts_with("variant")) else {
            continue;
        };

        let value = if variant.contains("array [") {
            lines[i + 3..]
                .iter()
                .take_while(|l| !l.starts_with(']') && !l.starts_with("dict entry("))
                .find(|l| l.starts_with("string "))
                .and_then(|l| quoted(l))
        } else if variant.contains("string \"") {
            quoted(variant)
        } else {
            numeric_variant(variant)
        };

        if let Some(value) = value {
            metadata.insert(key.to_string(), value.to_string());
        }
    }

    metadata
}

/// Text between the first and last quote; dbus-send does not escape embedded quotes
fn quoted(line: &str) -> Option<&str> {
    let start = line.find('"')? + 1;
    let end = line.rfind('"')?;
    line.get(start..end)
}

fn numeric_variant(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace().skip(1);
    match (parts.next(), parts.next()) {
        (Some("int16" | "uint16" | "int32" | "uint32" | "int64" | "uint64" | "double"), Some(value)) => {
            Some(value)
        }
        _ => None,
    }
}
