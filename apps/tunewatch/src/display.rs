use tunewatch_core::{format_timestamp, MediaPlayerState};

/// One-line text rendering of a snapshot
pub fn format_line(state: &MediaPlayerState) -> String {
    let Some(label) = state.display_label() else {
        return "(nothing playing)".to_string();
    };

    let mut line = format!("{} {}", if state.is_playing { ">" } else { "||" }, label);
    if let Some(album) = state.album.as_deref() {
        line.push_str(&format!(" [{}]", album));
    }
    if state.length_seconds > 0.0 {
        line.push_str(&format!(
            " {} / {}",
            format_timestamp(state.position_seconds),
            format_timestamp(state.length_seconds)
        ));
    }
    line
}

/// Whether the change from `previous` to `next` is worth printing.
///
/// Position ticks only matter while paused (a seek); during playback they
/// would print every refresh.
pub fn should_print(previous: Option<&MediaPlayerState>, next: &MediaPlayerState) -> bool {
    let Some(previous) = previous else {
        return true;
    };
    previous.title != next.title
        || previous.artist != next.artist
        || previous.album != next.album
        || previous.is_playing != next.is_playing
        || previous.length_seconds != next.length_seconds
        || (!next.is_playing && previous.position_seconds != next.position_seconds)
}
