use super::create_playback_spinner;
use crate::state::PlaybackState;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// One-line summary of the shared playback state.
pub fn describe_state(state: &PlaybackState, track_count: usize) -> String {
    let transport = match (state.is_running(), state.is_paused()) {
        (false, _) => "stopped",
        (true, true) => "paused",
        (true, false) => "playing",
    };
    let (track, event) = state.progress().position();
    format!(
        "{} | track {}/{} event {} | volume {} | passes {}",
        transport,
        (track + 1).min(track_count.max(1)),
        track_count,
        event + 1,
        state.volume(),
        state.progress().passes()
    )
}

/// Refreshes the status line until a shutdown is requested.
pub fn run_state_inspector(state: Arc<PlaybackState>, track_count: usize) {
    let spinner = create_playback_spinner();
    while !state.is_shutting_down() {
        spinner.set_message(describe_state(&state, track_count));
        thread::sleep(REFRESH_INTERVAL);
    }
    spinner.finish_with_message("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_stopped_state() {
        let state = PlaybackState::default();
        assert_eq!(
            describe_state(&state, 2),
            "stopped | track 1/2 event 1 | volume 64 | passes 0"
        );
    }

    #[test]
    fn test_describe_paused_state_with_progress() {
        let state = PlaybackState::default();
        state.start();
        state.toggle_pause();
        state.progress().set_position(1, 9);
        state.progress().complete_pass();

        assert_eq!(
            describe_state(&state, 2),
            "paused | track 2/2 event 10 | volume 64 | passes 1"
        );
    }
}
