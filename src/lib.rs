pub mod cli;
pub mod command;
pub mod config;
mod error;
pub mod logging;
pub mod midi;
pub mod playback;
pub mod scheduler;
pub mod state;
pub mod transport;
pub mod ui;

pub use cli::Args;
pub use command::{run_command_receiver, Command, ControlHandler, ControlMessage};
pub use config::Settings;
pub use error::PlayerError;
pub use midi::Song;
pub use playback::{PlaybackEngine, PlaybackSettings};
pub use scheduler::{Scheduler, ThreadScheduler};
pub use state::PlaybackState;

use log::info;
use std::path::Path;
use std::sync::Arc;

pub type SharedState = Arc<PlaybackState>;

/// Reads and parses a MIDI file once. There is no retry.
pub fn load_song(path: &Path) -> Result<Song, PlayerError> {
    let bytes = std::fs::read(path).map_err(|source| PlayerError::FileUnavailable {
        path: path.to_path_buf(),
        source,
    })?;
    let song = Song::parse(&bytes)?;
    info!(
        "Loaded {}: format {}, {} tracks, {} ticks per quarter note, {} note events",
        path.display(),
        song.header().format_type,
        song.tracks().len(),
        song.header().time_division,
        song.event_count()
    );
    Ok(song)
}

pub fn create_shared_state(settings: &Settings) -> SharedState {
    let state = PlaybackState::new(settings.initial_volume, settings.volume_range());
    if settings.autostart {
        state.start();
    }
    Arc::new(state)
}

pub fn create_scheduler() -> ThreadScheduler {
    ThreadScheduler::new()
}
