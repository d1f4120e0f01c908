use crate::config::SettingsError;
use crate::midi::ParseError;
use crate::transport::TransportError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Anything that keeps the player from starting.
#[derive(Debug, Error)]
pub enum PlayerError {
    #[error("cannot read MIDI file {}: {source}", .path.display())]
    FileUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot parse MIDI file: {0}")]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("cannot install Ctrl+C handler: {0}")]
    Signal(#[from] ctrlc::Error),
    #[error("cannot start {task} task: {source}")]
    Spawn {
        task: &'static str,
        #[source]
        source: io::Error,
    },
}
