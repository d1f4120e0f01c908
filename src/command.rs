//! Control commands arriving from outside the player.
//!
//! Text commands are parsed into [`ControlMessage`]s, pushed through a crossbeam
//! channel, and applied in arrival order to the shared [`PlaybackState`] by a
//! [`ControlHandler`].

use crate::state::PlaybackState;
use crossbeam::channel::{Receiver, Sender};
use log::{debug, error, info, warn};
use std::io::BufRead;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    TogglePause,
    VolumeUp,
    VolumeDown,
}

/// A command with the confidence its source attached to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlMessage {
    pub command: Command,
    /// `None` when the source gave no strength; treated as full confidence
    pub strength: Option<f32>,
}

impl ControlMessage {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            strength: None,
        }
    }

    pub fn with_strength(command: Command, strength: f32) -> Self {
        Self {
            command,
            strength: Some(strength),
        }
    }

    pub fn effective_strength(&self) -> f32 {
        self.strength.unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("invalid strength '{0}'")]
    InvalidStrength(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" => Err(CommandError::Empty),
            "start" => Ok(Command::Start),
            "stop" => Ok(Command::Stop),
            "pause" | "toggle" => Ok(Command::TogglePause),
            "up" => Ok(Command::VolumeUp),
            "down" => Ok(Command::VolumeDown),
            other => Err(CommandError::UnknownCommand(other.to_string())),
        }
    }
}

/// Parses `name` or `name:strength`, e.g. `start`, `up:0.83`.
impl FromStr for ControlMessage {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, strength) = match s.split_once(':') {
            Some((name, strength)) => (name, Some(strength.trim())),
            None => (s, None),
        };

        let command = name.parse::<Command>()?;
        let strength = match strength {
            None => None,
            Some(raw) => {
                let value = raw
                    .parse::<f32>()
                    .map_err(|_| CommandError::InvalidStrength(raw.to_string()))?;
                if !value.is_finite() {
                    return Err(CommandError::InvalidStrength(raw.to_string()));
                }
                Some(value)
            }
        };

        Ok(ControlMessage { command, strength })
    }
}

/// What happened to a message handed to [`ControlHandler::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Strength did not exceed the acceptance threshold
    Ignored,
}

/// Applies control messages to the shared playback state.
pub struct ControlHandler {
    state: Arc<PlaybackState>,
    acceptance_threshold: f32,
    volume_step: u8,
}

impl ControlHandler {
    pub fn new(state: Arc<PlaybackState>, acceptance_threshold: f32, volume_step: u8) -> Self {
        Self {
            state,
            acceptance_threshold,
            volume_step,
        }
    }

    pub fn apply(&self, message: ControlMessage) -> Outcome {
        let strength = message.effective_strength();
        if strength <= self.acceptance_threshold {
            debug!(
                "Ignoring {:?}: strength {} not above {}",
                message.command, strength, self.acceptance_threshold
            );
            return Outcome::Ignored;
        }

        match message.command {
            Command::Start => {
                self.state.start();
                info!("Playback started");
            }
            Command::Stop => {
                self.state.stop();
                info!("Playback stopped");
            }
            Command::TogglePause => {
                let paused = self.state.toggle_pause();
                info!("{}", if paused { "Paused" } else { "Resumed" });
            }
            Command::VolumeUp => {
                let volume = self.state.adjust_volume(i32::from(self.volume_step));
                info!("Volume increased to {}", volume);
            }
            Command::VolumeDown => {
                let volume = self.state.adjust_volume(-i32::from(self.volume_step));
                info!("Volume decreased to {}", volume);
            }
        }
        Outcome::Applied
    }
}

/// Applies messages in the order received until every sender is dropped.
pub fn run_command_receiver(rx: Receiver<ControlMessage>, handler: ControlHandler) {
    info!("Command receiver started");
    for message in rx.iter() {
        handler.apply(message);
    }
    info!("Command receiver stopping");
}

/// Parses lines from `input` and forwards valid commands to `tx`.
///
/// Bad lines are logged and skipped. Returns when the input ends or the
/// receiving side has gone away.
pub fn forward_commands<R: BufRead>(input: R, tx: &Sender<ControlMessage>) {
    for line in input.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!("Failed to read command input: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<ControlMessage>() {
            Ok(message) => {
                if tx.send(message).is_err() {
                    warn!("Command receiver has gone away");
                    break;
                }
            }
            Err(e) => warn!("Rejected command '{}': {}", line.trim(), e),
        }
    }
}
