use crate::config::{NoteOffMode, Settings, StopPolicy};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Loop a Standard MIDI File out to a MIDI device", long_about = None)]
pub struct Args {
    /// Standard MIDI File to play
    #[arg(required_unless_present = "list_outputs")]
    pub file: Option<PathBuf>,

    /// List available MIDI output ports
    #[arg(long)]
    pub list_outputs: bool,

    /// Send to the first output port whose name contains DEVICE
    #[arg(long, value_name = "DEVICE", conflicts_with_all = ["select_output", "dry_run"])]
    pub output: Option<String>,

    /// Choose the output port interactively
    #[arg(long, conflicts_with = "dry_run")]
    pub select_output: bool,

    /// Log notes instead of sending them to a device
    #[arg(long)]
    pub dry_run: bool,

    /// Settings file (TOML, YAML or JSON)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Seconds per quarter note
    #[arg(long)]
    pub tempo_scale: Option<f64>,

    #[arg(long, value_enum)]
    pub stop_policy: Option<StopPolicy>,

    #[arg(long, value_enum)]
    pub note_off_mode: Option<NoteOffMode>,

    /// Start playing without waiting for a start command
    #[arg(long)]
    pub autostart: bool,

    /// Hide the status line
    #[arg(long)]
    pub no_status: bool,

    /// Also log to the terminal
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Command-line flags take precedence over every other settings source.
    pub fn apply_overrides(&self, settings: &mut Settings) {
        if let Some(tempo_scale) = self.tempo_scale {
            settings.tempo_scale = tempo_scale;
        }
        if let Some(stop_policy) = self.stop_policy {
            settings.stop_policy = stop_policy;
        }
        if let Some(note_off_mode) = self.note_off_mode {
            settings.note_off_mode = note_off_mode;
        }
        if self.autostart {
            settings.autostart = true;
        }
    }
}
