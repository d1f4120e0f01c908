// config.rs

use crate::midi::cursor::MAX_VARIABLE_LENGTH;
use crate::state::VolumeRange;
use config::{Config, Environment, File};
use log::debug;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// What a stop command does to the playback position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StopPolicy {
    /// Keep the position; the next start continues from it
    Freeze,
    /// Return to the first event of the first track
    Rewind,
}

/// Where note-offs come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NoteOffMode {
    /// Every sounding note-on is released after the sounding duration
    Sounding,
    /// Note-offs are played where the file puts them
    File,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    /// Seconds per quarter note
    pub tempo_scale: f64,
    pub sounding_duration_secs: f64,
    pub inter_loop_delay_secs: f64,
    pub poll_interval_ms: u64,
    pub volume_step: u8,
    pub volume_min: u8,
    pub volume_max: u8,
    pub initial_volume: u8,
    pub acceptance_threshold: f32,
    pub stop_policy: StopPolicy,
    pub note_off_mode: NoteOffMode,
    pub autostart: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tempo_scale: 0.5,
            sounding_duration_secs: 0.2,
            inter_loop_delay_secs: 0.5,
            poll_interval_ms: 10,
            volume_step: 10,
            volume_min: 0,
            volume_max: 127,
            initial_volume: 64,
            acceptance_threshold: 0.5,
            stop_policy: StopPolicy::Freeze,
            note_off_mode: NoteOffMode::Sounding,
            autostart: false,
        }
    }
}

impl Settings {
    /// Layers defaults, the optional settings file and `MIDILOOP_*` environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("tempo_scale", defaults.tempo_scale)?
            .set_default("sounding_duration_secs", defaults.sounding_duration_secs)?
            .set_default("inter_loop_delay_secs", defaults.inter_loop_delay_secs)?
            .set_default("poll_interval_ms", defaults.poll_interval_ms as i64)?
            .set_default("volume_step", i64::from(defaults.volume_step))?
            .set_default("volume_min", i64::from(defaults.volume_min))?
            .set_default("volume_max", i64::from(defaults.volume_max))?
            .set_default("initial_volume", i64::from(defaults.initial_volume))?
            .set_default(
                "acceptance_threshold",
                f64::from(defaults.acceptance_threshold),
            )?
            .set_default("stop_policy", "freeze")?
            .set_default("note_off_mode", "sounding")?
            .set_default("autostart", defaults.autostart)?;

        if let Some(path) = path {
            debug!("Reading settings file: {}", path.display());
            builder = builder.add_source(File::from(path).required(true));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("MIDILOOP").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        debug!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: String| Err(SettingsError::Invalid(msg));

        if !(self.tempo_scale.is_finite() && self.tempo_scale > 0.0) {
            return invalid(format!("tempo_scale must be positive, got {}", self.tempo_scale));
        }
        // The longest delta a file can hold, at one tick per quarter note.
        let longest_wait = self.tempo_scale * f64::from(MAX_VARIABLE_LENGTH);
        if Duration::try_from_secs_f64(longest_wait).is_err() {
            return invalid(format!("tempo_scale {} is too large", self.tempo_scale));
        }
        for (name, value) in [
            ("sounding_duration_secs", self.sounding_duration_secs),
            ("inter_loop_delay_secs", self.inter_loop_delay_secs),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(format!("{} must not be negative, got {}", name, value));
            }
            if Duration::try_from_secs_f64(value).is_err() {
                return invalid(format!("{} {} is too large", name, value));
            }
        }
        if self.poll_interval_ms == 0 {
            return invalid("poll_interval_ms must be at least 1".to_string());
        }
        if self.volume_max > 127 {
            return invalid(format!("volume_max must be at most 127, got {}", self.volume_max));
        }
        if self.volume_min > self.volume_max {
            return invalid(format!(
                "volume_min {} is above volume_max {}",
                self.volume_min, self.volume_max
            ));
        }
        if !self.acceptance_threshold.is_finite() {
            return invalid("acceptance_threshold must be a number".to_string());
        }
        Ok(())
    }

    pub fn volume_range(&self) -> VolumeRange {
        VolumeRange::new(self.volume_min, self.volume_max)
    }

    pub fn sounding_duration(&self) -> Duration {
        Duration::from_secs_f64(self.sounding_duration_secs)
    }

    pub fn inter_loop_delay(&self) -> Duration {
        Duration::from_secs_f64(self.inter_loop_delay_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn settings_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "midiloop-{}-{}.toml",
            name,
            std::process::id()
        ));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.sounding_duration(), Duration::from_millis(200));
        assert_eq!(settings.inter_loop_delay(), Duration::from_millis(500));
        assert_eq!(settings.volume_range(), VolumeRange { min: 0, max: 127 });
    }

    #[test]
    fn test_file_overrides_defaults() {
        let path = settings_file(
            "overrides",
            "tempo_scale = 0.25\nvolume_min = 10\nvolume_max = 117\nstop_policy = \"rewind\"\n",
        );
        let settings = Settings::load(Some(&path)).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(settings.tempo_scale, 0.25);
        assert_eq!(settings.volume_range(), VolumeRange { min: 10, max: 117 });
        assert_eq!(settings.stop_policy, StopPolicy::Rewind);
        assert_eq!(settings.note_off_mode, NoteOffMode::Sounding);
        assert_eq!(settings.volume_step, 10);
    }

    #[test]
    fn test_invalid_file_values_rejected() {
        let path = settings_file("invalid", "volume_min = 100\nvolume_max = 20\n");
        let result = Settings::load(Some(&path));
        fs::remove_file(&path).ok();

        assert!(matches!(result, Err(SettingsError::Invalid(_))));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let path = std::env::temp_dir().join("midiloop-does-not-exist.toml");
        assert!(matches!(
            Settings::load(Some(&path)),
            Err(SettingsError::Load(_))
        ));
    }

    #[test]
    fn test_non_positive_tempo_scale_rejected() {
        let settings = Settings {
            tempo_scale: 0.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_oversized_durations_rejected() {
        let settings = Settings {
            tempo_scale: 1e12,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));

        let settings = Settings {
            inter_loop_delay_secs: 1e20,
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(SettingsError::Invalid(_))));

        let settings = Settings {
            tempo_scale: 60.0,
            sounding_duration_secs: 3600.0,
            ..Settings::default()
        };
        assert!(settings.validate().is_ok());
    }
}
