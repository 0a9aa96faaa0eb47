use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use daw_timeline::{SnapGrid, TEMPO_MAX_BPM, TEMPO_MIN_BPM, TimeContext, TimeSignature};
use log::warn;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("No config directory available on this platform")]
    NoConfigDir,
}

/// Timeline settings a session starts from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    pub tempo: f64,
    pub time_signature: (u32, u32),
    pub pixels_per_beat: f64,
    pub snap: SnapGrid,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            tempo: 120.0,
            time_signature: (4, 4),
            pixels_per_beat: 100.0,
            snap: SnapGrid::default(),
        }
    }
}

impl TimelineConfig {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("daw").join("timeline.toml"))
    }

    /// Load the user's config, falling back to defaults when it is missing
    /// or unreadable.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match Self::load_from(&path) {
            Ok(config) => config,
            Err(ConfigError::Io(err)) if err.kind() == io::ErrorKind::NotFound => Self::default(),
            Err(err) => {
                warn!("ignoring timeline config at {}: {err}", path.display());
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path().ok_or(ConfigError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    pub fn time_context(&self) -> TimeContext {
        TimeContext::new(self.tempo, self.time_signature, self.pixels_per_beat)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(TEMPO_MIN_BPM..=TEMPO_MAX_BPM).contains(&self.tempo) {
            return Err(ConfigError::Invalid {
                field: "tempo",
                reason: format!("{} is outside {TEMPO_MIN_BPM}..={TEMPO_MAX_BPM}", self.tempo),
            });
        }

        let (numerator, denominator) = self.time_signature;
        if numerator == 0 || !denominator.is_power_of_two() || denominator > 16 {
            return Err(ConfigError::Invalid {
                field: "time_signature",
                reason: format!("{numerator}/{denominator} is not a supported signature"),
            });
        }

        if !(self.pixels_per_beat.is_finite() && self.pixels_per_beat > 0.0) {
            return Err(ConfigError::Invalid {
                field: "pixels_per_beat",
                reason: format!("{} must be a positive width", self.pixels_per_beat),
            });
        }

        Ok(())
    }
}

impl From<&TimelineConfig> for TimeSignature {
    fn from(config: &TimelineConfig) -> Self {
        config.time_signature.into()
    }
}
