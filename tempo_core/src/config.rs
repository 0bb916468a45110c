//! Configuration file support for Tempo.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/tempo/config.toml`.

use crate::session::{PlaybackRules, DEFAULT_COUNTDOWN_CUE_SECONDS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub player: PlayerConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Session player configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Interval between ticks; one tick is one second of workout time
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Countdown cues fire for the last N seconds of a timed phase
    #[serde(default = "default_countdown_cue_seconds")]
    pub countdown_cue_seconds: u32,

    /// Start the countdown immediately instead of waiting for play
    #[serde(default)]
    pub auto_start: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            countdown_cue_seconds: default_countdown_cue_seconds(),
            auto_start: false,
        }
    }
}

impl PlayerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn rules(&self) -> PlaybackRules {
        PlaybackRules {
            countdown_cue_seconds: self.countdown_cue_seconds,
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tempo")
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_countdown_cue_seconds() -> u32 {
    DEFAULT_COUNTDOWN_CUE_SECONDS
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load and validate configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Reject values the player cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.player.tick_interval_ms == 0 {
            return Err(Error::Config(
                "player.tick_interval_ms must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tempo")
            .join("config.toml")
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
