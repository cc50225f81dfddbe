//! Configuration loading and validation.

pub mod rules;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::Score;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Tournament-level pairing parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingConfig {
    /// Maximum pairing-allocated byes a single player may receive
    #[serde(default = "default_max_byes")]
    pub max_byes: u32,

    /// Points credited for a bye
    #[serde(default = "default_bye_points")]
    pub bye_points: Score,

    /// Planned number of rounds, if known
    #[serde(default)]
    pub total_rounds: Option<u32>,

    /// Forbid pairing two players who both have an absolute colour preference for the same colour
    #[serde(default = "default_absolute_colour_rule")]
    pub absolute_colour_rule: bool,
}

fn default_max_byes() -> u32 {
    1
}

fn default_bye_points() -> Score {
    Score::from_half_points(rules::WIN_HALF_POINTS)
}

fn default_absolute_colour_rule() -> bool {
    true
}

impl Default for PairingConfig {
    fn default() -> Self {
        Self {
            max_byes: default_max_byes(),
            bye_points: default_bye_points(),
            total_rounds: None,
            absolute_colour_rule: default_absolute_colour_rule(),
        }
    }
}

impl PairingConfig {
    /// Whether `round` is the last planned round.
    ///
    /// With no planned round count every round is treated as possibly final.
    pub fn is_final_round(&self, round: u32) -> bool {
        match self.total_rounds {
            Some(total) => round >= total,
            None => true,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub pairing: PairingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            pairing: PairingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &PathBuf) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(total) = self.pairing.total_rounds {
            if total == 0 || total > rules::MAX_ROUNDS {
                return Err(ConfigError::ValidationError(format!(
                    "total_rounds must be between 1 and {}",
                    rules::MAX_ROUNDS
                )));
            }
        }

        if self.pairing.bye_points.half_points() > rules::WIN_HALF_POINTS {
            return Err(ConfigError::ValidationError(
                "bye_points cannot exceed the points for a win".to_string(),
            ));
        }

        Ok(())
    }
}
