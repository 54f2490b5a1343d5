//! Engine configuration
//!
//! Loaded from JSON (all fields optional) or built from `Default`.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    /// A field is out of its accepted range
    Invalid(String),
    /// Config file could not be read
    Io(std::io::Error),
    /// Config file is not valid JSON for this schema
    Json(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
            ConfigError::Io(err) => write!(f, "failed to read config: {}", err),
            ConfigError::Json(err) => write!(f, "failed to parse config: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid(_) => None,
            ConfigError::Io(err) => Some(err),
            ConfigError::Json(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Json(err)
    }
}

/// Engine construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Grid width in tiles
    pub columns: usize,
    /// Grid height in tiles (bottom row is the loss line)
    pub rows: usize,
    /// Number of palette colors
    pub color_count: u8,
    /// Fraction of rows filled on level generation
    pub initial_fill_fraction: f32,
    /// Turns between row injections
    pub turns_per_row: u32,
    /// Starting area-clear charges
    pub area_clear_charges: u32,
    /// Starting color-convert charges
    pub color_convert_charges: u32,
    /// RNG seed (time-derived when absent)
    pub seed: Option<u64>,
    /// Initial surface size in pixels
    pub surface_width: f32,
    pub surface_height: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            columns: DEFAULT_COLUMNS,
            rows: DEFAULT_ROWS,
            color_count: DEFAULT_COLOR_COUNT,
            initial_fill_fraction: DEFAULT_FILL_FRACTION,
            turns_per_row: DEFAULT_TURNS_PER_ROW,
            area_clear_charges: DEFAULT_POWERUP_CHARGES,
            color_convert_charges: DEFAULT_POWERUP_CHARGES,
            seed: None,
            surface_width: 480.0,
            surface_height: 800.0,
        }
    }
}

impl EngineConfig {
    /// Parse from a JSON document; missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Check all fields are within playable ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.columns < 2 {
            return Err(ConfigError::Invalid(format!(
                "columns must be at least 2, got {}",
                self.columns
            )));
        }
        if self.rows < 4 {
            return Err(ConfigError::Invalid(format!(
                "rows must be at least 4, got {}",
                self.rows
            )));
        }
        if self.color_count == 0 || self.color_count > 16 {
            return Err(ConfigError::Invalid(format!(
                "color_count must be in 1..=16, got {}",
                self.color_count
            )));
        }
        if !(0.0..=1.0).contains(&self.initial_fill_fraction) {
            return Err(ConfigError::Invalid(format!(
                "initial_fill_fraction must be in [0, 1], got {}",
                self.initial_fill_fraction
            )));
        }
        if self.turns_per_row == 0 {
            return Err(ConfigError::Invalid("turns_per_row must be non-zero".into()));
        }
        if !(self.surface_width > 0.0 && self.surface_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "surface must be positive, got {}x{}",
                self.surface_width, self.surface_height
            )));
        }
        Ok(())
    }

    /// Seed to use for a new session
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x5EED_B0BB1E)
        })
    }
}
