use std::fs;
use std::path::Path;

use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{MAX_SAMPLES, Viewport};

/// Smallest accepted `sampleDensity`, in pixels.
pub const MIN_SAMPLE_DENSITY: f64 = 0.01;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Sampling and viewport settings.
///
/// Every field has a default, so a config file only lists what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlotConfig {
    /// Horizontal pixels between samples
    pub sample_density: f64,
    /// Pixels per math unit
    pub default_scale: f64,
    /// Samples further than this many pixels off screen break the curve
    pub off_screen_margin: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            sample_density: 2.0,
            default_scale: 50.0,
            off_screen_margin: 1000.0,
            width: 800,
            height: 600,
        }
    }
}

impl PlotConfig {
    /// Reads a JSON config file and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: PlotConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!("loaded plot config from {}", path.display());
        Ok(config)
    }

    /// Loads `path` if given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = |name: &str, value: f64| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                warn!("rejecting {name} = {value}");
                Err(ConfigError::Invalid(format!("{name} must be a positive number, got {value}")))
            }
        };

        positive("sampleDensity", self.sample_density)?;
        positive("defaultScale", self.default_scale)?;
        if self.sample_density < MIN_SAMPLE_DENSITY {
            return Err(ConfigError::Invalid(format!(
                "sampleDensity must be at least {MIN_SAMPLE_DENSITY}, got {}",
                self.sample_density
            )));
        }
        if self.off_screen_margin.is_nan() || self.off_screen_margin < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "offScreenMargin must not be negative, got {}",
                self.off_screen_margin
            )));
        }
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "canvas size must be non-zero, got {}x{}",
                self.width, self.height
            )));
        }
        let samples = self.width as f64 / self.sample_density;
        if samples > MAX_SAMPLES as f64 {
            return Err(ConfigError::Invalid(format!(
                "{samples} samples per curve exceeds the limit of {MAX_SAMPLES}"
            )));
        }
        Ok(())
    }

    /// Viewport centered on the origin at the default scale.
    pub fn viewport(&self) -> Viewport {
        Viewport::centered(self.width as f64, self.height as f64, self.default_scale)
    }
}
