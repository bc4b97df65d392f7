//! Configuration for the kinematics engine.

use crate::core::angles::DEFAULT_ANGLE_OFFSET_RAD;
use crate::core::calibration::{SeparationBounds, DEFAULT_PIXEL_SIZE};
use crate::core::fragments::DEFAULT_MIN_FRAGMENT_LEN;
use crate::core::windowing::AngularRange;
use crate::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Main configuration for a metrics run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum length (frames) of a tracking fragment to keep
    pub min_fragment_len: usize,

    /// Physical size of one pixel; applied to coordinates and separation checks
    pub pixel_size: f64,

    /// Duration of one frame in seconds; velocities are skipped when unset
    pub exposure_time_secs: Option<f64>,

    /// Plausible anterior/posterior separation, in scaled units
    pub separation: SeparationBounds,

    /// Calibration offset added to every heading angle (radians)
    pub angle_offset_rad: f64,

    /// Time-in-range analysis; skipped when unset
    pub probability: Option<ProbabilityConfig>,

    /// Velocities below this value (scaled units per second) are dropped
    pub speed_threshold: Option<f64>,

    /// Raw x coordinates outside this range are treated as arena-edge artifacts
    pub position_bounds: Option<PositionBounds>,

    /// Keep every n-th frame before any processing
    pub frame_stride: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_fragment_len: DEFAULT_MIN_FRAGMENT_LEN,
            pixel_size: DEFAULT_PIXEL_SIZE,
            exposure_time_secs: None,
            separation: SeparationBounds::default(),
            angle_offset_rad: DEFAULT_ANGLE_OFFSET_RAD,
            probability: None,
            speed_threshold: None,
            position_bounds: None,
            frame_stride: 1,
        }
    }
}

/// Angular range (degrees) and window size for time-in-range probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProbabilityConfig {
    pub lower_deg: f64,
    pub upper_deg: f64,
    pub window_frames: usize,
}

impl ProbabilityConfig {
    /// The configured range converted to radians.
    pub fn range(&self) -> Result<AngularRange> {
        AngularRange::from_degrees(self.lower_deg, self.upper_deg)
    }
}

/// Inclusive range of plausible raw coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PositionBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for PositionBounds {
    fn default() -> Self {
        Self {
            min: 100.0,
            max: 1100.0,
        }
    }
}

impl Config {
    /// Check every parameter before any computation starts.
    pub fn validate(&self) -> Result<()> {
        if self.min_fragment_len == 0 {
            return Err(MetricsError::config(
                "min_fragment_len",
                self.min_fragment_len,
                "must be at least 1",
            ));
        }
        if !self.pixel_size.is_finite() || self.pixel_size <= 0.0 {
            return Err(MetricsError::config(
                "pixel_size",
                self.pixel_size,
                "must be positive",
            ));
        }
        if let Some(dt) = self.exposure_time_secs {
            if !dt.is_finite() || dt <= 0.0 {
                return Err(MetricsError::config(
                    "exposure_time_secs",
                    dt,
                    "must be a positive number of seconds",
                ));
            }
        }
        self.separation.validate()?;
        if !self.angle_offset_rad.is_finite() {
            return Err(MetricsError::config(
                "angle_offset_rad",
                self.angle_offset_rad,
                "must be finite",
            ));
        }
        if let Some(probability) = &self.probability {
            if probability.window_frames == 0 {
                return Err(MetricsError::config(
                    "window_frames",
                    probability.window_frames,
                    "must be at least 1",
                ));
            }
            probability.range()?;
        }
        if let Some(threshold) = self.speed_threshold {
            if !threshold.is_finite() {
                return Err(MetricsError::config(
                    "speed_threshold",
                    threshold,
                    "must be finite",
                ));
            }
        }
        if let Some(bounds) = &self.position_bounds {
            if !(bounds.min.is_finite() && bounds.max.is_finite()) || bounds.min > bounds.max {
                return Err(MetricsError::config(
                    "position_bounds",
                    format!("[{}, {}]", bounds.min, bounds.max),
                    "bounds must be finite with min <= max",
                ));
            }
        }
        if self.frame_stride == 0 {
            return Err(MetricsError::config(
                "frame_stride",
                self.frame_stride,
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Load configuration from the default location.
    pub fn load() -> std::result::Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit file.
    pub fn load_from(path: &Path) -> std::result::Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> std::result::Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit file.
    pub fn save_to(&self, path: &Path) -> std::result::Result<(), ConfigError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("synheart-kinematics")
            .join("config.json")
    }
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
