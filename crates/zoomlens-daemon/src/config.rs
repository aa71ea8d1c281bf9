//! Configuration loading and validation

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use zoomlens_core::ZoomConfig;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub zoom: ZoomConfig,
    #[serde(default)]
    pub tick: TickConfig,
}

/// Simulated world and camera placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// World name
    #[serde(default = "default_world")]
    pub world: String,
    /// Parent model name
    #[serde(default = "default_model")]
    pub model: String,
    /// Camera sensor name
    #[serde(default = "default_sensor")]
    pub sensor: String,
    /// Initial lens focal length in meters
    #[serde(default = "default_focal_length")]
    pub focal_length: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            world: default_world(),
            model: default_model(),
            sensor: default_sensor(),
            focal_length: default_focal_length(),
        }
    }
}

fn default_world() -> String {
    "default".to_string()
}

fn default_model() -> String {
    "iris".to_string()
}

fn default_sensor() -> String {
    "zoom_camera".to_string()
}

fn default_focal_length() -> f64 {
    0.012 // 12mm wide-angle lens
}

/// Tick loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickConfig {
    /// Simulation ticks per second
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
        }
    }
}

fn default_rate_hz() -> u32 {
    50
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(Config {
            camera: CameraConfig::default(),
            zoom: ZoomConfig::default(),
            tick: TickConfig::default(),
        })
    }
}
