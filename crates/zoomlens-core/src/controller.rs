//! Goal-tracking zoom control with a bounded focal-length slew rate.

use std::f64::consts::PI;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::optics;

/// Minimum zoom factor. A factor of 1.0 is the reference (no zoom).
pub const MIN_ZOOM: f64 = 1.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("max_zoom must be at least 1.0, got {0}")]
    InvalidMaxZoom(f64),
    #[error("slew_rate must be non-negative, got {0}")]
    InvalidSlewRate(f64),
    #[error("reference_hfov must lie in (0, pi), got {0}")]
    InvalidReferenceHfov(f64),
}

/// Zoom controller configuration. Immutable once validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoomConfig {
    /// Maximum zoom factor.
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,
    /// Slew rate in meters of focal-length change per second. Infinite by
    /// default, which makes zoom changes instant.
    #[serde(default = "default_slew_rate")]
    pub slew_rate: f64,
    /// Horizontal field of view at zoom factor 1.0 (radians).
    #[serde(default = "default_reference_hfov")]
    pub reference_hfov: f64,
    /// Explicit command topic. When absent the topic is derived as
    /// `<parent-model-name>/<sensor-name>/zoom-command`.
    #[serde(default)]
    pub topic: Option<String>,
}

impl Default for ZoomConfig {
    fn default() -> Self {
        Self {
            max_zoom: default_max_zoom(),
            slew_rate: default_slew_rate(),
            reference_hfov: default_reference_hfov(),
            topic: None,
        }
    }
}

fn default_max_zoom() -> f64 {
    10.0
}

fn default_slew_rate() -> f64 {
    f64::INFINITY
}

fn default_reference_hfov() -> f64 {
    2.0
}

impl ZoomConfig {
    /// Check that the configuration describes a usable lens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.max_zoom >= MIN_ZOOM) {
            return Err(ConfigError::InvalidMaxZoom(self.max_zoom));
        }
        if !(self.slew_rate >= 0.0) {
            return Err(ConfigError::InvalidSlewRate(self.slew_rate));
        }
        if !(self.reference_hfov > 0.0 && self.reference_hfov < PI) {
            return Err(ConfigError::InvalidReferenceHfov(self.reference_hfov));
        }
        Ok(())
    }
}

/// Physical lens state read from and written to the camera each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LensState {
    /// Horizontal field of view (radians).
    pub hfov: f64,
    /// Focal length (meters).
    pub focal_length: f64,
}

impl LensState {
    pub fn new(hfov: f64, focal_length: f64) -> Self {
        Self { hfov, focal_length }
    }

    /// True when both values are usable lens geometry.
    fn is_usable(&self) -> bool {
        self.hfov.is_finite()
            && self.hfov > 0.0
            && self.hfov < PI
            && self.focal_length.is_finite()
            && self.focal_length > 0.0
    }
}

/// Per-tick zoom controller.
///
/// Resolves commanded zoom factors into a goal field of view and converges
/// the lens toward it without exceeding the configured slew rate.
#[derive(Debug)]
pub struct ZoomController {
    max_zoom: f64,
    slew_rate: f64,
    reference_hfov: f64,
    goal_hfov: f64,
}

impl ZoomController {
    /// Validate `config` and create a controller at rest; the goal starts at
    /// the reference field of view (zoom factor 1.0).
    pub fn new(config: &ZoomConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            max_zoom: config.max_zoom,
            slew_rate: config.slew_rate,
            reference_hfov: config.reference_hfov,
            goal_hfov: config.reference_hfov,
        })
    }

    /// Field of view the controller is converging toward (radians).
    pub fn goal_hfov(&self) -> f64 {
        self.goal_hfov
    }

    /// Field of view at zoom factor 1.0 (radians).
    pub fn reference_hfov(&self) -> f64 {
        self.reference_hfov
    }

    /// Effective zoom factor for a given field of view.
    pub fn zoom_factor(&self, hfov: f64) -> f64 {
        self.reference_hfov / hfov
    }

    /// Resolve a newly commanded zoom factor into the goal field of view.
    ///
    /// Called once per detected command change, never per tick: the goal is
    /// a function of the command alone, and recomputing it from a moving
    /// lens state would move the target. Out-of-range commands are clamped
    /// into `[MIN_ZOOM, max_zoom]` and reported; the commanded value is
    /// never applied verbatim.
    pub fn resolve_goal(&mut self, requested: f64) -> f64 {
        if requested.is_nan() {
            warn!(requested, "ignoring non-numeric zoom command");
            return self.goal_hfov;
        }
        let clamped = requested.clamp(MIN_ZOOM, self.max_zoom);
        if (requested - clamped).abs() > f64::EPSILON {
            warn!(requested, clamped, "zoom command out of range, clamped");
        }
        self.goal_hfov = self.reference_hfov / clamped;
        self.goal_hfov
    }

    /// Advance `lens` one tick toward the goal.
    ///
    /// Returns `None` when there is nothing to publish: the goal is already
    /// reached, the permitted focal-length change is zero (`dt` or the slew
    /// rate is zero), or the lens state is degenerate. A returned state is
    /// always finite.
    pub fn step(&self, dt: Duration, lens: LensState) -> Option<LensState> {
        // Goal is achieved, nothing to update.
        if (self.goal_hfov - lens.hfov).abs() < f64::EPSILON {
            return None;
        }

        if !lens.is_usable() {
            warn!(
                hfov = lens.hfov,
                focal_length = lens.focal_length,
                "degenerate lens state, skipping zoom update"
            );
            return None;
        }

        // Held constant for the duration of this tick; derived from the
        // current lens pair rather than cached across ticks.
        let sensor_width =
            optics::sensor_width_from_focal_length_and_fov(lens.focal_length, lens.hfov);
        let goal_focal_length = optics::focal_length_from_fov(sensor_width, self.goal_hfov);

        let new_focal_length = if self.slew_rate.is_finite() {
            // Meters the focal length may move this tick.
            let max_delta = self.slew_rate * dt.as_secs_f64();
            let delta = max_delta.min((lens.focal_length - goal_focal_length).abs());
            if delta == 0.0 {
                return None;
            }
            if goal_focal_length > lens.focal_length {
                lens.focal_length + delta
            } else {
                lens.focal_length - delta
            }
        } else {
            goal_focal_length
        };

        let new_hfov = optics::fov_from_focal_length(sensor_width, new_focal_length);
        let next = LensState::new(new_hfov, new_focal_length);
        if !next.is_usable() {
            warn!(
                goal_hfov = self.goal_hfov,
                new_hfov, new_focal_length, "zoom step produced unusable lens geometry, discarded"
            );
            return None;
        }
        Some(next)
    }
}
