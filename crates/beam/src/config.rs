use glam::Vec4;
use multitool_common::LayerMask;
use serde::{Deserialize, Serialize};

use crate::mode::ToolMode;

/// Errors from validating a [`BeamConfig`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f32 },
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: f32 },
    #[error("hold distance {default} is outside [{min}, {max}]")]
    HoldRange { min: f32, default: f32, max: f32 },
}

/// Raycast filter per mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeLayers {
    pub mining: LayerMask,
    pub tractor: LayerMask,
    pub repair: LayerMask,
}

impl Default for ModeLayers {
    fn default() -> Self {
        Self {
            mining: LayerMask::MINABLE,
            tractor: LayerMask::LIFTABLE,
            repair: LayerMask::REPAIRABLE,
        }
    }
}

/// Beam line color (RGBA) per mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeColors {
    pub mining: Vec4,
    pub tractor: Vec4,
    pub repair: Vec4,
}

impl Default for ModeColors {
    fn default() -> Self {
        Self {
            mining: Vec4::new(1.0, 0.0, 0.0, 1.0),
            tractor: Vec4::new(0.0, 0.0, 1.0, 1.0),
            repair: Vec4::new(0.0, 1.0, 0.0, 1.0),
        }
    }
}

/// Tuning for the beam tool. Missing fields in a config file take the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamConfig {
    /// Ray length, shared by all modes.
    pub max_range: f32,
    pub damage_per_second: f32,
    pub repair_per_second: f32,
    /// Initial tractor hold distance.
    pub hold_distance: f32,
    pub min_hold_distance: f32,
    pub max_hold_distance: f32,
    /// Hold distance change per unit of scroll.
    pub scroll_sensitivity: f32,
    /// Proportional gain pulling a held body toward the hold point.
    pub follow_speed: f32,
    /// Speed ceiling for a held body.
    pub max_velocity: f32,
    /// A held body closer than this to the hold point is brought to rest.
    pub settle_tolerance: f32,
    pub layers: ModeLayers,
    pub colors: ModeColors,
}

impl Default for BeamConfig {
    fn default() -> Self {
        Self {
            max_range: 5.0,
            damage_per_second: 10.0,
            repair_per_second: 1.0,
            hold_distance: 3.0,
            min_hold_distance: 1.0,
            max_hold_distance: 10.0,
            scroll_sensitivity: 2.0,
            follow_speed: 10.0,
            max_velocity: 20.0,
            settle_tolerance: 0.01,
            layers: ModeLayers::default(),
            colors: ModeColors::default(),
        }
    }
}

impl BeamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_range", self.max_range),
            ("follow_speed", self.follow_speed),
            ("max_velocity", self.max_velocity),
            ("min_hold_distance", self.min_hold_distance),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        for (field, value) in [
            ("damage_per_second", self.damage_per_second),
            ("repair_per_second", self.repair_per_second),
            ("scroll_sensitivity", self.scroll_sensitivity),
            ("settle_tolerance", self.settle_tolerance),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Negative { field, value });
            }
        }
        let (min, default, max) = (
            self.min_hold_distance,
            self.hold_distance,
            self.max_hold_distance,
        );
        if !(min <= default && default <= max) {
            return Err(ConfigError::HoldRange { min, default, max });
        }
        Ok(())
    }

    pub fn layer_for(&self, mode: ToolMode) -> LayerMask {
        match mode {
            ToolMode::Mining => self.layers.mining,
            ToolMode::Tractor => self.layers.tractor,
            ToolMode::Repair => self.layers.repair,
        }
    }

    pub fn color_for(&self, mode: ToolMode) -> Vec4 {
        match mode {
            ToolMode::Mining => self.colors.mining,
            ToolMode::Tractor => self.colors.tractor,
            ToolMode::Repair => self.colors.repair,
        }
    }

    /// Only meaningful on a validated config.
    pub(crate) fn clamp_hold_distance(&self, distance: f32) -> f32 {
        if distance.is_finite() {
            distance.clamp(self.min_hold_distance, self.max_hold_distance)
        } else {
            self.hold_distance
                .clamp(self.min_hold_distance, self.max_hold_distance)
        }
    }
}
