use glam::Vec3;
use multitool_common::{BodyFlags, EntityId};
use serde::{Deserialize, Serialize};

use crate::config::BeamConfig;

/// The tool's current interaction mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolMode {
    Mining,
    Tractor,
    Repair,
}

impl ToolMode {
    /// Mining -> Tractor -> Repair -> Mining.
    pub fn next(self) -> Self {
        match self {
            Self::Mining => Self::Tractor,
            Self::Tractor => Self::Repair,
            Self::Repair => Self::Mining,
        }
    }
}

impl std::fmt::Display for ToolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mining => "mining",
            Self::Tractor => "tractor",
            Self::Repair => "repair",
        };
        f.write_str(name)
    }
}

/// A body under tractor control, with what is needed to hand it back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeldBody {
    pub entity: EntityId,
    /// Flags the body had before pickup.
    pub flags: BodyFlags,
    /// Last velocity written to the body; imparted on release.
    pub release_velocity: Vec3,
}

/// Per-mode state. Each variant carries only what its mode uses.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ModeState {
    Mining {
        damage_per_second: f32,
    },
    Tractor {
        hold_distance: f32,
        held: Option<HeldBody>,
    },
    Repair {
        repair_per_second: f32,
    },
}

impl ModeState {
    pub(crate) fn enter(mode: ToolMode, config: &BeamConfig, hold_distance: f32) -> Self {
        match mode {
            ToolMode::Mining => Self::Mining {
                damage_per_second: config.damage_per_second,
            },
            ToolMode::Tractor => Self::Tractor {
                hold_distance: config.clamp_hold_distance(hold_distance),
                held: None,
            },
            ToolMode::Repair => Self::Repair {
                repair_per_second: config.repair_per_second,
            },
        }
    }

    pub(crate) fn mode(&self) -> ToolMode {
        match self {
            Self::Mining { .. } => ToolMode::Mining,
            Self::Tractor { .. } => ToolMode::Tractor,
            Self::Repair { .. } => ToolMode::Repair,
        }
    }

    pub(crate) fn held(&self) -> Option<&HeldBody> {
        match self {
            Self::Tractor { held, .. } => held.as_ref(),
            _ => None,
        }
    }
}
