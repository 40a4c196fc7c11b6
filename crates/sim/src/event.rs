use multitool_beam::ToolMode;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Won,
    Lost,
}

/// Something a player would notice, stamped with the session tick it happened on.
///
/// Entities are referred to by name so runs can be compared across processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum GameEvent {
    ModeChanged {
        tick: u64,
        mode: ToolMode,
    },
    PickedUp {
        tick: u64,
        entity: String,
    },
    PickupRejected {
        tick: u64,
        entity: String,
    },
    Released {
        tick: u64,
        entity: String,
    },
    HoldLost {
        tick: u64,
        entity: String,
    },
    Mined {
        tick: u64,
        entity: String,
        drop: Option<String>,
    },
    Repaired {
        tick: u64,
        entity: String,
        mesh: Option<String>,
        material: Option<String>,
    },
    Snapped {
        tick: u64,
        objective: String,
        entity: String,
    },
    Progress {
        tick: u64,
        completed: usize,
        total: usize,
    },
    Won {
        tick: u64,
    },
    Lost {
        tick: u64,
    },
    Paused {
        tick: u64,
    },
    Resumed {
        tick: u64,
    },
}

impl GameEvent {
    pub fn tick(&self) -> u64 {
        match self {
            Self::ModeChanged { tick, .. }
            | Self::PickedUp { tick, .. }
            | Self::PickupRejected { tick, .. }
            | Self::Released { tick, .. }
            | Self::HoldLost { tick, .. }
            | Self::Mined { tick, .. }
            | Self::Repaired { tick, .. }
            | Self::Snapped { tick, .. }
            | Self::Progress { tick, .. }
            | Self::Won { tick }
            | Self::Lost { tick }
            | Self::Paused { tick }
            | Self::Resumed { tick } => *tick,
        }
    }
}

impl std::fmt::Display for GameEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:>5}] ", self.tick())?;
        match self {
            Self::ModeChanged { mode, .. } => write!(f, "mode -> {mode}"),
            Self::PickedUp { entity, .. } => write!(f, "picked up {entity}"),
            Self::PickupRejected { entity, .. } => write!(f, "cannot pick up {entity}"),
            Self::Released { entity, .. } => write!(f, "released {entity}"),
            Self::HoldLost { entity, .. } => write!(f, "lost hold of {entity}"),
            Self::Mined { entity, drop, .. } => match drop {
                Some(drop) => write!(f, "mined {entity}, dropped {drop}"),
                None => write!(f, "mined {entity}"),
            },
            Self::Repaired { entity, .. } => write!(f, "repaired {entity}"),
            Self::Snapped {
                objective, entity, ..
            } => write!(f, "{entity} snapped into place ({objective})"),
            Self::Progress {
                completed, total, ..
            } => write!(f, "objectives {completed}/{total}"),
            Self::Won { .. } => f.write_str("mission complete"),
            Self::Lost { .. } => f.write_str("mission failed: out of time"),
            Self::Paused { .. } => f.write_str("paused"),
            Self::Resumed { .. } => f.write_str("resumed"),
        }
    }
}
