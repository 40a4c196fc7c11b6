use multitool_common::EntityId;
use serde::{Deserialize, Serialize};

/// Identity of a transport objective, assigned by the transport system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectiveId(pub u32);

impl std::fmt::Display for ObjectiveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "objective#{}", self.0)
    }
}

/// A completion signal. Also serves as the key an objective is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ObjectiveEvent {
    Mined(EntityId),
    Repaired(EntityId),
    Snapped(ObjectiveId),
}

/// Every registered objective is complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinEvent;
