//! Built-in scenes, one per tool mode.

use crate::scene::{SceneConfig, SceneError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Demo {
    Mining,
    Tractor,
    Repair,
}

impl Demo {
    pub const ALL: [Demo; 3] = [Demo::Mining, Demo::Tractor, Demo::Repair];

    pub fn name(self) -> &'static str {
        match self {
            Self::Mining => "mining",
            Self::Tractor => "tractor",
            Self::Repair => "repair",
        }
    }

    /// The scene file as shipped.
    pub fn source(self) -> &'static str {
        match self {
            Self::Mining => include_str!("../scenes/mining.yaml"),
            Self::Tractor => include_str!("../scenes/tractor.yaml"),
            Self::Repair => include_str!("../scenes/repair.yaml"),
        }
    }

    pub fn scene(self) -> Result<SceneConfig, SceneError> {
        SceneConfig::from_yaml(self.source())
    }
}
