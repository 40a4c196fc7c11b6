use serde::{Deserialize, Serialize};

/// Bit set of collision categories, used to filter raycasts per tool mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const MINABLE: Self = Self(1 << 0);
    pub const LIFTABLE: Self = Self(1 << 1);
    pub const REPAIRABLE: Self = Self(1 << 2);
    pub const ALL: Self = Self(u32::MAX);

    pub fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    pub fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl std::ops::BitOr for LayerMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}
