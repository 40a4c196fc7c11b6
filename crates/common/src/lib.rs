//! Shared types for the multitool workspace.
//!
//! # Invariants
//! - Entity ids are unique for the lifetime of a process.
//! - Transforms are plain values; the kernel decides what they are relative to.

mod layer;
mod types;

pub use layer::LayerMask;
pub use types::{BodyFlags, EntityId, Ray, RayHit, Transform};

pub fn crate_info() -> &'static str {
    "multitool-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
