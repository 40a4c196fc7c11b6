//! World Kernel: authoritative world state, rigid bodies, raycasts and simulation stepping.
//!
//! # Invariants
//! - All state mutations flow through explicit operations.
//! - A held body is never moved by gravity; only its controller writes its velocity.
//! - Parented entities are not integrated; they follow their parent.

pub mod body;
pub mod raycast;
pub mod world;

pub use body::{BodyError, Collider, RigidBody, Shape};
pub use multitool_common::{BodyFlags, RayHit};
pub use world::{EntityData, World, WorldEvent};

pub fn crate_info() -> &'static str {
    "multitool-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
