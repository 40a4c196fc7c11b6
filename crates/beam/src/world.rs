use glam::Vec3;
use multitool_common::{BodyFlags, EntityId, LayerMask, Ray, RayHit};

/// Why a pickup was refused. Never fatal; the tool logs it and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PickupError {
    #[error("entity {0} not found")]
    NotFound(EntityId),
    #[error("entity {0} has no rigid body")]
    NoBody(EntityId),
    #[error("body {0} is kinematic")]
    Kinematic(EntityId),
    #[error("body {0} is already held")]
    AlreadyHeld(EntityId),
}

/// A held body disappeared or was taken over by something else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("held body {0} is no longer controllable")]
pub struct BodyLost(pub EntityId);

/// Everything the beam tool needs from the world it acts on.
///
/// Capability calls report whether the target responded; an entity without
/// the capability is not an error.
pub trait BeamWorld {
    /// Closest hit along `ray` within `max_distance`, restricted to `mask`.
    fn raycast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit>;

    /// Returns false if `target` cannot be damaged.
    fn apply_damage(&mut self, target: EntityId, amount: f32) -> bool;

    /// Returns false if `target` cannot be repaired.
    fn apply_repair(&mut self, target: EntityId, amount: f32) -> bool;

    /// Take over a body's motion: suspend gravity and zero its velocities.
    /// Returns the flags it had before.
    fn try_pickup(&mut self, target: EntityId) -> Result<BodyFlags, PickupError>;

    fn body_position(&self, body: EntityId) -> Option<Vec3>;

    /// Write a held body's velocity for this tick.
    fn drive_body(&mut self, body: EntityId, velocity: Vec3) -> Result<(), BodyLost>;

    /// Restore `flags`, set `velocity`, clear angular velocity.
    fn release_body(&mut self, body: EntityId, flags: BodyFlags, velocity: Vec3);
}
