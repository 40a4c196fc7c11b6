use glam::Vec3;
use multitool_common::{BodyFlags, EntityId, LayerMask};
use serde::{Deserialize, Serialize};

/// Simulated rigid body attached to an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidBody {
    pub mass: f32,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub use_gravity: bool,
    pub is_kinematic: bool,
    /// Set while an external controller (the tractor) owns this body's motion.
    pub held: bool,
}

impl Default for RigidBody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            use_gravity: true,
            is_kinematic: false,
            held: false,
        }
    }
}

impl RigidBody {
    pub fn kinematic() -> Self {
        Self {
            is_kinematic: true,
            use_gravity: false,
            ..Self::default()
        }
    }

    pub fn flags(&self) -> BodyFlags {
        BodyFlags {
            use_gravity: self.use_gravity,
            is_kinematic: self.is_kinematic,
        }
    }
}

/// Collision shape, centred on the entity's world position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Axis-aligned; entity rotation is ignored.
    Box { half_extents: Vec3 },
}

impl Shape {
    /// Distance from the centre to the bottom of the shape.
    pub fn half_height(&self) -> f32 {
        match *self {
            Self::Sphere { radius } => radius,
            Self::Box { half_extents } => half_extents.y,
        }
    }
}

impl Default for Shape {
    fn default() -> Self {
        Self::Box {
            half_extents: Vec3::splat(0.5),
        }
    }
}

/// Collider component: a shape plus the layers it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub shape: Shape,
    pub layers: LayerMask,
}

impl Collider {
    pub fn sphere(radius: f32, layers: LayerMask) -> Self {
        Self {
            shape: Shape::Sphere { radius },
            layers,
        }
    }

    pub fn cuboid(half_extents: Vec3, layers: LayerMask) -> Self {
        Self {
            shape: Shape::Box { half_extents },
            layers,
        }
    }
}

/// Reasons a body cannot be taken over by a controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BodyError {
    #[error("entity {0} not found")]
    NotFound(EntityId),
    #[error("entity {0} has no rigid body")]
    NoBody(EntityId),
    #[error("body {0} is kinematic")]
    Kinematic(EntityId),
    #[error("body {0} is already held")]
    AlreadyHeld(EntityId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_height_per_shape() {
        assert_eq!(Shape::Sphere { radius: 0.4 }.half_height(), 0.4);
        assert_eq!(
            Shape::Box {
                half_extents: Vec3::new(1.0, 2.0, 3.0)
            }
            .half_height(),
            2.0
        );
    }

    #[test]
    fn default_body_is_dynamic_with_gravity() {
        let body = RigidBody::default();
        assert!(body.use_gravity);
        assert!(!body.is_kinematic);
        assert!(!body.held);
    }

    #[test]
    fn flags_snapshot_matches_body() {
        let body = RigidBody::kinematic();
        assert_eq!(
            body.flags(),
            BodyFlags {
                use_gravity: false,
                is_kinematic: true
            }
        );
    }
}
