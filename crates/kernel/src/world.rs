use glam::Vec3;
use multitool_common::{BodyFlags, EntityId, LayerMask, Ray, RayHit, Transform};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::body::{BodyError, Collider, RigidBody};
use crate::raycast;

/// Standard gravity along -Y.
pub const DEFAULT_GRAVITY: Vec3 = Vec3::new(0.0, -9.81, 0.0);

/// An event record produced by every structural mutation to the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum WorldEvent {
    /// Entity was spawned with the given local transform.
    Spawned { id: EntityId, transform: Transform },
    /// Entity was despawned. Carries the world transform it had.
    Despawned { id: EntityId, transform: Transform },
    /// Entity local transform was updated.
    TransformUpdated {
        id: EntityId,
        old: Transform,
        new: Transform,
    },
    /// Entity was attached to (or detached from) a parent.
    Reparented {
        id: EntityId,
        parent: Option<EntityId>,
    },
    /// Simulation advanced one tick.
    Stepped { tick: u64, dt: f32 },
}

/// Per-entity data stored in the world.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityData {
    pub name: Option<String>,
    /// Relative to `parent` when set, otherwise world space.
    pub transform: Transform,
    pub parent: Option<EntityId>,
}

/// The authoritative world state.
///
/// Uses BTreeMap for deterministic iteration order. Bodies and colliders are
/// stored per component type, keyed by the owning entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    entities: BTreeMap<EntityId, EntityData>,
    bodies: BTreeMap<EntityId, RigidBody>,
    colliders: BTreeMap<EntityId, Collider>,
    gravity: Vec3,
    /// Height of the ground plane, if any. Bodies rest on it.
    #[serde(default)]
    floor: Option<f32>,
    tick: u64,
    elapsed: f32,
    /// Append-only event log of structural mutations.
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self::with_gravity(DEFAULT_GRAVITY)
    }
}

impl World {
    /// Create an empty world at tick 0 with standard gravity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            entities: BTreeMap::new(),
            bodies: BTreeMap::new(),
            colliders: BTreeMap::new(),
            gravity,
            floor: None,
            tick: 0,
            elapsed: 0.0,
            event_log: Vec::new(),
        }
    }

    /// Current simulation tick.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated seconds since tick 0.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn gravity(&self) -> Vec3 {
        self.gravity
    }

    /// Add a ground plane at height `y`.
    pub fn with_floor(mut self, y: f32) -> Self {
        self.floor = Some(y);
        self
    }

    pub fn floor(&self) -> Option<f32> {
        self.floor
    }

    /// Number of entities in the world.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    /// Read-only access to the event log.
    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Read-only access to all entities (BTreeMap for deterministic iteration).
    pub fn entities(&self) -> &BTreeMap<EntityId, EntityData> {
        &self.entities
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Spawn a new entity with the given transform. Returns its id.
    pub fn spawn(&mut self, transform: Transform) -> EntityId {
        let id = EntityId::new();
        self.spawn_with_id(id, transform);
        id
    }

    /// Spawn a named entity. Names are for diagnostics only.
    pub fn spawn_named(&mut self, name: impl Into<String>, transform: Transform) -> EntityId {
        let id = self.spawn(transform);
        if let Some(data) = self.entities.get_mut(&id) {
            data.name = Some(name.into());
        }
        id
    }

    /// Spawn an entity with a specific id.
    pub fn spawn_with_id(&mut self, id: EntityId, transform: Transform) {
        self.entities.insert(
            id,
            EntityData {
                name: None,
                transform,
                parent: None,
            },
        );
        self.event_log.push(WorldEvent::Spawned { id, transform });
    }

    /// Remove an entity, its components and its children. Returns its data if it existed.
    pub fn despawn(&mut self, id: EntityId) -> Option<EntityData> {
        let children: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, d)| d.parent == Some(id))
            .map(|(child, _)| *child)
            .collect();
        for child in children {
            self.despawn(child);
        }

        let transform = self.world_transform(id);
        let data = self.entities.remove(&id)?;
        self.bodies.remove(&id);
        self.colliders.remove(&id);
        self.event_log.push(WorldEvent::Despawned {
            id,
            transform: transform.unwrap_or(data.transform),
        });
        Some(data)
    }

    /// Get a reference to entity data.
    pub fn get(&self, id: EntityId) -> Option<&EntityData> {
        self.entities.get(&id)
    }

    pub fn name(&self, id: EntityId) -> Option<&str> {
        self.entities.get(&id).and_then(|d| d.name.as_deref())
    }

    /// Update an entity's local transform and log the change.
    pub fn set_transform(&mut self, id: EntityId, new: Transform) -> bool {
        if let Some(data) = self.entities.get_mut(&id) {
            let old = data.transform;
            data.transform = new;
            self.event_log
                .push(WorldEvent::TransformUpdated { id, old, new });
            true
        } else {
            false
        }
    }

    /// Resolve the world-space transform by walking the parent chain.
    pub fn world_transform(&self, id: EntityId) -> Option<Transform> {
        let data = self.entities.get(&id)?;
        match data.parent {
            Some(parent) => {
                let parent_world = self.world_transform(parent)?;
                Some(parent_world.mul_transform(&data.transform))
            }
            None => Some(data.transform),
        }
    }

    pub fn world_position(&self, id: EntityId) -> Option<Vec3> {
        self.world_transform(id).map(|t| t.position)
    }

    /// Attach `child` to `parent`, keeping the child's local transform as-is.
    ///
    /// Returns false if either entity is missing or the link would form a cycle.
    pub fn set_parent(&mut self, child: EntityId, parent: EntityId) -> bool {
        if child == parent || !self.entities.contains_key(&parent) {
            return false;
        }
        let mut cursor = Some(parent);
        while let Some(id) = cursor {
            if id == child {
                return false;
            }
            cursor = self.entities.get(&id).and_then(|d| d.parent);
        }
        let Some(data) = self.entities.get_mut(&child) else {
            return false;
        };
        data.parent = Some(parent);
        self.event_log.push(WorldEvent::Reparented {
            id: child,
            parent: Some(parent),
        });
        true
    }

    /// Detach an entity from its parent, preserving its world transform.
    pub fn clear_parent(&mut self, child: EntityId) -> bool {
        let Some(world) = self.world_transform(child) else {
            return false;
        };
        let Some(data) = self.entities.get_mut(&child) else {
            return false;
        };
        if data.parent.take().is_none() {
            return false;
        }
        data.transform = world;
        self.event_log.push(WorldEvent::Reparented {
            id: child,
            parent: None,
        });
        true
    }

    // --- RigidBody ---
    pub fn insert_body(&mut self, id: EntityId, body: RigidBody) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        self.bodies.insert(id, body);
        true
    }

    pub fn body(&self, id: EntityId) -> Option<&RigidBody> {
        self.bodies.get(&id)
    }

    pub fn body_mut(&mut self, id: EntityId) -> Option<&mut RigidBody> {
        self.bodies.get_mut(&id)
    }

    // --- Collider ---
    pub fn insert_collider(&mut self, id: EntityId, collider: Collider) -> bool {
        if !self.entities.contains_key(&id) {
            return false;
        }
        self.colliders.insert(id, collider);
        true
    }

    pub fn collider(&self, id: EntityId) -> Option<&Collider> {
        self.colliders.get(&id)
    }

    /// Closest collider hit along `ray` within `max_distance`, restricted to `mask`.
    pub fn raycast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for (id, collider) in &self.colliders {
            if !collider.layers.intersects(mask) {
                continue;
            }
            let Some(center) = self.world_position(*id) else {
                continue;
            };
            let Some((distance, normal)) = raycast::intersect(&ray, &collider.shape, center) else {
                continue;
            };
            if distance > max_distance {
                continue;
            }
            if best.is_none_or(|b| distance < b.distance) {
                best = Some(RayHit {
                    entity: *id,
                    point: ray.at(distance),
                    normal,
                    distance,
                });
            }
        }
        best
    }

    /// Take over a body's motion: suspend gravity, zero its velocities, mark it held.
    ///
    /// Returns the flags it had so the controller can restore them.
    pub fn grab_body(&mut self, id: EntityId) -> Result<BodyFlags, BodyError> {
        if !self.entities.contains_key(&id) {
            return Err(BodyError::NotFound(id));
        }
        let body = self.bodies.get_mut(&id).ok_or(BodyError::NoBody(id))?;
        if body.is_kinematic {
            return Err(BodyError::Kinematic(id));
        }
        if body.held {
            return Err(BodyError::AlreadyHeld(id));
        }
        let flags = body.flags();
        body.use_gravity = false;
        body.velocity = Vec3::ZERO;
        body.angular_velocity = Vec3::ZERO;
        body.held = true;
        tracing::debug!(entity = %id, "body grabbed");
        Ok(flags)
    }

    /// Set a held body's velocity. Returns its world position, or `None` once the
    /// body is gone or no longer held.
    pub fn drive_body(&mut self, id: EntityId, velocity: Vec3) -> Option<Vec3> {
        let body = self.bodies.get_mut(&id)?;
        if !body.held {
            return None;
        }
        body.velocity = velocity;
        self.world_position(id)
    }

    /// Hand a held body back to the simulation with the given throw velocity.
    pub fn release_body(&mut self, id: EntityId, flags: BodyFlags, velocity: Vec3) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        if !body.held {
            return false;
        }
        body.held = false;
        body.use_gravity = flags.use_gravity;
        body.is_kinematic = flags.is_kinematic;
        body.velocity = velocity;
        body.angular_velocity = Vec3::ZERO;
        tracing::debug!(entity = %id, ?velocity, "body released");
        true
    }

    /// Pin a body in place: kinematic, no gravity, no velocity, not held.
    pub fn freeze_body(&mut self, id: EntityId) -> bool {
        let Some(body) = self.bodies.get_mut(&id) else {
            return false;
        };
        *body = RigidBody {
            mass: body.mass,
            ..RigidBody::kinematic()
        };
        true
    }

    /// Advance the simulation by `dt` seconds.
    ///
    /// Free, non-kinematic root bodies are integrated with semi-implicit Euler.
    /// Held bodies keep the velocity their controller set and ignore gravity.
    pub fn step(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let gravity = self.gravity;
        for (id, body) in self.bodies.iter_mut() {
            if body.is_kinematic {
                continue;
            }
            let Some(data) = self.entities.get_mut(id) else {
                continue;
            };
            if data.parent.is_some() {
                continue;
            }
            if body.use_gravity && !body.held {
                body.velocity += gravity * dt;
            }
            data.transform.position += body.velocity * dt;

            if let Some(floor) = self.floor {
                let half = self
                    .colliders
                    .get(id)
                    .map_or(0.0, |c| c.shape.half_height());
                let rest = floor + half;
                if data.transform.position.y < rest {
                    data.transform.position.y = rest;
                    body.velocity.y = body.velocity.y.max(0.0);
                }
            }
        }
        self.tick += 1;
        self.elapsed += dt;
        self.event_log.push(WorldEvent::Stepped {
            tick: self.tick,
            dt,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world_with_ball(at: Vec3) -> (World, EntityId) {
        let mut w = World::new();
        let id = w.spawn(Transform::from_position(at));
        w.insert_body(id, RigidBody::default());
        w.insert_collider(id, Collider::sphere(0.5, LayerMask::LIFTABLE));
        (w, id)
    }

    #[test]
    fn world_starts_empty() {
        let w = World::new();
        assert_eq!(w.tick(), 0);
        assert_eq!(w.entity_count(), 0);
    }

    #[test]
    fn spawn_and_despawn() {
        let mut w = World::new();
        let id = w.spawn(Transform::default());
        assert_eq!(w.entity_count(), 1);
        assert!(w.get(id).is_some());

        let data = w.despawn(id);
        assert!(data.is_some());
        assert_eq!(w.entity_count(), 0);
        assert!(w.despawn(id).is_none());
    }

    #[test]
    fn despawn_removes_components_and_children() {
        let (mut w, ball) = world_with_ball(Vec3::ZERO);
        let child = w.spawn(Transform::default());
        assert!(w.set_parent(child, ball));

        w.despawn(ball);
        assert!(w.body(ball).is_none());
        assert!(w.collider(ball).is_none());
        assert!(!w.contains(child));
    }

    #[test]
    fn step_increments_tick_and_elapsed() {
        let mut w = World::new();
        w.step(0.5);
        w.step(0.5);
        w.step(0.5);
        assert_eq!(w.tick(), 3);
        assert!((w.elapsed() - 1.5).abs() < 1e-6);
    }

    #[test]
    fn events_are_recorded() {
        let mut w = World::new();
        let id = w.spawn(Transform::default());
        w.step(0.1);
        w.despawn(id);
        assert_eq!(w.events().len(), 3); // spawn + step + despawn
    }

    #[test]
    fn drain_events_clears_log() {
        let mut w = World::new();
        w.spawn(Transform::default());
        let events = w.drain_events();
        assert_eq!(events.len(), 1);
        assert!(w.events().is_empty());
    }

    #[test]
    fn gravity_accelerates_free_bodies() {
        let (mut w, id) = world_with_ball(Vec3::new(0.0, 10.0, 0.0));
        w.step(1.0);
        let body = w.body(id).unwrap();
        assert!((body.velocity.y + 9.81).abs() < 1e-4);
        assert!(w.world_position(id).unwrap().y < 10.0);
    }

    #[test]
    fn kinematic_bodies_do_not_move() {
        let mut w = World::new();
        let id = w.spawn(Transform::from_position(Vec3::ONE));
        w.insert_body(id, RigidBody::kinematic());
        w.step(1.0);
        assert_eq!(w.world_position(id), Some(Vec3::ONE));
    }

    #[test]
    fn raycast_picks_closest_in_mask() {
        let mut w = World::new();
        let near = w.spawn(Transform::from_position(Vec3::new(0.0, 0.0, 3.0)));
        w.insert_collider(near, Collider::sphere(0.5, LayerMask::MINABLE));
        let far = w.spawn(Transform::from_position(Vec3::new(0.0, 0.0, 6.0)));
        w.insert_collider(far, Collider::sphere(0.5, LayerMask::MINABLE));
        let other = w.spawn(Transform::from_position(Vec3::new(0.0, 0.0, 1.5)));
        w.insert_collider(other, Collider::sphere(0.5, LayerMask::LIFTABLE));

        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        let hit = w.raycast(ray, 10.0, LayerMask::MINABLE).unwrap();
        assert_eq!(hit.entity, near);
        assert!((hit.distance - 2.5).abs() < 1e-5);
    }

    #[test]
    fn raycast_respects_max_distance() {
        let (w, _) = world_with_ball(Vec3::new(0.0, 0.0, 8.0));
        let ray = Ray::new(Vec3::ZERO, Vec3::Z);
        assert!(w.raycast(ray, 5.0, LayerMask::LIFTABLE).is_none());
        assert!(w.raycast(ray, 10.0, LayerMask::LIFTABLE).is_some());
    }

    #[test]
    fn grab_saves_flags_and_suspends_gravity() {
        let (mut w, id) = world_with_ball(Vec3::ZERO);
        w.body_mut(id).unwrap().velocity = Vec3::ONE;
        let flags = w.grab_body(id).unwrap();
        assert!(flags.use_gravity);
        let body = w.body(id).unwrap();
        assert!(!body.use_gravity);
        assert!(body.held);
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn grab_rejects_kinematic_and_held() {
        let (mut w, id) = world_with_ball(Vec3::ZERO);
        assert!(w.grab_body(id).is_ok());
        assert_eq!(w.grab_body(id), Err(BodyError::AlreadyHeld(id)));

        let pinned = w.spawn(Transform::default());
        w.insert_body(pinned, RigidBody::kinematic());
        assert_eq!(w.grab_body(pinned), Err(BodyError::Kinematic(pinned)));

        let bare = w.spawn(Transform::default());
        assert_eq!(w.grab_body(bare), Err(BodyError::NoBody(bare)));
    }

    #[test]
    fn held_body_ignores_gravity_but_keeps_driven_velocity() {
        let (mut w, id) = world_with_ball(Vec3::ZERO);
        let flags = w.grab_body(id).unwrap();
        w.drive_body(id, Vec3::new(1.0, 0.0, 0.0));
        w.step(1.0);
        assert_eq!(w.world_position(id), Some(Vec3::new(1.0, 0.0, 0.0)));

        assert!(w.release_body(id, flags, Vec3::new(0.0, 0.0, 2.0)));
        let body = w.body(id).unwrap();
        assert!(body.use_gravity);
        assert!(!body.held);
        assert_eq!(body.velocity, Vec3::new(0.0, 0.0, 2.0));
        assert!(!w.release_body(id, flags, Vec3::ZERO));
    }

    #[test]
    fn drive_fails_once_body_is_frozen() {
        let (mut w, id) = world_with_ball(Vec3::ZERO);
        w.grab_body(id).unwrap();
        assert!(w.freeze_body(id));
        assert!(w.drive_body(id, Vec3::X).is_none());
    }

    #[test]
    fn parenting_composes_world_transform() {
        let mut w = World::new();
        let socket = w.spawn(Transform::from_position(Vec3::new(5.0, 0.0, 0.0)));
        let cargo = w.spawn(Transform::from_position(Vec3::new(1.0, 1.0, 1.0)));
        assert!(w.set_parent(cargo, socket));
        w.set_transform(cargo, Transform::default());
        assert_eq!(w.world_position(cargo), Some(Vec3::new(5.0, 0.0, 0.0)));

        assert!(w.clear_parent(cargo));
        assert_eq!(w.get(cargo).unwrap().transform.position, Vec3::new(5.0, 0.0, 0.0));
    }

    #[test]
    fn set_parent_rejects_cycles() {
        let mut w = World::new();
        let a = w.spawn(Transform::default());
        let b = w.spawn(Transform::default());
        assert!(w.set_parent(b, a));
        assert!(!w.set_parent(a, b));
        assert!(!w.set_parent(a, a));
    }

    #[test]
    fn btreemap_gives_deterministic_iteration() {
        let mut w = World::new();
        for _ in 0..100 {
            w.spawn(Transform::default());
        }
        let entity_keys: Vec<EntityId> = w.entities().keys().copied().collect();
        let mut sorted = entity_keys.clone();
        sorted.sort();
        assert_eq!(entity_keys, sorted);
    }

    #[test]
    fn bodies_rest_on_the_floor() {
        let mut w = World::new().with_floor(0.0);
        let id = w.spawn(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)));
        w.insert_body(id, RigidBody::default());
        w.insert_collider(id, Collider::sphere(0.5, LayerMask::LIFTABLE));
        for _ in 0..120 {
            w.step(1.0 / 60.0);
        }
        let p = w.world_position(id).unwrap();
        assert!((p.y - 0.5).abs() < 1e-5);
        assert_eq!(w.body(id).unwrap().velocity.y, 0.0);
    }
}
