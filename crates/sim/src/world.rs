use std::collections::BTreeMap;

use glam::{Quat, Vec3};
use multitool_beam::{BeamWorld, BodyLost, PickupError};
use multitool_common::{BodyFlags, EntityId, LayerMask, Ray, RayHit, Transform};
use multitool_kernel::{BodyError, Collider, RigidBody, World};
use multitool_objectives::SnapTarget;
use multitool_targets::{
    AppearanceSwap, Damaged, Destroyable, Destruction, RepairCompletion, RepairOutcome, Repairable,
};

/// A target finished during a tool tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetEvent {
    Mined {
        entity: EntityId,
        label: String,
        /// The spawned drop object, if the rock had one.
        drop: Option<EntityId>,
        destruction: Destruction,
    },
    Repaired {
        entity: EntityId,
        label: String,
        completion: RepairCompletion,
    },
}

/// How to spawn the object a broken rock leaves behind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DropTemplate {
    pub radius: f32,
    pub mass: f32,
    pub liftable: bool,
}

/// Kernel world plus the target components the beam tool acts on.
#[derive(Debug, Default)]
pub struct SimWorld {
    kernel: World,
    destroyables: BTreeMap<EntityId, Destroyable>,
    repairables: BTreeMap<EntityId, Repairable>,
    appearances: BTreeMap<EntityId, AppearanceSwap>,
    drop_templates: BTreeMap<String, DropTemplate>,
    pending: Vec<TargetEvent>,
}

impl SimWorld {
    pub fn new(kernel: World) -> Self {
        Self {
            kernel,
            ..Self::default()
        }
    }

    pub fn kernel(&self) -> &World {
        &self.kernel
    }

    pub fn kernel_mut(&mut self) -> &mut World {
        &mut self.kernel
    }

    pub fn add_drop_template(&mut self, name: impl Into<String>, template: DropTemplate) {
        self.drop_templates.insert(name.into(), template);
    }

    /// A minable sphere.
    pub fn add_rock(
        &mut self,
        name: &str,
        position: Vec3,
        radius: f32,
        destroyable: Destroyable,
    ) -> EntityId {
        let id = self
            .kernel
            .spawn_named(name, Transform::from_position(position));
        self.kernel
            .insert_collider(id, Collider::sphere(radius, LayerMask::MINABLE));
        self.destroyables.insert(id, destroyable);
        id
    }

    /// A repairable box.
    pub fn add_repairable(
        &mut self,
        name: &str,
        position: Vec3,
        half_extents: Vec3,
        repairable: Repairable,
    ) -> EntityId {
        let id = self
            .kernel
            .spawn_named(name, Transform::from_position(position));
        self.kernel
            .insert_collider(id, Collider::cuboid(half_extents, LayerMask::REPAIRABLE));
        self.repairables.insert(id, repairable);
        id
    }

    /// A physics sphere the tractor can pick up.
    pub fn add_liftable(&mut self, name: &str, position: Vec3, radius: f32, body: RigidBody) -> EntityId {
        let id = self
            .kernel
            .spawn_named(name, Transform::from_position(position));
        self.kernel.insert_body(id, body);
        self.kernel
            .insert_collider(id, Collider::sphere(radius, LayerMask::LIFTABLE));
        id
    }

    /// An anchor point with no collider.
    pub fn add_anchor(&mut self, name: &str, position: Vec3) -> EntityId {
        self.kernel
            .spawn_named(name, Transform::from_position(position))
    }

    /// First entity carrying `name`.
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.kernel
            .entities()
            .iter()
            .find(|(_, data)| data.name.as_deref() == Some(name))
            .map(|(id, _)| *id)
    }

    /// Name of the entity, or its short id.
    pub fn label(&self, id: EntityId) -> String {
        self.kernel
            .name(id)
            .map_or_else(|| id.short(), str::to_string)
    }

    pub fn destroyable(&self, id: EntityId) -> Option<&Destroyable> {
        self.destroyables.get(&id)
    }

    pub fn repairable(&self, id: EntityId) -> Option<&Repairable> {
        self.repairables.get(&id)
    }

    /// Appearance swapped in once `id` was repaired.
    pub fn appearance(&self, id: EntityId) -> Option<&AppearanceSwap> {
        self.appearances.get(&id)
    }

    /// Completions since the last drain, in the order they happened.
    pub fn drain_target_events(&mut self) -> Vec<TargetEvent> {
        std::mem::take(&mut self.pending)
    }

    fn break_apart(&mut self, target: EntityId, destruction: Destruction) {
        let label = self.label(target);
        let position = self.kernel.world_position(target).unwrap_or(Vec3::ZERO);
        self.kernel.despawn(target);
        let drop = destruction
            .drop
            .as_deref()
            .and_then(|name| self.spawn_drop(name, position));
        tracing::info!(
            entity = %label,
            drop = ?destruction.drop,
            effect = ?destruction.break_effect,
            "destroyable broke"
        );
        self.pending.push(TargetEvent::Mined {
            entity: target,
            label,
            drop,
            destruction,
        });
    }

    fn spawn_drop(&mut self, name: &str, position: Vec3) -> Option<EntityId> {
        let Some(template) = self.drop_templates.get(name).copied() else {
            tracing::debug!(drop = name, "no drop template, skipping spawn");
            return None;
        };
        let id = self
            .kernel
            .spawn_named(name, Transform::from_position(position));
        if template.liftable {
            self.kernel.insert_body(
                id,
                RigidBody {
                    mass: template.mass,
                    ..RigidBody::default()
                },
            );
            self.kernel
                .insert_collider(id, Collider::sphere(template.radius, LayerMask::LIFTABLE));
        }
        Some(id)
    }
}

fn pickup_error(err: BodyError) -> PickupError {
    match err {
        BodyError::NotFound(id) => PickupError::NotFound(id),
        BodyError::NoBody(id) => PickupError::NoBody(id),
        BodyError::Kinematic(id) => PickupError::Kinematic(id),
        BodyError::AlreadyHeld(id) => PickupError::AlreadyHeld(id),
    }
}

impl BeamWorld for SimWorld {
    fn raycast(&self, ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
        self.kernel.raycast(ray, max_distance, mask)
    }

    fn apply_damage(&mut self, target: EntityId, amount: f32) -> bool {
        let Some(destroyable) = self.destroyables.remove(&target) else {
            return false;
        };
        match destroyable.apply_damage(amount) {
            Damaged::Alive(destroyable) => {
                self.destroyables.insert(target, destroyable);
            }
            Damaged::Destroyed(destruction) => self.break_apart(target, destruction),
        }
        true
    }

    fn apply_repair(&mut self, target: EntityId, amount: f32) -> bool {
        let Some(repairable) = self.repairables.get_mut(&target) else {
            return false;
        };
        match repairable.apply_repair(amount) {
            RepairOutcome::Completed(completion) => {
                self.appearances
                    .insert(target, completion.appearance.clone());
                let label = self.label(target);
                tracing::info!(entity = %label, mesh = ?completion.appearance.mesh, "repair complete");
                self.pending.push(TargetEvent::Repaired {
                    entity: target,
                    label,
                    completion,
                });
            }
            RepairOutcome::Progressed { progress } => {
                tracing::trace!(entity = %target, progress, "repair progressed");
            }
            RepairOutcome::Ignored => {}
        }
        true
    }

    fn try_pickup(&mut self, target: EntityId) -> Result<BodyFlags, PickupError> {
        self.kernel.grab_body(target).map_err(pickup_error)
    }

    fn body_position(&self, body: EntityId) -> Option<Vec3> {
        self.kernel.body(body)?;
        self.kernel.world_position(body)
    }

    fn drive_body(&mut self, body: EntityId, velocity: Vec3) -> Result<(), BodyLost> {
        self.kernel
            .drive_body(body, velocity)
            .map(|_| ())
            .ok_or(BodyLost(body))
    }

    fn release_body(&mut self, body: EntityId, flags: BodyFlags, velocity: Vec3) {
        if !self.kernel.release_body(body, flags, velocity) {
            tracing::debug!(entity = %body, "release of a body no longer held");
        }
    }
}

impl SnapTarget for SimWorld {
    fn attach(&mut self, object: EntityId, socket: EntityId, local_rotation: Quat) -> bool {
        let Some(scale) = self.kernel.get(object).map(|d| d.transform.scale) else {
            return false;
        };
        if !self.kernel.set_parent(object, socket) {
            return false;
        }
        self.kernel.set_transform(
            object,
            Transform {
                position: Vec3::ZERO,
                rotation: local_rotation,
                scale,
            },
        );
        self.kernel.freeze_body(object);
        true
    }
}
