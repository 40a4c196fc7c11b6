//! Delivery objectives: carry an object to its socket and it locks into place.
//!
//! Proximity detection belongs to the environment. This module only reacts to
//! an "entered" signal for an objective and its socket.

use glam::{EulerRot, Quat, Vec3};
use multitool_common::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::event::{ObjectiveEvent, ObjectiveId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SocketId(pub u32);

/// A fixed anchor that a transport objective snaps onto.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SnapSocket {
    pub entity: EntityId,
    pub detection_radius: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransportState {
    Free,
    Snapped,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransportObjective {
    pub object: EntityId,
    pub socket: SocketId,
    pub snap_distance: f32,
    /// Euler angles in degrees, applied Z then X then Y.
    pub rotation_offset: Vec3,
    pub state: TransportState,
}

impl TransportObjective {
    pub fn snap_rotation(&self) -> Quat {
        let r = self.rotation_offset;
        Quat::from_euler(
            EulerRot::YXZ,
            r.y.to_radians(),
            r.x.to_radians(),
            r.z.to_radians(),
        )
    }

    pub fn is_snapped(&self) -> bool {
        self.state == TransportState::Snapped
    }
}

/// The world operations a snap needs.
pub trait SnapTarget {
    /// Reparent `object` under `socket` with zero local offset and the given
    /// local rotation, and pin its body. Returns false if it could not be done.
    fn attach(&mut self, object: EntityId, socket: EntityId, local_rotation: Quat) -> bool;
}

/// Owns all sockets and transport objectives.
#[derive(Debug, Clone, Default)]
pub struct TransportSystem {
    sockets: BTreeMap<SocketId, SnapSocket>,
    objectives: BTreeMap<ObjectiveId, TransportObjective>,
    next_socket: u32,
    next_objective: u32,
}

impl TransportSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_socket(&mut self, entity: EntityId, detection_radius: f32) -> SocketId {
        let id = SocketId(self.next_socket);
        self.next_socket += 1;
        self.sockets.insert(
            id,
            SnapSocket {
                entity,
                detection_radius: detection_radius.max(0.0),
            },
        );
        id
    }

    pub fn add_objective(
        &mut self,
        object: EntityId,
        socket: SocketId,
        snap_distance: f32,
        rotation_offset: Vec3,
    ) -> ObjectiveId {
        let id = ObjectiveId(self.next_objective);
        self.next_objective += 1;
        self.objectives.insert(
            id,
            TransportObjective {
                object,
                socket,
                snap_distance: snap_distance.max(0.0),
                rotation_offset,
                state: TransportState::Free,
            },
        );
        id
    }

    pub fn socket(&self, id: SocketId) -> Option<&SnapSocket> {
        self.sockets.get(&id)
    }

    pub fn objective(&self, id: ObjectiveId) -> Option<&TransportObjective> {
        self.objectives.get(&id)
    }

    /// Objectives that have not snapped yet, paired with their socket.
    pub fn free(&self) -> impl Iterator<Item = (ObjectiveId, &TransportObjective, &SnapSocket)> + '_ {
        self.objectives.iter().filter_map(|(id, obj)| {
            if obj.is_snapped() {
                return None;
            }
            let socket = self.sockets.get(&obj.socket)?;
            Some((*id, obj, socket))
        })
    }

    /// React to `objective`'s object entering `socket`'s detection volume.
    ///
    /// Snaps at most once. A signal for a socket other than the objective's
    /// own, for an unknown objective, or for an already snapped one is ignored.
    pub fn on_entered(
        &mut self,
        objective: ObjectiveId,
        socket: SocketId,
        target: &mut impl SnapTarget,
    ) -> Option<ObjectiveEvent> {
        let obj = self.objectives.get_mut(&objective)?;
        if obj.is_snapped() || obj.socket != socket {
            return None;
        }
        let anchor = self.sockets.get(&socket)?;
        if !target.attach(obj.object, anchor.entity, obj.snap_rotation()) {
            tracing::debug!(%objective, "snap target refused attach");
            return None;
        }
        obj.state = TransportState::Snapped;
        tracing::info!(%objective, object = %obj.object, "object snapped to socket");
        Some(ObjectiveEvent::Snapped(objective))
    }
}
