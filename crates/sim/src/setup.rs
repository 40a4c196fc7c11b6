use std::collections::BTreeMap;

use multitool_beam::ToolPose;
use multitool_kernel::{RigidBody, World};
use multitool_objectives::ObjectiveEvent;
use multitool_targets::{AppearanceSwap, Destroyable, Repairable};

use crate::event::GameEvent;
use crate::scene::{SceneConfig, SceneError};
use crate::session::{Session, SessionBuilder};
use crate::world::{DropTemplate, SimWorld};

/// Populate a world from `scene` and wire up its tool, objectives and timer.
pub fn build_session(scene: &SceneConfig) -> Result<Session, SceneError> {
    scene.validate()?;

    let kernel = match scene.floor {
        Some(y) => World::new().with_floor(y),
        None => World::new(),
    };
    let mut world = SimWorld::new(kernel);
    let mut objectives = Vec::new();

    for drop in &scene.drops {
        world.add_drop_template(
            drop.name.as_str(),
            DropTemplate {
                radius: drop.radius,
                mass: drop.mass,
                liftable: drop.liftable,
            },
        );
    }

    for rock in &scene.rocks {
        let mut destroyable = Destroyable::new(rock.max_health);
        if let Some(drop) = &rock.drop {
            destroyable = destroyable.with_drop(drop.as_str());
        }
        if let Some(effect) = &rock.break_effect {
            destroyable = destroyable.with_break_effect(effect.as_str());
        }
        if let Some(sound) = &rock.break_sound {
            destroyable = destroyable.with_break_sound(sound.as_str());
        }
        let id = world.add_rock(&rock.name, rock.position, rock.radius, destroyable);
        if rock.objective {
            objectives.push(ObjectiveEvent::Mined(id));
        }
    }

    for spec in &scene.repairables {
        let mut repairable = Repairable::new(spec.max_repair_time).with_appearance(AppearanceSwap {
            mesh: spec.repaired_mesh.clone(),
            material: spec.repaired_material.clone(),
        });
        if let Some(effect) = &spec.complete_effect {
            repairable = repairable.with_complete_effect(effect.as_str());
        }
        if let Some(sound) = &spec.complete_sound {
            repairable = repairable.with_complete_sound(sound.as_str());
        }
        let id = world.add_repairable(&spec.name, spec.position, spec.half_extents, repairable);
        if spec.objective {
            objectives.push(ObjectiveEvent::Repaired(id));
        }
    }

    let mut liftables = BTreeMap::new();
    for spec in &scene.liftables {
        let body = RigidBody {
            mass: spec.mass,
            use_gravity: spec.gravity && !spec.kinematic,
            is_kinematic: spec.kinematic,
            ..RigidBody::default()
        };
        let id = world.add_liftable(&spec.name, spec.position, spec.radius, body);
        liftables.insert(spec.name.as_str(), id);
    }

    let anchors: Vec<_> = scene
        .sockets
        .iter()
        .map(|spec| (spec, world.add_anchor(&spec.name, spec.position)))
        .collect();

    let mut builder = SessionBuilder::new(world);
    builder.tool(
        scene.tool.beam.clone(),
        ToolPose::new(scene.tool.position, scene.tool.forward),
    );
    for event in objectives {
        builder.objective(event);
    }
    let mut sockets = BTreeMap::new();
    for (spec, anchor) in anchors {
        sockets.insert(spec.name.as_str(), builder.socket(anchor, spec.detection_radius));
    }
    for spec in &scene.transports {
        let object = liftables.get(spec.object.as_str()).copied();
        let socket = sockets.get(spec.socket.as_str()).copied();
        let (Some(object), Some(socket)) = (object, socket) else {
            // validate() already rejects dangling names.
            continue;
        };
        builder.transport(
            spec.name.as_str(),
            object,
            socket,
            spec.snap_distance,
            spec.rotation_offset,
        );
    }
    if let Some(limit) = scene.mission_time {
        builder.mission_time(limit);
    }

    let session = builder.build()?;
    tracing::info!(
        scene = %scene.name,
        entities = session.world().kernel().entity_count(),
        objectives = session.tracker().total(),
        "scene loaded"
    );
    Ok(session)
}

/// Build the session for `scene` and play its script to the end.
pub fn run_scene(scene: &SceneConfig) -> Result<(Session, Vec<GameEvent>), SceneError> {
    let mut session = build_session(scene)?;
    let events = session.run_script(&scene.script, scene.timestep);
    Ok((session, events))
}
