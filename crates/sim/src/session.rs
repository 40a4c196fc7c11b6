//! The driver loop: one [`Session::step`] per simulation tick.

use std::collections::BTreeMap;

use glam::Vec3;
use multitool_beam::{
    BeamAction, BeamConfig, BeamTool, ConfigError, EffectLog, EffectRequest, TickContext,
    TickReport, ToolMode, ToolPose,
};
use multitool_common::EntityId;
use multitool_input::{Action, InputCollector};
use multitool_objectives::{
    MissionTimer, ObjectiveEvent, ObjectiveId, ObjectiveTracker, SocketId, TrackerOutcome,
    TransportSystem,
};
use serde::Serialize;

use crate::event::{GameEvent, Outcome};
use crate::scene::ScriptStep;
use crate::world::{SimWorld, TargetEvent};

/// Assembles a session. The objective set is fixed once [`build`](Self::build) runs.
#[derive(Debug)]
pub struct SessionBuilder {
    world: SimWorld,
    config: BeamConfig,
    pose: ToolPose,
    transport: TransportSystem,
    transport_names: BTreeMap<ObjectiveId, String>,
    objectives: Vec<ObjectiveEvent>,
    mission_time: Option<f32>,
}

impl SessionBuilder {
    pub fn new(world: SimWorld) -> Self {
        Self {
            world,
            config: BeamConfig::default(),
            pose: ToolPose::new(Vec3::ZERO, Vec3::Z),
            transport: TransportSystem::new(),
            transport_names: BTreeMap::new(),
            objectives: Vec::new(),
            mission_time: None,
        }
    }

    pub fn world_mut(&mut self) -> &mut SimWorld {
        &mut self.world
    }

    pub fn tool(&mut self, config: BeamConfig, pose: ToolPose) -> &mut Self {
        self.config = config;
        self.pose = pose;
        self
    }

    /// Count `event` toward the win.
    pub fn objective(&mut self, event: ObjectiveEvent) -> &mut Self {
        self.objectives.push(event);
        self
    }

    pub fn socket(&mut self, entity: EntityId, detection_radius: f32) -> SocketId {
        self.transport.add_socket(entity, detection_radius)
    }

    /// Register a delivery objective; it always counts toward the win.
    pub fn transport(
        &mut self,
        name: impl Into<String>,
        object: EntityId,
        socket: SocketId,
        snap_distance: f32,
        rotation_offset: Vec3,
    ) -> ObjectiveId {
        let id = self
            .transport
            .add_objective(object, socket, snap_distance, rotation_offset);
        self.transport_names.insert(id, name.into());
        self.objectives.push(ObjectiveEvent::Snapped(id));
        id
    }

    pub fn mission_time(&mut self, seconds: f32) -> &mut Self {
        self.mission_time = Some(seconds);
        self
    }

    pub fn build(self) -> Result<Session, ConfigError> {
        let tool = BeamTool::new(self.config)?;
        let timer = self.mission_time.map(|seconds| {
            let mut timer = MissionTimer::new(seconds);
            timer.start();
            timer
        });
        tracing::debug!(
            objectives = self.objectives.len(),
            time_limit = ?self.mission_time,
            "session ready"
        );
        Ok(Session {
            world: self.world,
            tool,
            input: InputCollector::new(),
            pose: self.pose,
            effects: EffectLog::new(),
            tracker: ObjectiveTracker::new(self.objectives),
            transport: self.transport,
            transport_names: self.transport_names,
            timer,
            paused: false,
            outcome: None,
            ticks: 0,
            last_action: BeamAction::Idle,
            world_events: 0,
        })
    }
}

/// End-of-run numbers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub ticks: u64,
    pub elapsed: f32,
    pub mode: ToolMode,
    pub completed: usize,
    pub total: usize,
    pub progress: f32,
    pub outcome: Option<Outcome>,
    pub time_remaining: Option<f32>,
    pub entities: usize,
    /// Kernel events recorded over the whole run.
    pub world_events: usize,
}

/// One player with one tool in one world.
#[derive(Debug)]
pub struct Session {
    world: SimWorld,
    tool: BeamTool,
    input: InputCollector,
    pose: ToolPose,
    effects: EffectLog,
    tracker: ObjectiveTracker,
    transport: TransportSystem,
    transport_names: BTreeMap<ObjectiveId, String>,
    timer: Option<MissionTimer>,
    paused: bool,
    outcome: Option<Outcome>,
    ticks: u64,
    last_action: BeamAction,
    world_events: usize,
}

impl Session {
    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn tool(&self) -> &BeamTool {
        &self.tool
    }

    pub fn tracker(&self) -> &ObjectiveTracker {
        &self.tracker
    }

    pub fn transport(&self) -> &TransportSystem {
        &self.transport
    }

    pub fn timer(&self) -> Option<&MissionTimer> {
        self.timer.as_ref()
    }

    /// Effect requests emitted since the last step began.
    pub fn effects(&self) -> &[EffectRequest] {
        &self.effects.requests
    }

    pub fn pose(&self) -> ToolPose {
        self.pose
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Ticks stepped so far; paused steps do not count.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn push(&mut self, action: Action) {
        self.input.push(action);
    }

    pub fn aim_at(&mut self, target: Vec3) {
        self.pose = ToolPose::looking_at(self.pose.position, target);
    }

    /// Freeze the session: the tool lets go and ignores input, nothing advances.
    pub fn pause(&mut self) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }
        self.paused = true;
        if let Some(body) = self
            .tool
            .set_suspended(true, &mut self.world, &mut self.effects)
        {
            events.push(GameEvent::Released {
                tick: self.ticks,
                entity: self.world.label(body),
            });
        }
        self.input.disable();
        tracing::info!(tick = self.ticks, "session paused");
        events.push(GameEvent::Paused { tick: self.ticks });
        events
    }

    pub fn resume(&mut self) -> Vec<GameEvent> {
        if !self.paused {
            return Vec::new();
        }
        self.paused = false;
        if self.outcome != Some(Outcome::Lost) {
            self.tool
                .set_suspended(false, &mut self.world, &mut self.effects);
            self.input.enable();
        }
        tracing::info!(tick = self.ticks, "session resumed");
        vec![GameEvent::Resumed { tick: self.ticks }]
    }

    /// Advance one tick: input, tool, physics, snaps, objectives, timer.
    pub fn step(&mut self, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.paused {
            return events;
        }
        self.ticks += 1;
        let tick = self.ticks;
        let _span = tracing::info_span!("session_step", tick).entered();
        self.effects.requests.clear();

        let ctx = TickContext {
            dt,
            pose: self.pose,
            input: self.input.snapshot(),
        };
        let before = self.tool.mode();
        let report = self.tool.tick(&ctx, &mut self.world, &mut self.effects);
        self.record_tool(tick, before, report, &mut events);

        self.world.kernel_mut().step(dt);
        self.world_events += self.world.kernel_mut().drain_events().len();

        let mut completions = Vec::new();
        for target in self.world.drain_target_events() {
            match target {
                TargetEvent::Mined {
                    entity,
                    label,
                    drop,
                    ..
                } => {
                    events.push(GameEvent::Mined {
                        tick,
                        entity: label,
                        drop: drop.map(|id| self.world.label(id)),
                    });
                    completions.push(ObjectiveEvent::Mined(entity));
                }
                TargetEvent::Repaired {
                    entity,
                    label,
                    completion,
                } => {
                    events.push(GameEvent::Repaired {
                        tick,
                        entity: label,
                        mesh: completion.appearance.mesh,
                        material: completion.appearance.material,
                    });
                    completions.push(ObjectiveEvent::Repaired(entity));
                }
            }
        }
        completions.extend(self.detect_snaps(tick, &mut events));
        for completion in completions {
            self.complete(tick, completion, &mut events);
        }

        let expired = self.timer.as_mut().is_some_and(|timer| timer.tick(dt));
        if expired {
            self.lose(tick, &mut events);
        }
        events
    }

    /// Feed one scripted step: pose and input at its start, then its ticks.
    pub fn run_step(&mut self, step: &ScriptStep, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        match step.pause {
            Some(true) => events.extend(self.pause()),
            Some(false) => events.extend(self.resume()),
            None => {}
        }
        if let Some(position) = step.move_to {
            self.pose.position = position;
        }
        if let Some(name) = &step.aim {
            let target = self
                .world
                .find(name)
                .and_then(|id| self.world.kernel().world_position(id));
            match target {
                Some(target) => self.aim_at(target),
                None => tracing::debug!(aim = %name, "aim target is gone, keeping heading"),
            }
        }

        self.input.push(if step.hold {
            Action::BeamPressed
        } else {
            Action::BeamReleased
        });
        if step.cycle {
            self.input.push(Action::CycleMode);
        }
        if step.scroll != 0.0 {
            self.input.push(Action::Scroll(step.scroll));
        }
        for _ in 0..step.ticks {
            events.extend(self.step(dt));
        }
        events
    }

    pub fn run_script(&mut self, script: &[ScriptStep], dt: f32) -> Vec<GameEvent> {
        script
            .iter()
            .flat_map(|step| self.run_step(step, dt))
            .collect()
    }

    pub fn summary(&self) -> Summary {
        let kernel = self.world.kernel();
        Summary {
            ticks: self.ticks,
            elapsed: kernel.elapsed(),
            mode: self.tool.mode(),
            completed: self.tracker.completed(),
            total: self.tracker.total(),
            progress: self.tracker.progress(),
            outcome: self.outcome,
            time_remaining: self.timer.as_ref().map(MissionTimer::remaining),
            entities: kernel.entity_count(),
            world_events: self.world_events + kernel.events().len(),
        }
    }

    fn record_tool(&mut self, tick: u64, before: ToolMode, report: TickReport, events: &mut Vec<GameEvent>) {
        if let Some(body) = report.released {
            events.push(GameEvent::Released {
                tick,
                entity: self.world.label(body),
            });
        }
        if report.mode != before {
            events.push(GameEvent::ModeChanged {
                tick,
                mode: report.mode,
            });
        }
        let changed = report.action != self.last_action;
        self.last_action = report.action;
        match report.action {
            BeamAction::PickedUp(id) => events.push(GameEvent::PickedUp {
                tick,
                entity: self.world.label(id),
            }),
            BeamAction::PickupRejected(id) if changed => events.push(GameEvent::PickupRejected {
                tick,
                entity: self.world.label(id),
            }),
            BeamAction::HoldLost(id) => events.push(GameEvent::HoldLost {
                tick,
                entity: self.world.label(id),
            }),
            _ => {}
        }
    }

    /// Signal every free transport whose object is inside its socket's range.
    fn detect_snaps(&mut self, tick: u64, events: &mut Vec<GameEvent>) -> Vec<ObjectiveEvent> {
        let kernel = self.world.kernel();
        let entered: Vec<(ObjectiveId, SocketId)> = self
            .transport
            .free()
            .filter_map(|(id, objective, socket)| {
                let object = kernel.world_position(objective.object)?;
                let anchor = kernel.world_position(socket.entity)?;
                let reach = objective.snap_distance + socket.detection_radius;
                (object.distance(anchor) <= reach).then_some((id, objective.socket))
            })
            .collect();

        let mut completions = Vec::new();
        for (objective, socket) in entered {
            let Some(event) = self
                .transport
                .on_entered(objective, socket, &mut self.world)
            else {
                continue;
            };
            let entity = self
                .transport
                .objective(objective)
                .map(|o| self.world.label(o.object))
                .unwrap_or_default();
            let name = self
                .transport_names
                .get(&objective)
                .cloned()
                .unwrap_or_else(|| objective.to_string());
            events.push(GameEvent::Snapped {
                tick,
                objective: name,
                entity,
            });
            completions.push(event);
        }
        completions
    }

    fn complete(&mut self, tick: u64, event: ObjectiveEvent, events: &mut Vec<GameEvent>) {
        if !self.tracker.is_registered(&event) {
            tracing::debug!(?event, "completion is not an objective");
            return;
        }
        match self.tracker.register_completion(event) {
            TrackerOutcome::Counted { completed, total } => {
                events.push(GameEvent::Progress {
                    tick,
                    completed,
                    total,
                });
            }
            TrackerOutcome::Won(_) => {
                let total = self.tracker.total();
                events.push(GameEvent::Progress {
                    tick,
                    completed: total,
                    total,
                });
                self.win(tick, events);
            }
            TrackerOutcome::Duplicate | TrackerOutcome::Unregistered | TrackerOutcome::AlreadyWon => {}
        }
    }

    fn win(&mut self, tick: u64, events: &mut Vec<GameEvent>) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(Outcome::Won);
        if let Some(timer) = &mut self.timer {
            timer.pause();
        }
        tracing::info!(tick, "mission complete");
        events.push(GameEvent::Won { tick });
    }

    /// Out of time: the player freezes and the tool lets go.
    fn lose(&mut self, tick: u64, events: &mut Vec<GameEvent>) {
        if self.outcome.is_some() {
            return;
        }
        self.outcome = Some(Outcome::Lost);
        if let Some(body) = self
            .tool
            .set_suspended(true, &mut self.world, &mut self.effects)
        {
            events.push(GameEvent::Released {
                tick,
                entity: self.world.label(body),
            });
        }
        self.input.disable();
        tracing::info!(tick, "mission failed, time ran out");
        events.push(GameEvent::Lost { tick });
    }
}
