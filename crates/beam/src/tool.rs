use glam::{Vec3, Vec4};
use multitool_common::{EntityId, Ray};
use multitool_input::InputSnapshot;

use crate::config::{BeamConfig, ConfigError};
use crate::effects::{EffectRequest, EffectSink, ImpactId, SoundCue};
use crate::mode::{HeldBody, ModeState, ToolMode};
use crate::world::{BeamWorld, BodyLost};

/// Where the tool is and which way it points this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolPose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl ToolPose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// A pose at `position` facing `target`. Coincident points face +Z.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        Self::new(position, target - position)
    }

    pub fn ray(&self) -> Ray {
        Ray::new(self.position, self.forward)
    }
}

/// Everything one tick of the tool consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    /// Elapsed seconds; non-finite or negative values count as zero.
    pub dt: f32,
    pub pose: ToolPose,
    pub input: InputSnapshot,
}

/// What the active mode did this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeamAction {
    /// Activation not held.
    Idle,
    Miss,
    /// Hit an entity lacking the mode's capability.
    NoResponse(EntityId),
    Mining(EntityId),
    Repairing(EntityId),
    PickedUp(EntityId),
    PickupRejected(EntityId),
    Holding(EntityId),
    /// The held body vanished or was taken over; the slot was cleared.
    HoldLost(EntityId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub mode: ToolMode,
    pub action: BeamAction,
    /// Body released this tick, if any.
    pub released: Option<EntityId>,
}

/// Presentation state the tool owns: beam visibility, the live impact, the playing loop.
#[derive(Debug, Default)]
struct Visuals {
    beam_visible: bool,
    impact: Option<ImpactId>,
    next_impact: u64,
    sound: Option<SoundCue>,
}

impl Visuals {
    fn beam<E: EffectSink + ?Sized>(&mut self, from: Vec3, to: Vec3, color: Vec4, fx: &mut E) {
        self.beam_visible = true;
        fx.emit(EffectRequest::BeamLine { from, to, color });
    }

    fn hide_beam<E: EffectSink + ?Sized>(&mut self, fx: &mut E) {
        if std::mem::take(&mut self.beam_visible) {
            fx.emit(EffectRequest::BeamHidden);
        }
    }

    fn impact<E: EffectSink + ?Sized>(&mut self, at: Option<(Vec3, Vec3)>, fx: &mut E) {
        match (self.impact, at) {
            (Some(id), Some((point, normal))) => {
                fx.emit(EffectRequest::ImpactMove { id, point, normal });
            }
            (None, Some((point, normal))) => {
                let id = ImpactId(self.next_impact);
                self.next_impact += 1;
                self.impact = Some(id);
                fx.emit(EffectRequest::ImpactStart { id, point, normal });
            }
            (Some(id), None) => {
                self.impact = None;
                fx.emit(EffectRequest::ImpactStop { id });
            }
            (None, None) => {}
        }
    }

    fn sound<E: EffectSink + ?Sized>(&mut self, cue: Option<SoundCue>, fx: &mut E) {
        if self.sound == cue {
            return;
        }
        if let Some(old) = self.sound.take() {
            fx.emit(EffectRequest::SoundStop(old));
        }
        if let Some(new) = cue {
            self.sound = Some(new);
            fx.emit(EffectRequest::SoundStart(new));
        }
    }

    fn stop_all<E: EffectSink + ?Sized>(&mut self, fx: &mut E) {
        self.impact(None, fx);
        self.sound(None, fx);
        self.hide_beam(fx);
    }
}

/// The multitool. One instance per player; driven once per tick.
#[derive(Debug)]
pub struct BeamTool {
    config: BeamConfig,
    state: ModeState,
    /// Hold distance carried across visits to Tractor mode.
    hold_distance: f32,
    active: bool,
    suspended: bool,
    visuals: Visuals,
}

impl BeamTool {
    /// A tool in Mining mode, idle.
    pub fn new(config: BeamConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let hold_distance = config.hold_distance;
        let state = ModeState::enter(ToolMode::Mining, &config, hold_distance);
        Ok(Self {
            config,
            state,
            hold_distance,
            active: false,
            suspended: false,
            visuals: Visuals::default(),
        })
    }

    pub fn config(&self) -> &BeamConfig {
        &self.config
    }

    pub fn mode(&self) -> ToolMode {
        self.state.mode()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn held_body(&self) -> Option<&HeldBody> {
        self.state.held()
    }

    pub fn hold_distance(&self) -> f32 {
        match self.state {
            ModeState::Tractor { hold_distance, .. } => hold_distance,
            _ => self.hold_distance,
        }
    }

    pub fn live_impact(&self) -> Option<ImpactId> {
        self.visuals.impact
    }

    /// Run one tick: mode cycle, hold distance, then effect dispatch or release.
    pub fn tick<W, E>(&mut self, ctx: &TickContext, world: &mut W, fx: &mut E) -> TickReport
    where
        W: BeamWorld + ?Sized,
        E: EffectSink + ?Sized,
    {
        if self.suspended {
            return TickReport {
                mode: self.mode(),
                action: BeamAction::Idle,
                released: None,
            };
        }
        let dt = if ctx.dt.is_finite() { ctx.dt.max(0.0) } else { 0.0 };
        let input = ctx.input;

        let mut released = None;
        if input.cycle_mode {
            released = self.cycle_mode(world, fx);
        }
        self.adjust_hold_distance(input.scroll_delta);

        let action = if input.activation_held {
            if !self.active {
                tracing::debug!(mode = %self.mode(), "beam activated");
                self.active = true;
            }
            self.dispatch(ctx.pose, dt, world, fx)
        } else {
            released = released.or(self.deactivate(world, fx));
            BeamAction::Idle
        };

        tracing::trace!(mode = %self.mode(), ?action, "beam tick");
        TickReport {
            mode: self.mode(),
            action,
            released,
        }
    }

    /// Stop the beam now: release any held body and stop every effect.
    ///
    /// Safe to call at any time; a second call does nothing.
    pub fn force_deactivate<W, E>(&mut self, world: &mut W, fx: &mut E) -> Option<EntityId>
    where
        W: BeamWorld + ?Sized,
        E: EffectSink + ?Sized,
    {
        self.deactivate(world, fx)
    }

    /// While suspended the tool is deactivated and ignores all input.
    pub fn set_suspended<W, E>(&mut self, suspended: bool, world: &mut W, fx: &mut E) -> Option<EntityId>
    where
        W: BeamWorld + ?Sized,
        E: EffectSink + ?Sized,
    {
        let released = if suspended {
            self.deactivate(world, fx)
        } else {
            None
        };
        self.suspended = suspended;
        released
    }

    /// Tear the tool down, handing any held body back first.
    pub fn destroy<W, E>(mut self, world: &mut W, fx: &mut E) -> Option<EntityId>
    where
        W: BeamWorld + ?Sized,
        E: EffectSink + ?Sized,
    {
        self.deactivate(world, fx)
    }

    fn cycle_mode<W, E>(&mut self, world: &mut W, fx: &mut E) -> Option<EntityId>
    where
        W: BeamWorld + ?Sized,
        E: EffectSink + ?Sized,
    {
        let released = self.release_held(world);
        if let ModeState::Tractor { hold_distance, .. } = self.state {
            self.hold_distance = hold_distance;
        }
        let next = self.mode().next();
        self.state = ModeState::enter(next, &self.config, self.hold_distance);
        self.visuals.impact(None, fx);
        self.visuals.sound(None, fx);
        tracing::debug!(mode = %next, "mode switched");
        released
    }

    fn adjust_hold_distance(&mut self, scroll: f32) {
        let ModeState::Tractor { hold_distance, .. } = &mut self.state else {
            return;
        };
        let mut distance = *hold_distance;
        if scroll.is_finite() {
            distance += scroll * self.config.scroll_sensitivity;
        }
        *hold_distance = self.config.clamp_hold_distance(distance);
    }

    fn dispatch<W, E>(&mut self, pose: ToolPose, dt: f32, world: &mut W, fx: &mut E) -> BeamAction
    where
        W: BeamWorld + ?Sized,
        E: EffectSink + ?Sized,
    {
        let ray = pose.ray();
        let range = self.config.max_range;
        let mode = self.state.mode();
        let mask = self.config.layer_for(mode);

        let (end, impact, sound, action) = match &mut self.state {
            ModeState::Mining { damage_per_second } => match world.raycast(ray, range, mask) {
                Some(hit) => {
                    let action = if world.apply_damage(hit.entity, *damage_per_second * dt) {
                        BeamAction::Mining(hit.entity)
                    } else {
                        BeamAction::NoResponse(hit.entity)
                    };
                    let impact = Some((hit.point, hit.normal));
                    (hit.point, impact, Some(SoundCue::MiningLaser), action)
                }
                None => (ray.at(range), None, None, BeamAction::Miss),
            },
            ModeState::Repair { repair_per_second } => match world.raycast(ray, range, mask) {
                Some(hit) => {
                    let action = if world.apply_repair(hit.entity, *repair_per_second * dt) {
                        BeamAction::Repairing(hit.entity)
                    } else {
                        BeamAction::NoResponse(hit.entity)
                    };
                    let impact = Some((hit.point, hit.normal));
                    (hit.point, impact, Some(SoundCue::RepairTorch), action)
                }
                None => (ray.at(range), None, None, BeamAction::Miss),
            },
            ModeState::Tractor {
                hold_distance,
                held,
            } => {
                let (end, sound, action) =
                    tractor(&self.config, ray, *hold_distance, dt, held, world);
                (end, None, sound, action)
            }
        };

        self.visuals
            .beam(ray.origin, end, self.config.color_for(mode), fx);
        self.visuals.impact(impact, fx);
        self.visuals.sound(sound, fx);
        action
    }

    fn release_held<W: BeamWorld + ?Sized>(&mut self, world: &mut W) -> Option<EntityId> {
        let ModeState::Tractor { held, .. } = &mut self.state else {
            return None;
        };
        let body = held.take()?;
        world.release_body(body.entity, body.flags, body.release_velocity);
        tracing::info!(entity = %body.entity, velocity = ?body.release_velocity, "released body");
        Some(body.entity)
    }

    fn deactivate<W, E>(&mut self, world: &mut W, fx: &mut E) -> Option<EntityId>
    where
        W: BeamWorld + ?Sized,
        E: EffectSink + ?Sized,
    {
        let released = self.release_held(world);
        if std::mem::take(&mut self.active) {
            tracing::debug!(mode = %self.mode(), "beam deactivated");
        }
        self.visuals.stop_all(fx);
        released
    }
}

/// Tractor effect for one tick: drive the held body, or try to pick one up.
///
/// Returns the beam end point, the loop sound, and what happened.
fn tractor<W: BeamWorld + ?Sized>(
    config: &BeamConfig,
    ray: Ray,
    hold_distance: f32,
    dt: f32,
    held: &mut Option<HeldBody>,
    world: &mut W,
) -> (Vec3, Option<SoundCue>, BeamAction) {
    if let Some(entity) = held.as_ref().map(|h| h.entity) {
        let driven = match world.body_position(entity) {
            Some(position) => {
                let velocity = follow_velocity(ray.at(hold_distance) - position, dt, config);
                world
                    .drive_body(entity, velocity)
                    .map(|()| (position, velocity))
            }
            None => Err(BodyLost(entity)),
        };
        return match driven {
            Ok((position, velocity)) => {
                if let Some(body) = held.as_mut() {
                    body.release_velocity = velocity;
                }
                (position, Some(SoundCue::TractorHum), BeamAction::Holding(entity))
            }
            Err(lost) => {
                // The world owns the body now; its flags are not ours to restore.
                *held = None;
                tracing::info!(%lost, "tractor hold lost");
                (ray.at(config.max_range), None, BeamAction::HoldLost(entity))
            }
        };
    }

    match world.raycast(ray, config.max_range, config.layers.tractor) {
        Some(hit) => match world.try_pickup(hit.entity) {
            Ok(flags) => {
                *held = Some(HeldBody {
                    entity: hit.entity,
                    flags,
                    release_velocity: Vec3::ZERO,
                });
                tracing::info!(entity = %hit.entity, "picked up body");
                (hit.point, Some(SoundCue::TractorHum), BeamAction::PickedUp(hit.entity))
            }
            Err(err) => {
                tracing::warn!(%err, "pickup rejected");
                (hit.point, None, BeamAction::PickupRejected(hit.entity))
            }
        },
        None => (ray.at(config.max_range), None, BeamAction::Miss),
    }
}

/// Proportional pull toward the hold point, capped at `max_velocity` and at
/// the speed that lands exactly on the hold point within `dt`.
/// Inside `settle_tolerance` the body is brought to rest.
fn follow_velocity(offset: Vec3, dt: f32, config: &BeamConfig) -> Vec3 {
    let distance = offset.length();
    if distance <= config.settle_tolerance {
        return Vec3::ZERO;
    }
    let pull = (offset * config.follow_speed).clamp_length_max(config.max_velocity);
    if dt > 0.0 {
        pull.clamp_length_max(distance / dt)
    } else {
        pull
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::{EffectLog, NullEffects};
    use crate::world::PickupError;
    use multitool_common::{BodyFlags, LayerMask, RayHit};
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Clone, Copy)]
    struct MockBody {
        position: Vec3,
        velocity: Vec3,
        flags: BodyFlags,
        held: bool,
    }

    #[derive(Debug, Default)]
    struct MockWorld {
        hits: Vec<(LayerMask, RayHit)>,
        damageable: HashSet<EntityId>,
        repairable: HashSet<EntityId>,
        damage: Vec<(EntityId, f32)>,
        repairs: Vec<(EntityId, f32)>,
        bodies: HashMap<EntityId, MockBody>,
        releases: Vec<(EntityId, BodyFlags, Vec3)>,
    }

    impl MockWorld {
        fn with_hit(mut self, layer: LayerMask, entity: EntityId, distance: f32) -> Self {
            self.hits.push((
                layer,
                RayHit {
                    entity,
                    point: Vec3::Z * distance,
                    normal: Vec3::NEG_Z,
                    distance,
                },
            ));
            self
        }

        fn with_body(mut self, entity: EntityId, position: Vec3, kinematic: bool) -> Self {
            self.bodies.insert(
                entity,
                MockBody {
                    position,
                    velocity: Vec3::ONE,
                    flags: BodyFlags {
                        use_gravity: !kinematic,
                        is_kinematic: kinematic,
                    },
                    held: false,
                },
            );
            self
        }

        fn held_count(&self) -> usize {
            self.bodies.values().filter(|b| b.held).count()
        }
    }

    impl BeamWorld for MockWorld {
        fn raycast(&self, _ray: Ray, max_distance: f32, mask: LayerMask) -> Option<RayHit> {
            self.hits
                .iter()
                .find(|(layer, hit)| layer.intersects(mask) && hit.distance <= max_distance)
                .map(|(_, hit)| *hit)
        }

        fn apply_damage(&mut self, target: EntityId, amount: f32) -> bool {
            if !self.damageable.contains(&target) {
                return false;
            }
            self.damage.push((target, amount));
            true
        }

        fn apply_repair(&mut self, target: EntityId, amount: f32) -> bool {
            if !self.repairable.contains(&target) {
                return false;
            }
            self.repairs.push((target, amount));
            true
        }

        fn try_pickup(&mut self, target: EntityId) -> Result<BodyFlags, PickupError> {
            let body = self
                .bodies
                .get_mut(&target)
                .ok_or(PickupError::NoBody(target))?;
            if body.flags.is_kinematic {
                return Err(PickupError::Kinematic(target));
            }
            if body.held {
                return Err(PickupError::AlreadyHeld(target));
            }
            let saved = body.flags;
            body.flags.use_gravity = false;
            body.velocity = Vec3::ZERO;
            body.held = true;
            Ok(saved)
        }

        fn body_position(&self, body: EntityId) -> Option<Vec3> {
            self.bodies.get(&body).map(|b| b.position)
        }

        fn drive_body(&mut self, body: EntityId, velocity: Vec3) -> Result<(), BodyLost> {
            match self.bodies.get_mut(&body) {
                Some(b) if b.held => {
                    b.velocity = velocity;
                    Ok(())
                }
                _ => Err(BodyLost(body)),
            }
        }

        fn release_body(&mut self, body: EntityId, flags: BodyFlags, velocity: Vec3) {
            if let Some(b) = self.bodies.get_mut(&body) {
                b.held = false;
                b.flags = flags;
                b.velocity = velocity;
            }
            self.releases.push((body, flags, velocity));
        }
    }

    fn tool() -> BeamTool {
        BeamTool::new(BeamConfig::default()).unwrap()
    }

    fn ctx(input: InputSnapshot) -> TickContext {
        TickContext {
            dt: 1.0,
            pose: ToolPose::new(Vec3::ZERO, Vec3::Z),
            input,
        }
    }

    fn to_tractor(tool: &mut BeamTool, world: &mut MockWorld) {
        tool.tick(&ctx(InputSnapshot::default().with_cycle()), world, &mut NullEffects);
        assert_eq!(tool.mode(), ToolMode::Tractor);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = BeamConfig {
            max_range: -1.0,
            ..BeamConfig::default()
        };
        assert!(BeamTool::new(config).is_err());
    }

    #[test]
    fn mode_cycles_on_edge_regardless_of_activation() {
        let mut tool = tool();
        let mut world = MockWorld::default();
        let mut fx = NullEffects;
        assert_eq!(tool.mode(), ToolMode::Mining);
        tool.tick(&ctx(InputSnapshot::held().with_cycle()), &mut world, &mut fx);
        assert_eq!(tool.mode(), ToolMode::Tractor);
        tool.tick(&ctx(InputSnapshot::default().with_cycle()), &mut world, &mut fx);
        assert_eq!(tool.mode(), ToolMode::Repair);
        tool.tick(&ctx(InputSnapshot::default().with_cycle()), &mut world, &mut fx);
        assert_eq!(tool.mode(), ToolMode::Mining);
        tool.tick(&ctx(InputSnapshot::default()), &mut world, &mut fx);
        assert_eq!(tool.mode(), ToolMode::Mining);
    }

    #[test]
    fn mining_applies_rate_times_dt() {
        let rock = EntityId::new();
        let mut world = MockWorld::default().with_hit(LayerMask::MINABLE, rock, 2.0);
        world.damageable.insert(rock);
        let mut tool = tool();
        for _ in 0..10 {
            let report = tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);
            assert_eq!(report.action, BeamAction::Mining(rock));
        }
        assert_eq!(world.damage.len(), 10);
        let total: f32 = world.damage.iter().map(|(_, d)| d).sum();
        assert_eq!(total, 100.0);
    }

    #[test]
    fn mining_miss_draws_full_range_and_mutates_nothing() {
        let mut world = MockWorld::default();
        let mut tool = tool();
        let mut fx = EffectLog::new();
        let report = tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut fx);
        assert_eq!(report.action, BeamAction::Miss);
        assert_eq!(fx.last_beam(), Some((Vec3::ZERO, Vec3::Z * 5.0)));
        assert!(fx.live_impacts().is_empty());
        assert!(world.damage.is_empty());
    }

    #[test]
    fn hit_without_capability_still_renders() {
        let stone = EntityId::new();
        let mut world = MockWorld::default().with_hit(LayerMask::MINABLE, stone, 3.0);
        let mut tool = tool();
        let mut fx = EffectLog::new();
        let report = tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut fx);
        assert_eq!(report.action, BeamAction::NoResponse(stone));
        assert_eq!(fx.last_beam(), Some((Vec3::ZERO, Vec3::Z * 3.0)));
        assert!(world.damage.is_empty());
    }

    #[test]
    fn mining_ignores_other_layers() {
        let crate_id = EntityId::new();
        let mut world = MockWorld::default().with_hit(LayerMask::LIFTABLE, crate_id, 1.0);
        world.damageable.insert(crate_id);
        let mut tool = tool();
        let report = tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);
        assert_eq!(report.action, BeamAction::Miss);
    }

    #[test]
    fn repair_applies_rate_times_dt() {
        let antenna = EntityId::new();
        let mut world = MockWorld::default().with_hit(LayerMask::REPAIRABLE, antenna, 1.0);
        world.repairable.insert(antenna);
        let mut tool = tool();
        tool.tick(&ctx(InputSnapshot::default().with_cycle()), &mut world, &mut NullEffects);
        tool.tick(&ctx(InputSnapshot::default().with_cycle()), &mut world, &mut NullEffects);
        assert_eq!(tool.mode(), ToolMode::Repair);

        let mut c = ctx(InputSnapshot::held());
        c.dt = 0.5;
        let report = tool.tick(&c, &mut world, &mut NullEffects);
        assert_eq!(report.action, BeamAction::Repairing(antenna));
        assert_eq!(world.repairs, vec![(antenna, 0.5)]);
    }

    #[test]
    fn pickup_suspends_and_records_flags() {
        let crate_id = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, crate_id, 2.0)
            .with_body(crate_id, Vec3::Z * 2.0, false);
        let mut tool = tool();
        to_tractor(&mut tool, &mut world);

        let report = tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);
        assert_eq!(report.action, BeamAction::PickedUp(crate_id));
        let held = tool.held_body().unwrap();
        assert_eq!(held.entity, crate_id);
        assert!(held.flags.use_gravity);
        assert_eq!(world.bodies[&crate_id].velocity, Vec3::ZERO);
    }

    #[test]
    fn kinematic_pickup_is_rejected_without_state_change() {
        let pillar = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, pillar, 2.0)
            .with_body(pillar, Vec3::Z * 2.0, true);
        let mut tool = tool();
        to_tractor(&mut tool, &mut world);

        let report = tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);
        assert_eq!(report.action, BeamAction::PickupRejected(pillar));
        assert!(tool.held_body().is_none());
        assert!(!world.bodies[&pillar].held);
    }

    #[test]
    fn holding_pulls_toward_hold_point() {
        let crate_id = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, crate_id, 2.0)
            .with_body(crate_id, Vec3::Z * 2.0, false);
        let mut tool = tool();
        let mut fx = EffectLog::new();
        to_tractor(&mut tool, &mut world);
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut fx);

        let report = tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut fx);
        assert_eq!(report.action, BeamAction::Holding(crate_id));
        // Hold point is 3 ahead, body is at 2. The pull of 10 is capped so a
        // 1 s tick lands on the hold point.
        assert_eq!(world.bodies[&crate_id].velocity, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(fx.last_beam(), Some((Vec3::ZERO, Vec3::Z * 2.0)));
        assert_eq!(fx.playing_sounds(), vec![SoundCue::TractorHum]);
    }

    #[test]
    fn follow_velocity_is_capped_and_settles() {
        let config = BeamConfig::default();
        let dt = 1.0 / 60.0;
        let far = follow_velocity(Vec3::new(0.0, 100.0, 0.0), dt, &config);
        assert!((far.length() - config.max_velocity).abs() < 1e-4);
        assert_eq!(follow_velocity(Vec3::splat(0.001), dt, &config), Vec3::ZERO);
        assert_eq!(
            follow_velocity(Vec3::new(0.5, 0.0, 0.0), dt, &config),
            Vec3::new(5.0, 0.0, 0.0)
        );
    }

    #[test]
    fn follow_velocity_never_overshoots_in_one_tick() {
        let config = BeamConfig::default();
        let offset = Vec3::new(0.0, 0.0, 2.5);
        for dt in [0.25, 1.0] {
            let velocity = follow_velocity(offset, dt, &config);
            assert!((velocity * dt - offset).length() < 1e-5, "dt={dt}");
        }
        assert_eq!(
            follow_velocity(offset, 0.0, &config),
            Vec3::new(0.0, 0.0, config.max_velocity)
        );
    }

    #[test]
    fn cycling_away_mid_hold_releases_with_last_velocity() {
        let crate_id = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, crate_id, 2.0)
            .with_body(crate_id, Vec3::Z * 2.0, false);
        let mut tool = tool();
        to_tractor(&mut tool, &mut world);
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);

        let report = tool.tick(&ctx(InputSnapshot::held().with_cycle()), &mut world, &mut NullEffects);
        assert_eq!(report.released, Some(crate_id));
        assert_eq!(tool.mode(), ToolMode::Repair);
        assert!(tool.held_body().is_none());

        let (entity, flags, velocity) = world.releases[0];
        assert_eq!(entity, crate_id);
        assert!(flags.use_gravity);
        assert_eq!(velocity, Vec3::new(0.0, 0.0, 1.0));
        assert!(!world.bodies[&crate_id].held);
    }

    #[test]
    fn letting_go_releases_and_hides_beam() {
        let crate_id = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, crate_id, 2.0)
            .with_body(crate_id, Vec3::Z * 2.0, false);
        let mut tool = tool();
        let mut fx = EffectLog::new();
        to_tractor(&mut tool, &mut world);
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut fx);
        assert!(tool.is_active());

        let report = tool.tick(&ctx(InputSnapshot::default()), &mut world, &mut fx);
        assert_eq!(report.action, BeamAction::Idle);
        assert_eq!(report.released, Some(crate_id));
        assert!(!tool.is_active());
        assert_eq!(fx.last_beam(), None);
        assert!(fx.playing_sounds().is_empty());
    }

    #[test]
    fn release_is_idempotent() {
        let crate_id = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, crate_id, 2.0)
            .with_body(crate_id, Vec3::Z * 2.0, false);
        let mut tool = tool();
        to_tractor(&mut tool, &mut world);
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);

        assert_eq!(tool.force_deactivate(&mut world, &mut NullEffects), Some(crate_id));
        assert_eq!(tool.force_deactivate(&mut world, &mut NullEffects), None);
        assert_eq!(world.releases.len(), 1);
    }

    #[test]
    fn lost_body_clears_slot_without_restoring() {
        let crate_id = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, crate_id, 2.0)
            .with_body(crate_id, Vec3::Z * 2.0, false);
        let mut tool = tool();
        to_tractor(&mut tool, &mut world);
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);

        // Something else took the body over.
        world.bodies.get_mut(&crate_id).unwrap().held = false;
        let report = tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);
        assert_eq!(report.action, BeamAction::HoldLost(crate_id));
        assert!(tool.held_body().is_none());
        assert!(world.releases.is_empty());
    }

    #[test]
    fn hold_distance_is_clamped_and_remembered() {
        let mut world = MockWorld::default();
        let mut tool = tool();
        // Scroll outside Tractor has no effect.
        tool.tick(&ctx(InputSnapshot::default().with_scroll(5.0)), &mut world, &mut NullEffects);
        assert_eq!(tool.hold_distance(), 3.0);

        to_tractor(&mut tool, &mut world);
        tool.tick(&ctx(InputSnapshot::default().with_scroll(1.0)), &mut world, &mut NullEffects);
        assert_eq!(tool.hold_distance(), 5.0);
        tool.tick(&ctx(InputSnapshot::default().with_scroll(1000.0)), &mut world, &mut NullEffects);
        assert_eq!(tool.hold_distance(), 10.0);
        tool.tick(&ctx(InputSnapshot::default().with_scroll(-1000.0)), &mut world, &mut NullEffects);
        assert_eq!(tool.hold_distance(), 1.0);
        tool.tick(&ctx(InputSnapshot::default().with_scroll(f32::NAN)), &mut world, &mut NullEffects);
        assert_eq!(tool.hold_distance(), 1.0);

        for _ in 0..3 {
            tool.tick(&ctx(InputSnapshot::default().with_cycle()), &mut world, &mut NullEffects);
        }
        assert_eq!(tool.mode(), ToolMode::Tractor);
        assert_eq!(tool.hold_distance(), 1.0);
    }

    #[test]
    fn suspended_tool_ignores_input() {
        let crate_id = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, crate_id, 2.0)
            .with_body(crate_id, Vec3::Z * 2.0, false);
        let mut tool = tool();
        to_tractor(&mut tool, &mut world);
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);

        assert_eq!(tool.set_suspended(true, &mut world, &mut NullEffects), Some(crate_id));
        let report = tool.tick(&ctx(InputSnapshot::held().with_cycle()), &mut world, &mut NullEffects);
        assert_eq!(report.action, BeamAction::Idle);
        assert_eq!(tool.mode(), ToolMode::Tractor);
        assert!(tool.held_body().is_none());

        tool.set_suspended(false, &mut world, &mut NullEffects);
        let report = tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);
        assert_eq!(report.action, BeamAction::PickedUp(crate_id));
    }

    #[test]
    fn destroy_releases_held_body() {
        let crate_id = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, crate_id, 2.0)
            .with_body(crate_id, Vec3::Z * 2.0, false);
        let mut tool = tool();
        to_tractor(&mut tool, &mut world);
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut NullEffects);

        assert_eq!(tool.destroy(&mut world, &mut NullEffects), Some(crate_id));
        assert_eq!(world.held_count(), 0);
    }

    #[test]
    fn impact_effect_follows_hit_and_stops_on_miss() {
        let rock = EntityId::new();
        let mut world = MockWorld::default().with_hit(LayerMask::MINABLE, rock, 2.0);
        world.damageable.insert(rock);
        let mut tool = tool();
        let mut fx = EffectLog::new();
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut fx);
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut fx);
        assert_eq!(fx.live_impacts().len(), 1);
        assert_eq!(fx.playing_sounds(), vec![SoundCue::MiningLaser]);

        world.hits.clear();
        tool.tick(&ctx(InputSnapshot::held()), &mut world, &mut fx);
        assert!(fx.live_impacts().is_empty());
        assert!(fx.playing_sounds().is_empty());
        assert!(tool.live_impact().is_none());
    }

    /// Deterministic pseudo-random input sequences.
    struct Lcg(u64);

    impl Lcg {
        fn next(&mut self) -> u64 {
            self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            self.0 >> 33
        }

        fn chance(&mut self, percent: u64) -> bool {
            self.next() % 100 < percent
        }
    }

    #[test]
    fn held_body_invariant_over_random_inputs() {
        let crate_id = EntityId::new();
        let rock = EntityId::new();
        let mut world = MockWorld::default()
            .with_hit(LayerMask::LIFTABLE, crate_id, 2.0)
            .with_hit(LayerMask::MINABLE, rock, 4.0)
            .with_body(crate_id, Vec3::Z * 2.0, false);
        world.damageable.insert(rock);
        let mut tool = tool();
        let mut fx = EffectLog::new();

        for seed in [1_u64, 7, 42] {
            let mut rng = Lcg(seed);
            for _ in 0..500 {
                let mut input = InputSnapshot {
                    activation_held: rng.chance(70),
                    cycle_mode: rng.chance(15),
                    scroll_delta: 0.0,
                };
                if rng.chance(30) {
                    input.scroll_delta = (rng.next() % 13) as f32 - 6.0;
                }
                tool.tick(&ctx(input), &mut world, &mut fx);

                if tool.held_body().is_some() {
                    assert_eq!(tool.mode(), ToolMode::Tractor);
                    assert!(tool.is_active());
                }
                assert_eq!(world.held_count(), usize::from(tool.held_body().is_some()));
                let d = tool.hold_distance();
                assert!((1.0..=10.0).contains(&d));
                assert!(fx.live_impacts().len() <= 1);
            }
        }
    }
}
