//! Scene descriptions: the entities, tool setup and scripted input of one run.

use std::collections::BTreeSet;
use std::path::Path;

use glam::Vec3;
use multitool_beam::{BeamConfig, ConfigError};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scene: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid tool config: {0}")]
    Config(#[from] ConfigError),
    #[error("duplicate name `{0}`")]
    DuplicateName(String),
    #[error("`{owner}` references unknown {kind} `{name}`")]
    UnknownReference {
        owner: String,
        kind: &'static str,
        name: String,
    },
    #[error("`{owner}`: {field} out of range, got {value}")]
    OutOfRange {
        owner: String,
        field: &'static str,
        value: f32,
    },
}

/// A complete scene: what exists, where the tool stands, and what the player does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub name: String,
    /// Seconds per tick.
    pub timestep: f32,
    /// Ground plane height; `None` for open space.
    pub floor: Option<f32>,
    pub tool: ToolSetup,
    pub drops: Vec<DropSpec>,
    pub rocks: Vec<RockSpec>,
    pub repairables: Vec<RepairableSpec>,
    pub liftables: Vec<LiftableSpec>,
    pub sockets: Vec<SocketSpec>,
    pub transports: Vec<TransportSpec>,
    /// Mission time limit in seconds. No limit when absent.
    pub mission_time: Option<f32>,
    pub script: Vec<ScriptStep>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "untitled".into(),
            timestep: 1.0 / 60.0,
            floor: Some(0.0),
            tool: ToolSetup::default(),
            drops: Vec::new(),
            rocks: Vec::new(),
            repairables: Vec::new(),
            liftables: Vec::new(),
            sockets: Vec::new(),
            transports: Vec::new(),
            mission_time: None,
            script: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSetup {
    pub beam: BeamConfig,
    pub position: Vec3,
    pub forward: Vec3,
}

impl Default for ToolSetup {
    fn default() -> Self {
        Self {
            beam: BeamConfig::default(),
            position: Vec3::new(0.0, 1.0, 0.0),
            forward: Vec3::Z,
        }
    }
}

/// Template for the object a broken rock leaves behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DropSpec {
    pub name: String,
    #[serde(default = "default_drop_radius")]
    pub radius: f32,
    #[serde(default = "default_mass")]
    pub mass: f32,
    /// Whether the tractor can pick the drop up.
    #[serde(default = "default_true")]
    pub liftable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RockSpec {
    pub name: String,
    pub position: Vec3,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default = "default_max_health")]
    pub max_health: f32,
    #[serde(default)]
    pub drop: Option<String>,
    #[serde(default)]
    pub break_effect: Option<String>,
    #[serde(default)]
    pub break_sound: Option<String>,
    /// Counts toward the win.
    #[serde(default = "default_true")]
    pub objective: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairableSpec {
    pub name: String,
    pub position: Vec3,
    #[serde(default = "default_half_extents")]
    pub half_extents: Vec3,
    #[serde(default = "default_max_repair_time")]
    pub max_repair_time: f32,
    #[serde(default)]
    pub repaired_mesh: Option<String>,
    #[serde(default)]
    pub repaired_material: Option<String>,
    #[serde(default)]
    pub complete_effect: Option<String>,
    #[serde(default)]
    pub complete_sound: Option<String>,
    #[serde(default = "default_true")]
    pub objective: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiftableSpec {
    pub name: String,
    pub position: Vec3,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default = "default_mass")]
    pub mass: f32,
    #[serde(default)]
    pub kinematic: bool,
    #[serde(default = "default_true")]
    pub gravity: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocketSpec {
    pub name: String,
    pub position: Vec3,
    #[serde(default = "default_radius")]
    pub detection_radius: f32,
}

/// Deliver liftable `object` to `socket`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportSpec {
    pub name: String,
    pub object: String,
    pub socket: String,
    #[serde(default = "default_snap_distance")]
    pub snap_distance: f32,
    /// Euler degrees applied once snapped.
    #[serde(default)]
    pub rotation_offset: Vec3,
}

/// One scripted stretch of player input.
///
/// `cycle` and `scroll` fire on the first tick of the step; `hold` is a level
/// held for all of its ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptStep {
    pub ticks: u32,
    pub hold: bool,
    pub cycle: bool,
    pub scroll: f32,
    /// Name of an entity to point the tool at.
    pub aim: Option<String>,
    pub move_to: Option<Vec3>,
    /// `true` pauses the session, `false` resumes it.
    pub pause: Option<bool>,
}

impl Default for ScriptStep {
    fn default() -> Self {
        Self {
            ticks: 1,
            hold: false,
            cycle: false,
            scroll: 0.0,
            aim: None,
            move_to: None,
            pause: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_radius() -> f32 {
    0.5
}

fn default_drop_radius() -> f32 {
    0.25
}

fn default_mass() -> f32 {
    1.0
}

fn default_max_health() -> f32 {
    100.0
}

fn default_max_repair_time() -> f32 {
    8.0
}

fn default_snap_distance() -> f32 {
    0.5
}

fn default_half_extents() -> Vec3 {
    Vec3::splat(0.5)
}

impl SceneConfig {
    /// Read, parse and validate a scene file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SceneError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml(&text)
    }

    pub fn from_yaml(text: &str) -> Result<Self, SceneError> {
        let scene: Self = serde_yaml::from_str(text)?;
        scene.validate()?;
        Ok(scene)
    }

    pub fn to_yaml(&self) -> Result<String, SceneError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check tuning, name uniqueness and every cross-reference.
    pub fn validate(&self) -> Result<(), SceneError> {
        positive(&self.name, "timestep", self.timestep)?;
        if let Some(limit) = self.mission_time {
            positive(&self.name, "mission_time", limit)?;
        }
        self.tool.beam.validate()?;

        let mut drops = BTreeSet::new();
        for drop in &self.drops {
            positive(&drop.name, "radius", drop.radius)?;
            positive(&drop.name, "mass", drop.mass)?;
            if !drops.insert(drop.name.as_str()) {
                return Err(SceneError::DuplicateName(drop.name.clone()));
            }
        }

        let mut entities = BTreeSet::new();
        let mut liftables = BTreeSet::new();
        let mut sockets = BTreeSet::new();
        for rock in &self.rocks {
            positive(&rock.name, "radius", rock.radius)?;
            positive(&rock.name, "max_health", rock.max_health)?;
            if let Some(drop) = &rock.drop {
                if !drops.contains(drop.as_str()) {
                    return Err(unknown(&rock.name, "drop", drop));
                }
            }
            unique(&mut entities, &rock.name)?;
        }
        for repairable in &self.repairables {
            positive(&repairable.name, "max_repair_time", repairable.max_repair_time)?;
            let h = repairable.half_extents;
            positive(&repairable.name, "half_extents", h.x.min(h.y).min(h.z))?;
            unique(&mut entities, &repairable.name)?;
        }
        for liftable in &self.liftables {
            positive(&liftable.name, "radius", liftable.radius)?;
            positive(&liftable.name, "mass", liftable.mass)?;
            unique(&mut entities, &liftable.name)?;
            liftables.insert(liftable.name.as_str());
        }
        for socket in &self.sockets {
            non_negative(&socket.name, "detection_radius", socket.detection_radius)?;
            unique(&mut entities, &socket.name)?;
            sockets.insert(socket.name.as_str());
        }
        // Spawned drops carry their template name.
        if let Some(clash) = drops.intersection(&entities).next() {
            return Err(SceneError::DuplicateName(clash.to_string()));
        }

        let mut transports = BTreeSet::new();
        for transport in &self.transports {
            if !liftables.contains(transport.object.as_str()) {
                return Err(unknown(&transport.name, "liftable", &transport.object));
            }
            if !sockets.contains(transport.socket.as_str()) {
                return Err(unknown(&transport.name, "socket", &transport.socket));
            }
            non_negative(&transport.name, "snap_distance", transport.snap_distance)?;
            unique(&mut transports, &transport.name)?;
        }

        for (index, step) in self.script.iter().enumerate() {
            if let Some(target) = &step.aim {
                if !entities.contains(target.as_str()) {
                    return Err(unknown(&format!("script step {index}"), "entity", target));
                }
            }
        }
        Ok(())
    }
}

fn positive(owner: &str, field: &'static str, value: f32) -> Result<(), SceneError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SceneError::OutOfRange {
            owner: owner.to_string(),
            field,
            value,
        })
    }
}

fn non_negative(owner: &str, field: &'static str, value: f32) -> Result<(), SceneError> {
    if value == 0.0 {
        Ok(())
    } else {
        positive(owner, field, value)
    }
}

fn unique<'a>(seen: &mut BTreeSet<&'a str>, name: &'a str) -> Result<(), SceneError> {
    if seen.insert(name) {
        Ok(())
    } else {
        Err(SceneError::DuplicateName(name.to_string()))
    }
}

fn unknown(owner: &str, kind: &'static str, name: &str) -> SceneError {
    SceneError::UnknownReference {
        owner: owner.to_string(),
        kind,
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SCENE: &str = r#"
name: yard
timestep: 0.1
tool:
  position: [0.0, 1.0, 0.0]
  beam:
    max_range: 8.0
drops:
  - name: ore
rocks:
  - name: boulder
    position: [0.0, 1.0, 3.0]
    max_health: 20.0
    drop: ore
liftables:
  - name: crate
    position: [1.0, 0.5, 2.0]
sockets:
  - name: pad
    position: [2.0, 1.0, 2.0]
transports:
  - name: deliver-crate
    object: crate
    socket: pad
script:
  - aim: boulder
    hold: true
    ticks: 25
"#;

    #[test]
    fn parses_with_defaults() {
        let scene = SceneConfig::from_yaml(SCENE).unwrap();
        assert_eq!(scene.name, "yard");
        assert_eq!(scene.tool.beam.max_range, 8.0);
        assert_eq!(scene.tool.beam.damage_per_second, 10.0);
        assert_eq!(scene.tool.forward, Vec3::Z);
        assert_eq!(scene.floor, Some(0.0));
        assert_eq!(scene.rocks[0].radius, 0.5);
        assert!(scene.rocks[0].objective);
        assert!(scene.liftables[0].gravity);
        assert_eq!(scene.transports[0].snap_distance, 0.5);
        assert_eq!(scene.script[0].ticks, 25);
        assert!(!scene.script[0].cycle);
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SCENE.as_bytes()).unwrap();
        let scene = SceneConfig::load(file.path()).unwrap();
        assert_eq!(scene.rocks.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = SceneConfig::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, SceneError::Io(_)));
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        let err = SceneConfig::from_yaml("rocks: [name: 1, {").unwrap_err();
        assert!(matches!(err, SceneError::Yaml(_)));
    }

    #[test]
    fn yaml_round_trip_preserves_scene() {
        let scene = SceneConfig::from_yaml(SCENE).unwrap();
        let again = SceneConfig::from_yaml(&scene.to_yaml().unwrap()).unwrap();
        assert_eq!(scene, again);
    }

    #[test]
    fn duplicate_entity_names_are_rejected() {
        let mut scene = SceneConfig::from_yaml(SCENE).unwrap();
        scene.liftables[0].name = "boulder".into();
        scene.transports.clear();
        let err = scene.validate().unwrap_err();
        assert!(matches!(err, SceneError::DuplicateName(name) if name == "boulder"));
    }

    #[test]
    fn drop_named_like_an_entity_is_rejected() {
        let mut scene = SceneConfig::from_yaml(SCENE).unwrap();
        scene.drops[0].name = "crate".into();
        scene.rocks[0].drop = Some("crate".into());
        let err = scene.validate().unwrap_err();
        assert!(matches!(err, SceneError::DuplicateName(name) if name == "crate"));
    }

    #[test]
    fn unknown_references_are_rejected() {
        let mut scene = SceneConfig::from_yaml(SCENE).unwrap();
        scene.transports[0].socket = "dock".into();
        assert!(matches!(
            scene.validate(),
            Err(SceneError::UnknownReference { kind: "socket", .. })
        ));

        let mut scene = SceneConfig::from_yaml(SCENE).unwrap();
        scene.rocks[0].drop = Some("gold".into());
        assert!(matches!(
            scene.validate(),
            Err(SceneError::UnknownReference { kind: "drop", .. })
        ));

        let mut scene = SceneConfig::from_yaml(SCENE).unwrap();
        scene.script[0].aim = Some("moon".into());
        assert!(matches!(
            scene.validate(),
            Err(SceneError::UnknownReference { kind: "entity", .. })
        ));
    }

    #[test]
    fn transport_must_name_a_liftable() {
        let mut scene = SceneConfig::from_yaml(SCENE).unwrap();
        scene.transports[0].object = "boulder".into();
        assert!(matches!(
            scene.validate(),
            Err(SceneError::UnknownReference { kind: "liftable", .. })
        ));
    }

    #[test]
    fn bad_tuning_is_rejected() {
        let mut scene = SceneConfig::from_yaml(SCENE).unwrap();
        scene.tool.beam.min_hold_distance = 20.0;
        assert!(matches!(scene.validate(), Err(SceneError::Config(_))));

        let mut scene = SceneConfig::from_yaml(SCENE).unwrap();
        scene.rocks[0].max_health = 0.0;
        assert!(matches!(
            scene.validate(),
            Err(SceneError::OutOfRange { field: "max_health", .. })
        ));

        let mut scene = SceneConfig::from_yaml(SCENE).unwrap();
        scene.mission_time = Some(f32::NAN);
        assert!(scene.validate().is_err());
    }
}
