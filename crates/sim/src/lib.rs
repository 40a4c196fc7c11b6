//! Headless reference environment for the multitool.
//!
//! Owns a kernel [`World`](multitool_kernel::World) together with the target
//! components, implements the beam tool's world interface on top of it, and
//! drives everything one tick at a time through a [`Session`].
//!
//! # Invariants
//! - A step runs in a fixed order: input snapshot, tool tick, physics, snap
//!   detection, objective tracking, mission timer.
//! - A paused session does not advance anything.
//! - Once the mission is lost the tool stays suspended.

pub mod demo;
pub mod event;
pub mod scene;
pub mod session;
pub mod setup;
pub mod world;

pub use demo::Demo;
pub use event::{GameEvent, Outcome};
pub use scene::{SceneConfig, SceneError, ScriptStep};
pub use session::{Session, SessionBuilder, Summary};
pub use setup::{build_session, run_scene};
pub use world::{DropTemplate, SimWorld, TargetEvent};

pub fn crate_info() -> &'static str {
    "multitool-sim v0.1.0"
}
