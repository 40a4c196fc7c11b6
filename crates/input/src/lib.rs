//! Input contract: player actions collected into one snapshot per tick.
//!
//! # Invariants
//! - Activation is level-triggered; it stays held until released.
//! - A cycle-mode press is visible in exactly one snapshot.
//! - Scroll accumulates between ticks and resets after each snapshot.

pub mod action;
pub mod snapshot;

pub use action::Action;
pub use snapshot::{InputCollector, InputSnapshot};

pub fn crate_info() -> &'static str {
    "multitool-input v0.1.0"
}
