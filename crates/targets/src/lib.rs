//! Targetable entities: passive state holders the beam tool mutates.
//!
//! # Invariants
//! - Completion is single-fire by construction. A destroyable is consumed when
//!   it breaks; a repairable enters a terminal state that ignores further work.
//! - Amounts are clamped to finite, non-negative values; nothing here fails.

pub mod destroyable;
pub mod repairable;

pub use destroyable::{Damaged, Destroyable, Destruction};
pub use repairable::{AppearanceSwap, RepairCompletion, RepairOutcome, RepairState, Repairable};

/// Clamp an effect amount to a finite, non-negative value.
pub(crate) fn sanitize_amount(amount: f32) -> f32 {
    if amount.is_finite() { amount.max(0.0) } else { 0.0 }
}

pub fn crate_info() -> &'static str {
    "multitool-targets v0.1.0"
}
