use serde::{Deserialize, Serialize};

use crate::sanitize_amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RepairState {
    InProgress,
    Repaired,
}

/// Mesh and material to show once an object is repaired.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AppearanceSwap {
    pub mesh: Option<String>,
    pub material: Option<String>,
}

/// A broken object that accumulates repair progress until done.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Repairable {
    max_repair_time: f32,
    progress: f32,
    state: RepairState,
    appearance: AppearanceSwap,
    complete_effect: Option<String>,
    complete_sound: Option<String>,
}

/// One-time payload of a finished repair.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepairCompletion {
    pub appearance: AppearanceSwap,
    pub effect: Option<String>,
    pub sound: Option<String>,
}

#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum RepairOutcome {
    /// Already repaired; nothing changed.
    Ignored,
    Progressed { progress: f32 },
    Completed(RepairCompletion),
}

impl Repairable {
    pub fn new(max_repair_time: f32) -> Self {
        Self {
            max_repair_time: max_repair_time.max(0.0),
            progress: 0.0,
            state: RepairState::InProgress,
            appearance: AppearanceSwap::default(),
            complete_effect: None,
            complete_sound: None,
        }
    }

    pub fn with_appearance(mut self, appearance: AppearanceSwap) -> Self {
        self.appearance = appearance;
        self
    }

    pub fn with_complete_effect(mut self, effect: impl Into<String>) -> Self {
        self.complete_effect = Some(effect.into());
        self
    }

    pub fn with_complete_sound(mut self, sound: impl Into<String>) -> Self {
        self.complete_sound = Some(sound.into());
        self
    }

    pub fn state(&self) -> RepairState {
        self.state
    }

    pub fn is_repaired(&self) -> bool {
        self.state == RepairState::Repaired
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn max_repair_time(&self) -> f32 {
        self.max_repair_time
    }

    pub fn normalized_progress(&self) -> f32 {
        if self.max_repair_time > 0.0 {
            self.progress / self.max_repair_time
        } else {
            1.0
        }
    }

    pub fn apply_repair(&mut self, amount: f32) -> RepairOutcome {
        if self.state == RepairState::Repaired {
            return RepairOutcome::Ignored;
        }
        self.progress = (self.progress + sanitize_amount(amount)).min(self.max_repair_time);
        if self.progress < self.max_repair_time {
            return RepairOutcome::Progressed {
                progress: self.progress,
            };
        }

        self.state = RepairState::Repaired;
        tracing::debug!(max = self.max_repair_time, "repair complete");
        RepairOutcome::Completed(RepairCompletion {
            appearance: std::mem::take(&mut self.appearance),
            effect: self.complete_effect.take(),
            sound: self.complete_sound.take(),
        })
    }
}
