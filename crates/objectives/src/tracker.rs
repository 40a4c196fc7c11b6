use std::collections::BTreeSet;

use crate::event::{ObjectiveEvent, WinEvent};

/// Result of reporting one completion to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerOutcome {
    Counted { completed: usize, total: usize },
    Won(WinEvent),
    Duplicate,
    Unregistered,
    AlreadyWon,
}

/// Aggregates completion events into a single win condition.
///
/// The set of objectives is fixed at construction.
#[derive(Debug, Clone, Default)]
pub struct ObjectiveTracker {
    pending: BTreeSet<ObjectiveEvent>,
    done: BTreeSet<ObjectiveEvent>,
    total: usize,
    won: bool,
}

impl ObjectiveTracker {
    pub fn new(objectives: impl IntoIterator<Item = ObjectiveEvent>) -> Self {
        let pending: BTreeSet<ObjectiveEvent> = objectives.into_iter().collect();
        let total = pending.len();
        Self {
            pending,
            done: BTreeSet::new(),
            total,
            won: false,
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.done.len()
    }

    pub fn is_won(&self) -> bool {
        self.won
    }

    /// Completed fraction; 0 when nothing is registered.
    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed() as f32 / self.total as f32
        }
    }

    pub fn is_registered(&self, event: &ObjectiveEvent) -> bool {
        self.pending.contains(event) || self.done.contains(event)
    }

    pub fn register_completion(&mut self, event: ObjectiveEvent) -> TrackerOutcome {
        if self.won {
            return TrackerOutcome::AlreadyWon;
        }
        if self.done.contains(&event) {
            tracing::debug!(?event, "duplicate completion ignored");
            return TrackerOutcome::Duplicate;
        }
        if !self.pending.remove(&event) {
            tracing::warn!(?event, "completion for unregistered objective");
            return TrackerOutcome::Unregistered;
        }
        self.done.insert(event);

        let completed = self.completed();
        tracing::info!(?event, completed, total = self.total, "objective complete");
        if completed == self.total {
            self.won = true;
            tracing::info!("all objectives completed");
            return TrackerOutcome::Won(WinEvent);
        }
        TrackerOutcome::Counted {
            completed,
            total: self.total,
        }
    }
}
