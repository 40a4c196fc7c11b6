use crate::action::Action;

/// Per-tick view of the player's intents. Read-only for consumers.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InputSnapshot {
    /// Activation button is held this tick.
    pub activation_held: bool,
    /// True for exactly one tick per cycle-mode press.
    pub cycle_mode: bool,
    /// Signed scroll since the previous tick; zero when idle.
    pub scroll_delta: f32,
}

impl InputSnapshot {
    pub fn held() -> Self {
        Self {
            activation_held: true,
            ..Self::default()
        }
    }

    pub fn with_cycle(mut self) -> Self {
        self.cycle_mode = true;
        self
    }

    pub fn with_scroll(mut self, delta: f32) -> Self {
        self.scroll_delta = delta;
        self
    }
}

/// Folds actions arriving between ticks into snapshots.
///
/// Edge-style fields (cycle, scroll) reset after every [`snapshot`](Self::snapshot);
/// the activation level persists until a release arrives. While disabled every
/// snapshot is neutral and incoming actions are dropped.
#[derive(Debug, Default)]
pub struct InputCollector {
    activation_held: bool,
    cycle_pending: bool,
    scroll: f32,
    disabled: bool,
}

impl InputCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        if self.disabled {
            return;
        }
        match action {
            Action::BeamPressed => self.activation_held = true,
            Action::BeamReleased => self.activation_held = false,
            Action::CycleMode => self.cycle_pending = true,
            Action::Scroll(delta) if delta.is_finite() => self.scroll += delta,
            Action::Scroll(_) => {}
        }
    }

    /// Produce this tick's snapshot and reset the per-tick fields.
    pub fn snapshot(&mut self) -> InputSnapshot {
        let snap = InputSnapshot {
            activation_held: self.activation_held,
            cycle_mode: std::mem::take(&mut self.cycle_pending),
            scroll_delta: std::mem::take(&mut self.scroll),
        };
        tracing::trace!(?snap, "input snapshot");
        snap
    }

    /// Stop accepting input and drop anything held or pending.
    pub fn disable(&mut self) {
        self.disabled = true;
        self.activation_held = false;
        self.cycle_pending = false;
        self.scroll = 0.0;
    }

    pub fn enable(&mut self) {
        self.disabled = false;
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}
