/// Shortest total time a mission can be configured with, in seconds.
pub const MIN_TOTAL_TIME: f32 = 0.1;

/// Mission countdown. Expiry is reported exactly once.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionTimer {
    total: f32,
    remaining: f32,
    running: bool,
    expired: bool,
}

impl MissionTimer {
    /// A stopped timer with the full time remaining.
    pub fn new(total: f32) -> Self {
        let total = total.max(MIN_TOTAL_TIME);
        Self {
            total,
            remaining: total,
            running: false,
            expired: false,
        }
    }

    pub fn start(&mut self) {
        if !self.expired {
            self.running = true;
        }
    }

    pub fn pause(&mut self) {
        self.running = false;
    }

    pub fn reset(&mut self) {
        self.remaining = self.total;
        self.running = false;
        self.expired = false;
    }

    pub fn set_total_time(&mut self, total: f32) {
        self.total = total.max(MIN_TOTAL_TIME);
        self.reset();
    }

    /// Add (or with a negative delta, remove) time, clamped to `[0, total]`.
    pub fn modify_remaining(&mut self, delta: f32) {
        self.remaining = (self.remaining + delta).clamp(0.0, self.total);
    }

    pub fn remaining(&self) -> f32 {
        self.remaining
    }

    pub fn total(&self) -> f32 {
        self.total
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_finished(&self) -> bool {
        self.remaining <= 0.0 && !self.running
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Remaining fraction in `[0, 1]`; drives the countdown sliders.
    pub fn normalized_remaining(&self) -> f32 {
        (self.remaining / self.total).clamp(0.0, 1.0)
    }

    /// Count down by `dt`. Returns true on the tick the timer runs out.
    pub fn tick(&mut self, dt: f32) -> bool {
        if self.expired || !self.running {
            return false;
        }
        self.remaining -= dt.max(0.0);
        if self.remaining > 0.0 {
            return false;
        }
        self.remaining = 0.0;
        self.running = false;
        self.expired = true;
        tracing::info!(total = self.total, "mission timer expired");
        true
    }
}
