use serde::{Deserialize, Serialize};

use crate::sanitize_amount;

/// A mining target with health. Exists only while alive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Destroyable {
    max_health: f32,
    health: f32,
    drop: Option<String>,
    break_effect: Option<String>,
    break_sound: Option<String>,
}

/// Result of damaging a [`Destroyable`].
#[must_use]
#[derive(Debug, Clone, PartialEq)]
pub enum Damaged {
    Alive(Destroyable),
    Destroyed(Destruction),
}

/// What the environment has to do when a destroyable breaks.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Destruction {
    /// Object to spawn where the entity stood.
    pub drop: Option<String>,
    pub break_effect: Option<String>,
    pub break_sound: Option<String>,
}

impl Destroyable {
    pub fn new(max_health: f32) -> Self {
        Self {
            max_health,
            health: max_health,
            drop: None,
            break_effect: None,
            break_sound: None,
        }
    }

    pub fn with_drop(mut self, drop: impl Into<String>) -> Self {
        self.drop = Some(drop.into());
        self
    }

    pub fn with_break_effect(mut self, effect: impl Into<String>) -> Self {
        self.break_effect = Some(effect.into());
        self
    }

    pub fn with_break_sound(mut self, sound: impl Into<String>) -> Self {
        self.break_sound = Some(sound.into());
        self
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Remaining health as a fraction of max, for UI.
    pub fn health_fraction(&self) -> f32 {
        if self.max_health > 0.0 {
            (self.health / self.max_health).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Reduce health by `amount`. Breaking consumes the entity.
    pub fn apply_damage(mut self, amount: f32) -> Damaged {
        self.health -= sanitize_amount(amount);
        if self.health <= 0.0 {
            tracing::debug!(max_health = self.max_health, "destroyable broke");
            return Damaged::Destroyed(Destruction {
                drop: self.drop,
                break_effect: self.break_effect,
                break_sound: self.break_sound,
            });
        }
        Damaged::Alive(self)
    }
}
