//! Components carried by everything that can be hit.

use serde::{Deserialize, Serialize};
use voidfire_logic::math::Vec3;

/// World-space position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position(pub Vec3);

/// Units per second, before speed multipliers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Velocity(pub Vec3);

/// Collision sphere radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub radius: f32,
}

impl Default for Hitbox {
    fn default() -> Self {
        Self { radius: 1.0 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self { current: max, max }
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            (self.current / self.max).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Subtract damage; returns the amount actually removed.
    pub fn damage(&mut self, amount: f32) -> f32 {
        if !(amount > 0.0) || self.is_dead() {
            return 0.0;
        }
        let dealt = amount.min(self.current);
        self.current -= amount;
        dealt
    }

    pub fn heal(&mut self, amount: f32) {
        if amount > 0.0 && !self.is_dead() {
            self.current = (self.current + amount).min(self.max);
        }
    }
}

/// Hostile target. Stores unscaled stats so scaling can be recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub base_health: f32,
    pub base_speed: f32,
    pub base_damage: f32,
}

/// The player ship. Exactly one per engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Player;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_damage_and_heal() {
        let mut h = Health::new(100.0);
        assert_eq!(h.damage(30.0), 30.0);
        h.heal(10.0);
        assert_eq!(h.current, 80.0);
        h.heal(500.0);
        assert_eq!(h.current, 100.0);
        assert_eq!(h.damage(150.0), 100.0);
        assert!(h.is_dead());
        assert_eq!(h.damage(10.0), 0.0);
        h.heal(10.0);
        assert!(h.is_dead());
    }

    #[test]
    fn test_health_ignores_nan() {
        let mut h = Health::new(50.0);
        assert_eq!(h.damage(f32::NAN), 0.0);
        assert_eq!(h.current, 50.0);
    }
}
