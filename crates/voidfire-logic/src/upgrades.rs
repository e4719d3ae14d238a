//! Weapon progression - upgrade levels and experience-driven evolution.
//!
//! These are two independent axes. Upgrade levels (1..=5) are bought or
//! granted and scale damage, fire rate, range and accuracy. Evolution is
//! earned by using a weapon: damage dealt and kills accumulate experience
//! that unlocks evolution stages with their own damage multiplier. Neither
//! axis knows about the session-scoped difficulty multipliers.

use serde::{Deserialize, Serialize};

use crate::constants::weapon::MAX_UPGRADE_LEVEL;
use crate::weapons::WeaponDefinition;

/// Per-level stat scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelScaling {
    pub damage: f32,
    pub fire_rate: f32,
    pub range: f32,
    /// Added to accuracy (result capped at 1.0).
    pub accuracy_bonus: f32,
}

const DAMAGE_PER_LEVEL: f32 = 0.15;
const FIRE_RATE_PER_LEVEL: f32 = 0.08;
const RANGE_PER_LEVEL: f32 = 0.05;
const ACCURACY_PER_LEVEL: f32 = 0.02;

/// Clamp a level into 1..=MAX_UPGRADE_LEVEL.
pub fn clamp_level(level: u8) -> u8 {
    level.clamp(1, MAX_UPGRADE_LEVEL)
}

/// Scaling for an upgrade level. Monotonic in every stat.
pub fn level_scaling(level: u8) -> LevelScaling {
    let steps = (clamp_level(level) - 1) as f32;
    LevelScaling {
        damage: 1.0 + DAMAGE_PER_LEVEL * steps,
        fire_rate: 1.0 + FIRE_RATE_PER_LEVEL * steps,
        range: 1.0 + RANGE_PER_LEVEL * steps,
        accuracy_bonus: ACCURACY_PER_LEVEL * steps,
    }
}

/// Apply level scaling to a definition, leaving damage alone (damage scaling
/// is applied at hit time so the pipeline order holds).
pub fn apply_level(def: &WeaponDefinition, level: u8) -> WeaponDefinition {
    let s = level_scaling(level);
    let mut out = def.clone();
    out.fire_rate *= s.fire_rate;
    out.range *= s.range;
    out.accuracy = (out.accuracy + s.accuracy_bonus).min(1.0);
    out
}

// ============================================================================
// EVOLUTION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EvolutionStage {
    Base,
    Enhanced,
    Advanced,
    Perfected,
}

impl EvolutionStage {
    pub const ALL: [EvolutionStage; 4] = [
        EvolutionStage::Base,
        EvolutionStage::Enhanced,
        EvolutionStage::Advanced,
        EvolutionStage::Perfected,
    ];

    /// Experience required to reach this stage.
    pub fn threshold(self) -> f32 {
        match self {
            EvolutionStage::Base => 0.0,
            EvolutionStage::Enhanced => 500.0,
            EvolutionStage::Advanced => 2000.0,
            EvolutionStage::Perfected => 6000.0,
        }
    }

    pub fn damage_multiplier(self) -> f32 {
        match self {
            EvolutionStage::Base => 1.0,
            EvolutionStage::Enhanced => 1.1,
            EvolutionStage::Advanced => 1.25,
            EvolutionStage::Perfected => 1.45,
        }
    }

    pub fn from_experience(xp: f32) -> Self {
        let mut stage = EvolutionStage::Base;
        for s in Self::ALL {
            if xp >= s.threshold() {
                stage = s;
            }
        }
        stage
    }
}

/// Experience per point of damage dealt.
const XP_PER_DAMAGE: f32 = 0.1;
/// Experience per kill.
const XP_PER_KILL: f32 = 10.0;

/// Accumulated experience for one weapon.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponExperience {
    pub xp: f32,
    pub kills: u32,
}

impl WeaponExperience {
    /// Record damage dealt and kills; returns the new stage if it changed.
    pub fn record(&mut self, damage: f32, kills: u32) -> Option<EvolutionStage> {
        let before = self.stage();
        if damage.is_finite() && damage > 0.0 {
            self.xp += damage * XP_PER_DAMAGE;
        }
        self.xp += kills as f32 * XP_PER_KILL;
        self.kills += kills;
        let after = self.stage();
        (after != before).then_some(after)
    }

    pub fn stage(&self) -> EvolutionStage {
        EvolutionStage::from_experience(self.xp)
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.stage().damage_multiplier()
    }

    /// Progress toward the next stage (1.0 at the final stage).
    pub fn progress(&self) -> f32 {
        let stage = self.stage();
        let next = match stage {
            EvolutionStage::Base => EvolutionStage::Enhanced,
            EvolutionStage::Enhanced => EvolutionStage::Advanced,
            EvolutionStage::Advanced => EvolutionStage::Perfected,
            EvolutionStage::Perfected => return 1.0,
        };
        let span = next.threshold() - stage.threshold();
        ((self.xp - stage.threshold()) / span).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weapons::WeaponKind;

    #[test]
    fn test_level_one_is_identity() {
        let s = level_scaling(1);
        assert_eq!(s.damage, 1.0);
        assert_eq!(s.fire_rate, 1.0);
        assert_eq!(s.range, 1.0);
        assert_eq!(s.accuracy_bonus, 0.0);
    }

    #[test]
    fn test_levels_monotonic() {
        for lvl in 1..MAX_UPGRADE_LEVEL {
            let a = level_scaling(lvl);
            let b = level_scaling(lvl + 1);
            assert!(b.damage > a.damage);
            assert!(b.fire_rate > a.fire_rate);
            assert!(b.range > a.range);
            assert!(b.accuracy_bonus > a.accuracy_bonus);
        }
    }

    #[test]
    fn test_levels_clamped() {
        assert_eq!(level_scaling(0), level_scaling(1));
        assert_eq!(level_scaling(200), level_scaling(MAX_UPGRADE_LEVEL));
    }

    #[test]
    fn test_apply_level_caps_accuracy() {
        let laser = WeaponKind::Laser.spec();
        let lv5 = apply_level(&laser, 5);
        assert_eq!(lv5.accuracy, 1.0);
        assert!(lv5.fire_rate > laser.fire_rate);
        assert_eq!(lv5.damage, laser.damage);
    }

    #[test]
    fn test_evolution_stages() {
        let mut xp = WeaponExperience::default();
        assert_eq!(xp.stage(), EvolutionStage::Base);
        assert_eq!(xp.record(4100.0, 10), Some(EvolutionStage::Enhanced));
        assert!((xp.xp - 510.0).abs() < 1e-3);
        assert_eq!(xp.kills, 10);
        assert_eq!(xp.record(1.0, 0), None);
        xp.record(100_000.0, 0);
        assert_eq!(xp.stage(), EvolutionStage::Perfected);
        assert_eq!(xp.progress(), 1.0);
        assert_eq!(xp.damage_multiplier(), 1.45);
    }

    #[test]
    fn test_evolution_ignores_bad_damage() {
        let mut xp = WeaponExperience::default();
        xp.record(f32::NAN, 0);
        xp.record(-50.0, 0);
        assert_eq!(xp.xp, 0.0);
    }
}
