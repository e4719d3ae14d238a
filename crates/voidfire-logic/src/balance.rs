//! Balance math - performance scoring, multiplier drift and enemy scaling.
//!
//! The stateful balancing engine lives in `voidfire-core`; this module only
//! holds the formulas and tuning so they can be tested and swept in
//! isolation.

use serde::{Deserialize, Serialize};

/// Selectable difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DifficultyTier {
    Easy,
    #[default]
    Normal,
    Hard,
    Nightmare,
}

/// Fixed multiplier set for a difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierMultipliers {
    pub enemy_health: f32,
    pub enemy_speed: f32,
    pub enemy_damage: f32,
    pub player_damage: f32,
}

impl DifficultyTier {
    pub const ALL: [DifficultyTier; 4] = [
        DifficultyTier::Easy,
        DifficultyTier::Normal,
        DifficultyTier::Hard,
        DifficultyTier::Nightmare,
    ];

    pub fn multipliers(self) -> TierMultipliers {
        match self {
            DifficultyTier::Easy => TierMultipliers {
                enemy_health: 0.75,
                enemy_speed: 0.85,
                enemy_damage: 0.7,
                player_damage: 1.2,
            },
            DifficultyTier::Normal => TierMultipliers {
                enemy_health: 1.0,
                enemy_speed: 1.0,
                enemy_damage: 1.0,
                player_damage: 1.0,
            },
            DifficultyTier::Hard => TierMultipliers {
                enemy_health: 1.3,
                enemy_speed: 1.15,
                enemy_damage: 1.3,
                player_damage: 0.9,
            },
            DifficultyTier::Nightmare => TierMultipliers {
                enemy_health: 1.75,
                enemy_speed: 1.3,
                enemy_damage: 1.6,
                player_damage: 0.8,
            },
        }
    }
}

/// Player performance averaged over the rolling window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSnapshot {
    /// Hits ÷ shots (0.0–1.0).
    pub accuracy: f32,
    pub damage_per_second: f32,
    pub kills_per_minute: f32,
    pub deaths_per_minute: f32,
}

/// Baseline a "target" player hits. Scores are normalized against these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BaselineTargets {
    pub accuracy: f32,
    pub damage_per_second: f32,
    pub kills_per_minute: f32,
    /// Deaths per minute at which the death component bottoms out.
    pub deaths_per_minute: f32,
}

impl Default for BaselineTargets {
    fn default() -> Self {
        Self {
            accuracy: 0.6,
            damage_per_second: 50.0,
            kills_per_minute: 6.0,
            deaths_per_minute: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub accuracy: f32,
    pub damage_per_second: f32,
    pub kills_per_minute: f32,
    pub deaths_per_minute: f32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            accuracy: 0.3,
            damage_per_second: 0.3,
            kills_per_minute: 0.25,
            deaths_per_minute: 0.15,
        }
    }
}

/// Every balancing knob.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceTuning {
    /// Seconds between performance samples.
    pub sample_interval: f32,
    /// Samples kept in the rolling window.
    pub window_samples: usize,
    pub targets: BaselineTargets,
    pub weights: ScoreWeights,
    /// Below this composite score the game gets easier.
    pub low_threshold: f32,
    /// Above this composite score the game gets harder.
    pub high_threshold: f32,
    /// Maximum multiplier change per second.
    pub drift_rate: f32,
    pub damage_floor: f32,
    pub damage_ceiling: f32,
    pub energy_floor: f32,
    pub energy_ceiling: f32,
    /// Shots needed before a weapon's success rate is trusted.
    pub weapon_min_samples: u32,
    pub weapon_high_success: f32,
    pub weapon_low_success: f32,
    /// Per-evaluation step for per-weapon nudges.
    pub weapon_nudge: f32,
    pub weapon_scale_min: f32,
    pub weapon_scale_max: f32,
    pub health_per_level: f32,
    pub speed_per_level: f32,
    pub health_per_minute: f32,
    pub speed_per_minute: f32,
    /// Cap on the elapsed-time component (as an added fraction).
    pub time_scaling_cap: f32,
}

impl Default for BalanceTuning {
    fn default() -> Self {
        Self {
            sample_interval: 10.0,
            window_samples: 6,
            targets: BaselineTargets::default(),
            weights: ScoreWeights::default(),
            low_threshold: 0.35,
            high_threshold: 0.75,
            drift_rate: 0.02,
            damage_floor: 0.7,
            damage_ceiling: 1.5,
            energy_floor: 0.7,
            energy_ceiling: 1.5,
            weapon_min_samples: 20,
            weapon_high_success: 0.8,
            weapon_low_success: 0.3,
            weapon_nudge: 0.02,
            weapon_scale_min: 0.75,
            weapon_scale_max: 1.25,
            health_per_level: 0.1,
            speed_per_level: 0.03,
            health_per_minute: 0.02,
            speed_per_minute: 0.005,
            time_scaling_cap: 1.0,
        }
    }
}

fn ratio(value: f32, target: f32) -> f32 {
    if !(target > 0.0) || !value.is_finite() {
        return 0.0;
    }
    (value / target).clamp(0.0, 1.0)
}

/// Weighted blend of normalized metrics, each capped to [0, 1].
/// Deaths are inverted: more deaths lower the score.
pub fn composite_score(
    perf: &PerformanceSnapshot,
    targets: &BaselineTargets,
    weights: &ScoreWeights,
) -> f32 {
    let acc = ratio(perf.accuracy, targets.accuracy);
    let dps = ratio(perf.damage_per_second, targets.damage_per_second);
    let kpm = ratio(perf.kills_per_minute, targets.kills_per_minute);
    let dpm = 1.0 - ratio(perf.deaths_per_minute, targets.deaths_per_minute);

    let total_weight = weights.accuracy
        + weights.damage_per_second
        + weights.kills_per_minute
        + weights.deaths_per_minute;
    if total_weight <= 0.0 {
        return 0.5;
    }
    let blended = weights.accuracy * acc
        + weights.damage_per_second * dps
        + weights.kills_per_minute * kpm
        + weights.deaths_per_minute * dpm;
    (blended / total_weight).clamp(0.0, 1.0)
}

/// Which way the global multipliers should move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceDirection {
    /// Player is struggling: raise damage and efficiency.
    Easier,
    /// Score between the thresholds: relax toward 1.0.
    Neutral,
    /// Player is dominating: lower damage and efficiency.
    Harder,
}

pub fn direction_for(score: f32, tuning: &BalanceTuning) -> BalanceDirection {
    if score < tuning.low_threshold {
        BalanceDirection::Easier
    } else if score > tuning.high_threshold {
        BalanceDirection::Harder
    } else {
        BalanceDirection::Neutral
    }
}

/// Move `current` toward `target` by at most `max_step`.
pub fn drift_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let step = max_step.max(0.0);
    if (target - current).abs() <= step {
        target
    } else if target > current {
        current + step
    } else {
        current - step
    }
}

/// Target value for a multiplier with the given floor/ceiling.
pub fn drift_target(direction: BalanceDirection, floor: f32, ceiling: f32) -> f32 {
    match direction {
        BalanceDirection::Easier => ceiling,
        BalanceDirection::Neutral => 1.0,
        BalanceDirection::Harder => floor,
    }
}

/// Progression factor from game level and elapsed minutes.
/// Non-decreasing in both arguments.
pub fn progression_factor(
    level: u32,
    elapsed_minutes: f32,
    per_level: f32,
    per_minute: f32,
    time_cap: f32,
) -> f32 {
    let level_part = 1.0 + per_level.max(0.0) * level.saturating_sub(1) as f32;
    let time_part = 1.0 + (per_minute.max(0.0) * elapsed_minutes.max(0.0)).min(time_cap.max(0.0));
    level_part * time_part
}

/// Per-weapon nudge from its success rate. Returns the new scale.
pub fn nudge_weapon_scale(
    scale: f32,
    success_rate: f32,
    samples: u32,
    tuning: &BalanceTuning,
) -> f32 {
    if samples < tuning.weapon_min_samples {
        return scale;
    }
    let next = if success_rate > tuning.weapon_high_success {
        scale - tuning.weapon_nudge
    } else if success_rate < tuning.weapon_low_success {
        scale + tuning.weapon_nudge
    } else {
        scale
    };
    next.clamp(tuning.weapon_scale_min, tuning.weapon_scale_max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_struggling_player_scores_low() {
        let perf = PerformanceSnapshot {
            accuracy: 0.1,
            damage_per_second: 5.0,
            kills_per_minute: 1.0,
            deaths_per_minute: 0.0,
        };
        let tuning = BalanceTuning::default();
        let score = composite_score(&perf, &tuning.targets, &tuning.weights);
        assert!(score < tuning.low_threshold, "score {score}");
        assert_eq!(direction_for(score, &tuning), BalanceDirection::Easier);
    }

    #[test]
    fn test_dominating_player_scores_high() {
        let perf = PerformanceSnapshot {
            accuracy: 0.9,
            damage_per_second: 120.0,
            kills_per_minute: 12.0,
            deaths_per_minute: 0.0,
        };
        let tuning = BalanceTuning::default();
        let score = composite_score(&perf, &tuning.targets, &tuning.weights);
        assert!((score - 1.0).abs() < 1e-6);
        assert_eq!(direction_for(score, &tuning), BalanceDirection::Harder);
    }

    #[test]
    fn test_deaths_lower_score() {
        let tuning = BalanceTuning::default();
        let mut perf = PerformanceSnapshot {
            accuracy: 0.6,
            damage_per_second: 50.0,
            kills_per_minute: 6.0,
            deaths_per_minute: 0.0,
        };
        let a = composite_score(&perf, &tuning.targets, &tuning.weights);
        perf.deaths_per_minute = 2.0;
        let b = composite_score(&perf, &tuning.targets, &tuning.weights);
        assert!(b < a);
        assert!((a - b - 0.15).abs() < 1e-5);
    }

    #[test]
    fn test_drift_is_rate_limited() {
        assert!((drift_toward(1.0, 1.5, 0.02) - 1.02).abs() < 1e-6);
        assert!((drift_toward(1.0, 0.7, 0.02) - 0.98).abs() < 1e-6);
        assert_eq!(drift_toward(1.49, 1.5, 0.02), 1.5);
    }

    #[test]
    fn test_progression_monotonic() {
        for level in 1..10 {
            for minute in [0.0, 5.0, 30.0, 500.0] {
                assert!(progression_factor(level, minute, 0.1, 0.02, 1.0) >= 1.0);
            }
        }
        assert!(
            progression_factor(3, 10.0, 0.1, 0.02, 1.0)
                >= progression_factor(2, 10.0, 0.1, 0.02, 1.0)
        );
        assert!(
            progression_factor(2, 20.0, 0.1, 0.02, 1.0)
                >= progression_factor(2, 10.0, 0.1, 0.02, 1.0)
        );
        // Time component caps
        assert_eq!(
            progression_factor(1, 1000.0, 0.1, 0.02, 1.0),
            progression_factor(1, 2000.0, 0.1, 0.02, 1.0)
        );
    }

    #[test]
    fn test_weapon_nudge() {
        let t = BalanceTuning::default();
        assert_eq!(nudge_weapon_scale(1.0, 0.95, 5, &t), 1.0);
        assert!(nudge_weapon_scale(1.0, 0.95, 50, &t) < 1.0);
        assert!(nudge_weapon_scale(1.0, 0.1, 50, &t) > 1.0);
        assert_eq!(nudge_weapon_scale(1.0, 0.5, 50, &t), 1.0);
        assert_eq!(nudge_weapon_scale(t.weapon_scale_min, 0.99, 50, &t), t.weapon_scale_min);
    }

    #[test]
    fn test_tier_ordering() {
        let e = DifficultyTier::Easy.multipliers();
        let n = DifficultyTier::Nightmare.multipliers();
        assert!(e.enemy_health < n.enemy_health);
        assert!(e.player_damage > n.player_damage);
    }
}
