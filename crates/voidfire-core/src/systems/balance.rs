//! Balancing engine - rolling performance window, global multiplier drift,
//! per-weapon auto-balance and enemy scaling.
//!
//! All mutable state lives in [`BalanceState`], which is plain serde data:
//! saving it and resuming from the copy replays identically.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};
use voidfire_logic::balance::{
    composite_score, direction_for, drift_target, drift_toward, nudge_weapon_scale,
    progression_factor, BalanceDirection, BalanceTuning, DifficultyTier, PerformanceSnapshot,
};
use voidfire_logic::constants::damage::{MIN_ENERGY_COST_FACTOR, MIN_FIRE_RATE};
use voidfire_logic::damage::clamp_damage;
use voidfire_logic::weapons::{WeaponDefinition, WeaponKind};

use crate::config::BalanceConfig;

/// Per-weapon auto-balance counters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponBalanceStats {
    /// Shots since the last evaluation.
    pub shots: u32,
    /// Hits since the last evaluation.
    pub hits: u32,
    /// Lifetime damage.
    pub damage: f32,
    /// Damage and efficiency scale, independent of the global multipliers.
    pub scale: f32,
}

impl Default for WeaponBalanceStats {
    fn default() -> Self {
        Self {
            shots: 0,
            hits: 0,
            damage: 0.0,
            scale: 1.0,
        }
    }
}

impl WeaponBalanceStats {
    pub fn success_rate(&self) -> f32 {
        if self.shots == 0 {
            0.0
        } else {
            self.hits as f32 / self.shots as f32
        }
    }
}

/// Counters for the sample currently being accumulated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntervalCounters {
    pub elapsed: f32,
    pub shots: u32,
    pub hits: u32,
    pub damage: f32,
    pub kills: u32,
    pub deaths: u32,
}

impl IntervalCounters {
    fn snapshot(&self) -> PerformanceSnapshot {
        let seconds = self.elapsed.max(f32::EPSILON);
        let minutes = seconds / 60.0;
        PerformanceSnapshot {
            accuracy: if self.shots == 0 {
                0.0
            } else {
                (self.hits as f32 / self.shots as f32).min(1.0)
            },
            damage_per_second: self.damage / seconds,
            kills_per_minute: self.kills as f32 / minutes,
            deaths_per_minute: self.deaths as f32 / minutes,
        }
    }
}

/// Everything the balancing engine remembers between frames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceState {
    pub difficulty: DifficultyTier,
    pub damage_multiplier: f32,
    pub energy_efficiency: f32,
    pub weapons: BTreeMap<WeaponKind, WeaponBalanceStats>,
    pub samples: VecDeque<PerformanceSnapshot>,
    pub interval: IntervalCounters,
    /// Total simulated seconds.
    pub elapsed: f32,
    pub level: u32,
    pub last_direction: BalanceDirection,
}

impl BalanceState {
    pub fn new(difficulty: DifficultyTier) -> Self {
        Self {
            difficulty,
            damage_multiplier: 1.0,
            energy_efficiency: 1.0,
            weapons: BTreeMap::new(),
            samples: VecDeque::new(),
            interval: IntervalCounters::default(),
            elapsed: 0.0,
            level: 1,
            last_direction: BalanceDirection::Neutral,
        }
    }
}

impl Default for BalanceState {
    fn default() -> Self {
        Self::new(DifficultyTier::default())
    }
}

pub struct BalancingEngine {
    tuning: BalanceTuning,
    state: BalanceState,
}

impl BalancingEngine {
    pub fn new(config: &BalanceConfig) -> Self {
        Self {
            tuning: config.tuning,
            state: BalanceState::new(config.difficulty),
        }
    }

    /// Resume from a saved state.
    pub fn from_state(tuning: BalanceTuning, state: BalanceState) -> Self {
        Self { tuning, state }
    }

    pub fn state(&self) -> &BalanceState {
        &self.state
    }

    pub fn tuning(&self) -> &BalanceTuning {
        &self.tuning
    }

    // ── Recording ──────────────────────────────────────────────────────

    /// One projectile resolved: hit or miss, and the damage it dealt.
    pub fn record_weapon_usage(&mut self, kind: WeaponKind, hit: bool, damage: f32) {
        let damage = if damage.is_finite() { damage.max(0.0) } else { 0.0 };
        let stats = self.state.weapons.entry(kind).or_default();
        stats.shots = stats.shots.saturating_add(1);
        stats.damage += damage;
        let interval = &mut self.state.interval;
        interval.shots = interval.shots.saturating_add(1);
        interval.damage += damage;
        if hit {
            stats.hits = stats.hits.saturating_add(1);
            interval.hits = interval.hits.saturating_add(1);
        }
    }

    /// Damage that did not come from a projectile hit (ticks, bursts).
    pub fn record_damage(&mut self, damage: f32) {
        if damage.is_finite() && damage > 0.0 {
            self.state.interval.damage += damage;
        }
    }

    pub fn record_kill(&mut self) {
        self.state.interval.kills = self.state.interval.kills.saturating_add(1);
    }

    pub fn record_death(&mut self) {
        self.state.interval.deaths = self.state.interval.deaths.saturating_add(1);
    }

    /// Append a finished sample to the rolling window.
    pub fn push_sample(&mut self, sample: PerformanceSnapshot) {
        self.state.samples.push_back(sample);
        while self.state.samples.len() > self.tuning.window_samples.max(1) {
            self.state.samples.pop_front();
        }
    }

    // ── Update ─────────────────────────────────────────────────────────

    /// Close samples that are due, then drift the global multipliers by at
    /// most `drift_rate × dt`.
    pub fn update(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.state.elapsed += dt;
        self.state.interval.elapsed += dt;

        let interval = self.tuning.sample_interval.max(f32::EPSILON);
        if self.state.interval.elapsed >= interval {
            let sample = self.state.interval.snapshot();
            self.state.interval = IntervalCounters::default();
            self.push_sample(sample);
            self.evaluate_weapons();
        }

        let direction = match self.score() {
            Some(score) => direction_for(score, &self.tuning),
            None => BalanceDirection::Neutral,
        };
        if direction != self.state.last_direction {
            log::debug!(
                "balance direction {:?} -> {:?} (score {:?})",
                self.state.last_direction,
                direction,
                self.score()
            );
            self.state.last_direction = direction;
        }

        let step = self.tuning.drift_rate * dt;
        let t = &self.tuning;
        self.state.damage_multiplier = drift_toward(
            self.state.damage_multiplier,
            drift_target(direction, t.damage_floor, t.damage_ceiling),
            step,
        );
        self.state.energy_efficiency = drift_toward(
            self.state.energy_efficiency,
            drift_target(direction, t.energy_floor, t.energy_ceiling),
            step,
        );
    }

    fn evaluate_weapons(&mut self) {
        for (kind, stats) in self.state.weapons.iter_mut() {
            if stats.shots < self.tuning.weapon_min_samples {
                continue;
            }
            let before = stats.scale;
            stats.scale =
                nudge_weapon_scale(stats.scale, stats.success_rate(), stats.shots, &self.tuning);
            if stats.scale != before {
                log::debug!(
                    "{:?} auto-balance {:.2} -> {:.2} (success {:.2} over {})",
                    kind,
                    before,
                    stats.scale,
                    stats.success_rate(),
                    stats.shots
                );
            }
            stats.shots = 0;
            stats.hits = 0;
        }
    }

    /// Average of the rolling window, if any sample has closed yet.
    pub fn window_average(&self) -> Option<PerformanceSnapshot> {
        let n = self.state.samples.len();
        if n == 0 {
            return None;
        }
        let mut sum = PerformanceSnapshot::default();
        for s in &self.state.samples {
            sum.accuracy += s.accuracy;
            sum.damage_per_second += s.damage_per_second;
            sum.kills_per_minute += s.kills_per_minute;
            sum.deaths_per_minute += s.deaths_per_minute;
        }
        let n = n as f32;
        Some(PerformanceSnapshot {
            accuracy: sum.accuracy / n,
            damage_per_second: sum.damage_per_second / n,
            kills_per_minute: sum.kills_per_minute / n,
            deaths_per_minute: sum.deaths_per_minute / n,
        })
    }

    /// Composite score of the window average.
    pub fn score(&self) -> Option<f32> {
        self.window_average()
            .map(|p| composite_score(&p, &self.tuning.targets, &self.tuning.weights))
    }

    // ── Outputs ────────────────────────────────────────────────────────

    pub fn damage_multiplier(&self) -> f32 {
        self.state.damage_multiplier
    }

    pub fn energy_efficiency(&self) -> f32 {
        self.state.energy_efficiency
    }

    pub fn weapon_scale(&self, kind: WeaponKind) -> f32 {
        self.state.weapons.get(&kind).map_or(1.0, |s| s.scale)
    }

    /// Weapon stats after global, tier and per-weapon multipliers, clamped
    /// to sane floors.
    pub fn apply_balancing(&self, def: &WeaponDefinition) -> WeaponDefinition {
        let tier = self.state.difficulty.multipliers();
        let scale = self.weapon_scale(def.kind);
        let mut out = def.clone();
        out.damage = clamp_damage(
            def.damage * self.state.damage_multiplier * tier.player_damage * scale,
        );
        let efficiency = (self.state.energy_efficiency * scale).max(f32::EPSILON);
        out.energy_cost = (def.energy_cost / efficiency)
            .max(def.energy_cost * MIN_ENERGY_COST_FACTOR)
            .max(0.0);
        if !(out.fire_rate >= MIN_FIRE_RATE) {
            out.fire_rate = MIN_FIRE_RATE;
        }
        out
    }

    fn minutes(&self) -> f32 {
        self.state.elapsed / 60.0
    }

    fn health_factor(&self) -> f32 {
        let t = &self.tuning;
        progression_factor(
            self.state.level,
            self.minutes(),
            t.health_per_level,
            t.health_per_minute,
            t.time_scaling_cap,
        )
    }

    pub fn calculate_enemy_health(&self, base: f32) -> f32 {
        let tier = self.state.difficulty.multipliers();
        (base * tier.enemy_health * self.health_factor()).max(1.0)
    }

    pub fn calculate_enemy_speed(&self, base: f32) -> f32 {
        let t = &self.tuning;
        let tier = self.state.difficulty.multipliers();
        let factor = progression_factor(
            self.state.level,
            self.minutes(),
            t.speed_per_level,
            t.speed_per_minute,
            t.time_scaling_cap,
        );
        (base * tier.enemy_speed * factor).max(0.0)
    }

    /// Enemy damage grows with the same progression curve as health.
    pub fn calculate_enemy_damage(&self, base: f32) -> f32 {
        let tier = self.state.difficulty.multipliers();
        (base * tier.enemy_damage * self.health_factor()).max(0.0)
    }

    // ── Settings ───────────────────────────────────────────────────────

    pub fn difficulty(&self) -> DifficultyTier {
        self.state.difficulty
    }

    pub fn set_difficulty(&mut self, tier: DifficultyTier) {
        if tier != self.state.difficulty {
            log::info!("difficulty {:?} -> {:?}", self.state.difficulty, tier);
            self.state.difficulty = tier;
        }
    }

    pub fn level(&self) -> u32 {
        self.state.level
    }

    /// Levels never go down.
    pub fn set_level(&mut self, level: u32) {
        self.state.level = self.state.level.max(level.max(1));
    }

    /// Forget performance history and return the multipliers to neutral.
    /// Difficulty and level are kept.
    pub fn reset(&mut self) {
        let difficulty = self.state.difficulty;
        let level = self.state.level;
        self.state = BalanceState::new(difficulty);
        self.state.level = level;
    }
}
