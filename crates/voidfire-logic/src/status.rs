//! Status effect definitions - category, stacking rule and per-tick magnitude.
//!
//! Stacking rules decide what happens when a kind that is already active on
//! a target is applied again. Stat modifiers compose as
//! `multiplier ^ effective_strength`, so stacks compound multiplicatively.

use serde::{Deserialize, Serialize};

use crate::constants::status as tuning;

/// Every status effect in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum StatusEffectKind {
    // Debuffs
    Burning = 0,
    Poisoned = 1,
    Frozen = 2,
    Electrified = 3,
    Melting = 4,
    NaniteSwarm = 5,
    Weakened = 6,
    Stunned = 7,
    Gravitized = 8,
    Marked = 9,
    // Special
    QuantumEntangled = 10,
    PhaseShifted = 11,
    // Buffs
    Overcharged = 12,
    Hasted = 13,
    Regenerating = 14,
    Shielded = 15,
}

impl StatusEffectKind {
    pub const COUNT: usize = 16;

    pub const ALL: [StatusEffectKind; Self::COUNT] = [
        StatusEffectKind::Burning,
        StatusEffectKind::Poisoned,
        StatusEffectKind::Frozen,
        StatusEffectKind::Electrified,
        StatusEffectKind::Melting,
        StatusEffectKind::NaniteSwarm,
        StatusEffectKind::Weakened,
        StatusEffectKind::Stunned,
        StatusEffectKind::Gravitized,
        StatusEffectKind::Marked,
        StatusEffectKind::QuantumEntangled,
        StatusEffectKind::PhaseShifted,
        StatusEffectKind::Overcharged,
        StatusEffectKind::Hasted,
        StatusEffectKind::Regenerating,
        StatusEffectKind::Shielded,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Broad classification of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EffectCategory {
    Buff,
    Debuff,
    Special,
}

/// What happens when an already-active kind is applied again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StackingRule {
    /// Reset the remaining duration only.
    Refresh,
    /// Add the new duration to the remaining one.
    ExtendDuration,
    /// Add a stack up to the maximum; at the maximum behaves like `Refresh`.
    IncreaseIntensity,
    /// Keep every application as its own instance.
    Independent,
    /// Discard the old instance.
    Replace,
}

/// Cross-entity behavior attached to a kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpecialBehavior {
    None,
    /// May jump to one nearby target that does not carry the effect yet.
    Chain,
    /// May ignite nearby targets probabilistically.
    Spread,
    /// May trigger a one-off special event.
    Quantum,
}

/// Multiplicative stat modifiers carried by an effect or aggregated over a target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatModifiers {
    /// Outgoing damage.
    pub damage: f32,
    pub movement_speed: f32,
    pub attack_speed: f32,
    /// Incoming damage.
    pub damage_taken: f32,
}

impl StatModifiers {
    pub const IDENTITY: Self = Self {
        damage: 1.0,
        movement_speed: 1.0,
        attack_speed: 1.0,
        damage_taken: 1.0,
    };

    /// Fold `other` in with weight `strength` (`self *= other ^ strength`).
    pub fn compose(&mut self, other: &StatModifiers, strength: f32) {
        self.damage *= pow_modifier(other.damage, strength);
        self.movement_speed *= pow_modifier(other.movement_speed, strength);
        self.attack_speed *= pow_modifier(other.attack_speed, strength);
        self.damage_taken *= pow_modifier(other.damage_taken, strength);
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for StatModifiers {
    fn default() -> Self {
        Self::IDENTITY
    }
}

fn pow_modifier(multiplier: f32, strength: f32) -> f32 {
    if strength <= 0.0 {
        return 1.0;
    }
    if multiplier <= 0.0 {
        return 0.0;
    }
    multiplier.powf(strength)
}

/// Static definition of one effect kind.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffectDefinition {
    pub kind: StatusEffectKind,
    pub name: &'static str,
    pub category: EffectCategory,
    pub stacking: StackingRule,
    /// Maximum stack count (or instance count for `Independent`).
    pub max_stacks: u8,
    pub base_duration: f32,
    pub damage_per_second: f32,
    pub heal_per_second: f32,
    pub modifiers: StatModifiers,
    pub dispellable: bool,
    pub special: SpecialBehavior,
}

impl StatusEffectKind {
    /// Builtin definition for this kind.
    pub fn spec(&self) -> StatusEffectDefinition {
        let base = StatusEffectDefinition {
            kind: *self,
            name: "",
            category: EffectCategory::Debuff,
            stacking: StackingRule::Refresh,
            max_stacks: 1,
            base_duration: 3.0,
            damage_per_second: 0.0,
            heal_per_second: 0.0,
            modifiers: StatModifiers::IDENTITY,
            dispellable: true,
            special: SpecialBehavior::None,
        };

        match self {
            Self::Burning => StatusEffectDefinition {
                name: "Burning",
                stacking: StackingRule::IncreaseIntensity,
                max_stacks: 5,
                base_duration: 3.0,
                damage_per_second: 5.0,
                special: SpecialBehavior::Spread,
                ..base
            },
            Self::Poisoned => StatusEffectDefinition {
                name: "Poisoned",
                stacking: StackingRule::ExtendDuration,
                base_duration: 5.0,
                damage_per_second: 3.0,
                ..base
            },
            Self::Frozen => StatusEffectDefinition {
                name: "Frozen",
                base_duration: 2.0,
                modifiers: StatModifiers {
                    movement_speed: 0.5,
                    attack_speed: 0.7,
                    ..StatModifiers::IDENTITY
                },
                ..base
            },
            Self::Electrified => StatusEffectDefinition {
                name: "Electrified",
                base_duration: 2.0,
                damage_per_second: 2.0,
                modifiers: StatModifiers {
                    attack_speed: 0.85,
                    ..StatModifiers::IDENTITY
                },
                special: SpecialBehavior::Chain,
                ..base
            },
            Self::Melting => StatusEffectDefinition {
                name: "Melting",
                stacking: StackingRule::IncreaseIntensity,
                max_stacks: 3,
                base_duration: 4.0,
                damage_per_second: 1.0,
                modifiers: StatModifiers {
                    damage_taken: 1.1,
                    ..StatModifiers::IDENTITY
                },
                ..base
            },
            Self::NaniteSwarm => StatusEffectDefinition {
                name: "Nanite Swarm",
                stacking: StackingRule::IncreaseIntensity,
                max_stacks: 10,
                base_duration: 5.0,
                damage_per_second: 1.5,
                ..base
            },
            Self::Weakened => StatusEffectDefinition {
                name: "Weakened",
                stacking: StackingRule::Replace,
                base_duration: 6.0,
                modifiers: StatModifiers {
                    damage: 0.7,
                    ..StatModifiers::IDENTITY
                },
                ..base
            },
            Self::Stunned => StatusEffectDefinition {
                name: "Stunned",
                base_duration: 1.0,
                modifiers: StatModifiers {
                    movement_speed: 0.0,
                    attack_speed: 0.0,
                    ..StatModifiers::IDENTITY
                },
                ..base
            },
            Self::Gravitized => StatusEffectDefinition {
                name: "Gravitized",
                stacking: StackingRule::Independent,
                max_stacks: 4,
                base_duration: 3.0,
                modifiers: StatModifiers {
                    movement_speed: 0.8,
                    ..StatModifiers::IDENTITY
                },
                ..base
            },
            Self::Marked => StatusEffectDefinition {
                name: "Marked",
                stacking: StackingRule::Replace,
                base_duration: 8.0,
                modifiers: StatModifiers {
                    damage_taken: 1.25,
                    ..StatModifiers::IDENTITY
                },
                ..base
            },
            Self::QuantumEntangled => StatusEffectDefinition {
                name: "Quantum Entangled",
                category: EffectCategory::Special,
                base_duration: 4.0,
                modifiers: StatModifiers {
                    damage_taken: 1.1,
                    ..StatModifiers::IDENTITY
                },
                dispellable: false,
                special: SpecialBehavior::Quantum,
                ..base
            },
            Self::PhaseShifted => StatusEffectDefinition {
                name: "Phase Shifted",
                category: EffectCategory::Special,
                stacking: StackingRule::Independent,
                max_stacks: 3,
                base_duration: 2.0,
                modifiers: StatModifiers {
                    damage_taken: 0.8,
                    ..StatModifiers::IDENTITY
                },
                dispellable: false,
                ..base
            },
            Self::Overcharged => StatusEffectDefinition {
                name: "Overcharged",
                category: EffectCategory::Buff,
                base_duration: 5.0,
                modifiers: StatModifiers {
                    damage: 1.25,
                    attack_speed: 1.2,
                    ..StatModifiers::IDENTITY
                },
                dispellable: false,
                ..base
            },
            Self::Hasted => StatusEffectDefinition {
                name: "Hasted",
                category: EffectCategory::Buff,
                stacking: StackingRule::ExtendDuration,
                base_duration: 5.0,
                modifiers: StatModifiers {
                    movement_speed: 1.3,
                    ..StatModifiers::IDENTITY
                },
                dispellable: false,
                ..base
            },
            Self::Regenerating => StatusEffectDefinition {
                name: "Regenerating",
                category: EffectCategory::Buff,
                stacking: StackingRule::IncreaseIntensity,
                max_stacks: 3,
                base_duration: 6.0,
                heal_per_second: 4.0,
                dispellable: false,
                ..base
            },
            Self::Shielded => StatusEffectDefinition {
                name: "Shielded",
                category: EffectCategory::Buff,
                stacking: StackingRule::Replace,
                base_duration: 8.0,
                modifiers: StatModifiers {
                    damage_taken: 0.5,
                    ..StatModifiers::IDENTITY
                },
                dispellable: false,
                ..base
            },
        }
    }
}

/// Tuning for the cross-entity behaviors (chain, spread, quantum).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusTuning {
    pub chain_radius: f32,
    pub chain_chance: f32,
    pub chain_duration_factor: f32,
    pub max_chain_generations: u8,
    pub spread_radius: f32,
    pub spread_chance: f32,
    pub quantum_event_chance: f32,
}

impl Default for StatusTuning {
    fn default() -> Self {
        Self {
            chain_radius: tuning::CHAIN_RADIUS,
            chain_chance: tuning::CHAIN_CHANCE,
            chain_duration_factor: tuning::CHAIN_DURATION_FACTOR,
            max_chain_generations: tuning::MAX_CHAIN_GENERATIONS,
            spread_radius: tuning::SPREAD_RADIUS,
            spread_chance: tuning::SPREAD_CHANCE,
            quantum_event_chance: tuning::QUANTUM_EVENT_CHANCE,
        }
    }
}
