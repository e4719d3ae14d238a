//! Synergy definitions - bonus behavior unlocked by combinations of weapons
//! and power-ups.
//!
//! A synergy is keyed by an unordered set of 2 or 3 ingredients. The key
//! type sorts and deduplicates on construction so `{A, B}` and `{B, A}` hash
//! and compare equal.

use serde::{Deserialize, Serialize};

use crate::weapons::WeaponKind;

/// Temporary pickups that count as synergy ingredients while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerUpKind {
    RapidFire,
    DamageBoost,
    Shield,
    Multishot,
    EnergySurge,
    TimeWarp,
    Magnet,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 7] = [
        PowerUpKind::RapidFire,
        PowerUpKind::DamageBoost,
        PowerUpKind::Shield,
        PowerUpKind::Multishot,
        PowerUpKind::EnergySurge,
        PowerUpKind::TimeWarp,
        PowerUpKind::Magnet,
    ];

    /// Default duration in seconds when picked up.
    pub fn default_duration(self) -> f32 {
        match self {
            PowerUpKind::RapidFire => 10.0,
            PowerUpKind::DamageBoost => 10.0,
            PowerUpKind::Shield => 15.0,
            PowerUpKind::Multishot => 8.0,
            PowerUpKind::EnergySurge => 8.0,
            PowerUpKind::TimeWarp => 6.0,
            PowerUpKind::Magnet => 20.0,
        }
    }
}

/// One synergy ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ingredient {
    Weapon(WeaponKind),
    PowerUp(PowerUpKind),
}

impl From<WeaponKind> for Ingredient {
    fn from(kind: WeaponKind) -> Self {
        Ingredient::Weapon(kind)
    }
}

impl From<PowerUpKind> for Ingredient {
    fn from(kind: PowerUpKind) -> Self {
        Ingredient::PowerUp(kind)
    }
}

/// Order-independent key over 2–3 distinct ingredients.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SynergyKey(Vec<Ingredient>);

impl SynergyKey {
    /// Build a key; ingredients are sorted and deduplicated.
    pub fn new(ingredients: &[Ingredient]) -> Self {
        let mut items = ingredients.to_vec();
        items.sort();
        items.dedup();
        Self(items)
    }

    pub fn ingredients(&self) -> &[Ingredient] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True if every ingredient of the key is present in `available`.
    pub fn satisfied_by(&self, available: &[Ingredient]) -> bool {
        self.0.iter().all(|i| available.contains(i))
    }
}

/// Rarity tier; determines how long an activation lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub fn duration(self) -> f32 {
        match self {
            Rarity::Common => 15.0,
            Rarity::Rare => 20.0,
            Rarity::Epic => 25.0,
            Rarity::Legendary => 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum SynergyKind {
    Scattershot = 0,
    PlasmaStorm = 1,
    ThermalShock = 2,
    CarpetBombing = 3,
    FocusedLance = 4,
    BulletHell = 5,
    Pinball = 6,
    StaticShield = 7,
    Resonance = 8,
    Singularity = 9,
    Inferno = 10,
    GreyGoo = 11,
    Shatter = 12,
    Minefield = 13,
}

impl SynergyKind {
    pub const COUNT: usize = 14;

    pub const ALL: [SynergyKind; Self::COUNT] = [
        SynergyKind::Scattershot,
        SynergyKind::PlasmaStorm,
        SynergyKind::ThermalShock,
        SynergyKind::CarpetBombing,
        SynergyKind::FocusedLance,
        SynergyKind::BulletHell,
        SynergyKind::Pinball,
        SynergyKind::StaticShield,
        SynergyKind::Resonance,
        SynergyKind::Singularity,
        SynergyKind::Inferno,
        SynergyKind::GreyGoo,
        SynergyKind::Shatter,
        SynergyKind::Minefield,
    ];

    pub fn index(self) -> usize {
        self as usize
    }
}

/// Multipliers granted while a synergy is active, at strength 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SynergyBonus {
    pub damage: f32,
    pub fire_rate: f32,
    /// Multiplier on energy cost (below 1.0 is cheaper).
    pub energy_cost: f32,
}

impl SynergyBonus {
    pub const NONE: Self = Self {
        damage: 1.0,
        fire_rate: 1.0,
        energy_cost: 1.0,
    };

    /// Scale the deviation from 1.0 by `strength`.
    pub fn at_strength(&self, strength: f32) -> Self {
        let scale = |m: f32| (1.0 + (m - 1.0) * strength).max(0.05);
        Self {
            damage: scale(self.damage),
            fire_rate: scale(self.fire_rate),
            energy_cost: scale(self.energy_cost),
        }
    }

    /// Multiply two bonuses together.
    pub fn combine(&self, other: &Self) -> Self {
        Self {
            damage: self.damage * other.damage,
            fire_rate: self.fire_rate * other.fire_rate,
            energy_cost: self.energy_cost * other.energy_cost,
        }
    }
}

impl Default for SynergyBonus {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SynergyDefinition {
    pub kind: SynergyKind,
    pub name: &'static str,
    pub key: SynergyKey,
    pub strength: f32,
    pub rarity: Rarity,
    pub bonus: SynergyBonus,
}

impl SynergyDefinition {
    pub fn duration(&self) -> f32 {
        self.rarity.duration()
    }
}

impl SynergyKind {
    /// Builtin definition for this synergy.
    pub fn spec(&self) -> SynergyDefinition {
        use Ingredient::{PowerUp as P, Weapon as W};
        let (name, ingredients, strength, rarity, bonus): (_, Vec<Ingredient>, _, _, _) = match self
        {
            Self::Scattershot => (
                "Scattershot",
                vec![W(WeaponKind::Standard), W(WeaponKind::Scatter)],
                1.5,
                Rarity::Common,
                bonus(1.2, 1.1, 1.0),
            ),
            Self::PlasmaStorm => (
                "Plasma Storm",
                vec![W(WeaponKind::Plasma), W(WeaponKind::Tesla)],
                1.6,
                Rarity::Rare,
                bonus(1.3, 1.0, 0.9),
            ),
            Self::ThermalShock => (
                "Thermal Shock",
                vec![W(WeaponKind::Flamethrower), W(WeaponKind::Cryo)],
                1.8,
                Rarity::Epic,
                bonus(1.4, 1.0, 1.0),
            ),
            Self::CarpetBombing => (
                "Carpet Bombing",
                vec![W(WeaponKind::Missile), W(WeaponKind::ClusterBomb)],
                1.5,
                Rarity::Rare,
                bonus(1.25, 1.15, 1.0),
            ),
            Self::FocusedLance => (
                "Focused Lance",
                vec![W(WeaponKind::Laser), W(WeaponKind::Railgun)],
                1.7,
                Rarity::Rare,
                bonus(1.35, 1.0, 0.85),
            ),
            Self::BulletHell => (
                "Bullet Hell",
                vec![W(WeaponKind::Standard), P(PowerUpKind::RapidFire)],
                1.3,
                Rarity::Common,
                bonus(1.0, 1.4, 0.9),
            ),
            Self::Pinball => (
                "Pinball",
                vec![W(WeaponKind::Ricochet), P(PowerUpKind::Multishot)],
                1.4,
                Rarity::Common,
                bonus(1.15, 1.1, 1.0),
            ),
            Self::StaticShield => (
                "Static Shield",
                vec![W(WeaponKind::Tesla), P(PowerUpKind::Shield)],
                1.2,
                Rarity::Common,
                bonus(1.1, 1.0, 0.8),
            ),
            Self::Resonance => (
                "Resonance",
                vec![W(WeaponKind::WaveCannon), W(WeaponKind::Helix)],
                1.6,
                Rarity::Epic,
                bonus(1.3, 1.2, 1.0),
            ),
            Self::Singularity => (
                "Singularity",
                vec![
                    W(WeaponKind::Nova),
                    W(WeaponKind::Vortex),
                    P(PowerUpKind::TimeWarp),
                ],
                2.0,
                Rarity::Legendary,
                bonus(1.5, 1.2, 0.8),
            ),
            Self::Inferno => (
                "Inferno",
                vec![
                    W(WeaponKind::Flamethrower),
                    P(PowerUpKind::DamageBoost),
                    P(PowerUpKind::EnergySurge),
                ],
                2.2,
                Rarity::Legendary,
                bonus(1.5, 1.1, 0.7),
            ),
            Self::GreyGoo => (
                "Grey Goo",
                vec![W(WeaponKind::Quantum), W(WeaponKind::Nanite)],
                2.0,
                Rarity::Legendary,
                bonus(1.45, 1.15, 0.9),
            ),
            Self::Shatter => (
                "Shatter",
                vec![W(WeaponKind::Cryo), W(WeaponKind::Railgun)],
                1.6,
                Rarity::Rare,
                bonus(1.4, 1.0, 1.0),
            ),
            Self::Minefield => (
                "Minefield",
                vec![W(WeaponKind::Mine), P(PowerUpKind::Magnet)],
                1.3,
                Rarity::Common,
                bonus(1.2, 1.2, 1.0),
            ),
        };

        SynergyDefinition {
            kind: *self,
            name,
            key: SynergyKey::new(&ingredients),
            strength,
            rarity,
            bonus,
        }
    }
}

fn bonus(damage: f32, fire_rate: f32, energy_cost: f32) -> SynergyBonus {
    SynergyBonus {
        damage,
        fire_rate,
        energy_cost,
    }
}

/// Named amplification that fires when all of its synergies overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ChainReactionKind {
    ElementalCascade,
    Overload,
    Armageddon,
    EventHorizon,
    Harmonics,
}

impl ChainReactionKind {
    pub const ALL: [ChainReactionKind; 5] = [
        ChainReactionKind::ElementalCascade,
        ChainReactionKind::Overload,
        ChainReactionKind::Armageddon,
        ChainReactionKind::EventHorizon,
        ChainReactionKind::Harmonics,
    ];

    pub fn rule(&self) -> ChainReactionRule {
        let (name, participants): (_, &'static [SynergyKind]) = match self {
            Self::ElementalCascade => (
                "Elemental Cascade",
                &[SynergyKind::PlasmaStorm, SynergyKind::ThermalShock],
            ),
            Self::Overload => (
                "Overload",
                &[SynergyKind::FocusedLance, SynergyKind::Shatter],
            ),
            Self::Armageddon => (
                "Armageddon",
                &[SynergyKind::CarpetBombing, SynergyKind::Minefield],
            ),
            Self::EventHorizon => (
                "Event Horizon",
                &[SynergyKind::Singularity, SynergyKind::GreyGoo],
            ),
            Self::Harmonics => (
                "Harmonics",
                &[
                    SynergyKind::Resonance,
                    SynergyKind::Scattershot,
                    SynergyKind::Pinball,
                ],
            ),
        };
        ChainReactionRule {
            kind: *self,
            name,
            participants,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainReactionRule {
    pub kind: ChainReactionKind,
    pub name: &'static str,
    pub participants: &'static [SynergyKind],
}
