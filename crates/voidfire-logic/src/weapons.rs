//! Weapon definitions - the immutable stat block behind every weapon kind.
//!
//! Each [`WeaponKind`] maps to exactly one [`WeaponDefinition`] through
//! [`WeaponKind::spec`]. Behavior is data: the firing discipline, the
//! spatial pattern, the projectile movement model and the terminal effects
//! (penetration, ricochet, fuse, cluster) are all fields, so weapons compose
//! behaviors instead of subclassing them.

use serde::{Deserialize, Serialize};

use crate::constants::weapon::UNLIMITED_AMMO;
use crate::status::StatusEffectKind;

/// Projectile speed used by weapons that hit instantly (beams).
pub const INSTANT_SPEED: f32 = f32::INFINITY;

/// Every weapon in the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum WeaponKind {
    Standard = 0,
    Laser = 1,
    Plasma = 2,
    Missile = 3,
    Railgun = 4,
    Scatter = 5,
    Flamethrower = 6,
    Tesla = 7,
    Cryo = 8,
    PulseRifle = 9,
    Nova = 10,
    Vortex = 11,
    WaveCannon = 12,
    Helix = 13,
    Quantum = 14,
    Ricochet = 15,
    ClusterBomb = 16,
    Mine = 17,
    Nanite = 18,
}

impl WeaponKind {
    pub const COUNT: usize = 19;

    /// All weapon kinds in catalog order.
    pub const ALL: [WeaponKind; Self::COUNT] = [
        WeaponKind::Standard,
        WeaponKind::Laser,
        WeaponKind::Plasma,
        WeaponKind::Missile,
        WeaponKind::Railgun,
        WeaponKind::Scatter,
        WeaponKind::Flamethrower,
        WeaponKind::Tesla,
        WeaponKind::Cryo,
        WeaponKind::PulseRifle,
        WeaponKind::Nova,
        WeaponKind::Vortex,
        WeaponKind::WaveCannon,
        WeaponKind::Helix,
        WeaponKind::Quantum,
        WeaponKind::Ricochet,
        WeaponKind::ClusterBomb,
        WeaponKind::Mine,
        WeaponKind::Nanite,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard Blaster",
            Self::Laser => "Laser",
            Self::Plasma => "Plasma Cannon",
            Self::Missile => "Homing Missile",
            Self::Railgun => "Railgun",
            Self::Scatter => "Scatter Gun",
            Self::Flamethrower => "Flamethrower",
            Self::Tesla => "Tesla Coil",
            Self::Cryo => "Cryo Blaster",
            Self::PulseRifle => "Pulse Rifle",
            Self::Nova => "Nova Burst",
            Self::Vortex => "Vortex Launcher",
            Self::WaveCannon => "Wave Cannon",
            Self::Helix => "Helix Driver",
            Self::Quantum => "Quantum Disruptor",
            Self::Ricochet => "Ricochet Launcher",
            Self::ClusterBomb => "Cluster Bomb",
            Self::Mine => "Mine Layer",
            Self::Nanite => "Nanite Swarm",
        }
    }
}

/// Damage element. Non-physical elements add bonus damage on hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Element {
    Physical,
    Fire,
    Ice,
    Electric,
    Plasma,
    Quantum,
    Nanite,
    Explosive,
}

impl Element {
    /// Fraction of the leveled damage added as elemental damage.
    pub fn bonus_fraction(self) -> f32 {
        match self {
            Element::Physical => 0.0,
            Element::Fire => 0.2,
            Element::Ice => 0.15,
            Element::Electric => 0.2,
            Element::Plasma => 0.3,
            Element::Quantum => 0.25,
            Element::Nanite => 0.1,
            Element::Explosive => 0.2,
        }
    }
}

/// How the fire control maps to shots. Mutually exclusive per weapon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FireDiscipline {
    /// One shot per press.
    Instant,
    /// Fires every eligible frame while held.
    FullAuto,
    /// A press fires `shots` shots spaced `interval` seconds apart.
    Burst { shots: u8, interval: f32 },
    /// Hold to charge for up to `charge_time`; release fires.
    /// Releases below `min_ratio` cancel at no cost.
    Charge { charge_time: f32, min_ratio: f32 },
}

/// Spatial/temporal arrangement of the projectiles produced by one fire event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FiringPattern {
    Single,
    /// Even angular spread across `arc` radians.
    Spread { count: u8, arc: f32 },
    /// One lane per shot; spacing in time comes from the burst discipline.
    Burst,
    /// Full 360° ring.
    Ring { count: u8 },
    /// Angle grows by `step` per projectile, each launched `delay` later.
    Spiral { count: u8, step: f32, delay: f32 },
    /// Angular offset follows `amplitude * sin(i * frequency)`.
    Wave {
        count: u8,
        amplitude: f32,
        frequency: f32,
        delay: f32,
    },
    /// Two interleaved counter-rotating strands tilted `tilt` off the aim axis.
    Helix {
        per_strand: u8,
        twist: f32,
        tilt: f32,
        delay: f32,
    },
    /// Projectiles filling a cone of `half_angle` radians.
    Cone { count: u8, half_angle: f32 },
}

impl FiringPattern {
    /// Number of projectiles one fire event produces.
    pub fn projectile_count(&self) -> usize {
        match *self {
            FiringPattern::Single | FiringPattern::Burst => 1,
            FiringPattern::Spread { count, .. }
            | FiringPattern::Ring { count }
            | FiringPattern::Spiral { count, .. }
            | FiringPattern::Wave { count, .. }
            | FiringPattern::Cone { count, .. } => count as usize,
            FiringPattern::Helix { per_strand, .. } => per_strand as usize * 2,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FiringPattern::Single => "single",
            FiringPattern::Spread { .. } => "spread",
            FiringPattern::Burst => "burst",
            FiringPattern::Ring { .. } => "ring",
            FiringPattern::Spiral { .. } => "spiral",
            FiringPattern::Wave { .. } => "wave",
            FiringPattern::Helix { .. } => "helix",
            FiringPattern::Cone { .. } => "cone",
        }
    }
}

/// Projectile movement and collision model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MovementKind {
    /// Velocity integration.
    Linear,
    /// Velocity direction eases toward the target at `turn_rate` per second.
    Homing { turn_rate: f32 },
    /// Instantaneous segment; hits are point-to-segment tests.
    Beam,
    /// Radius grows as remaining lifespan shrinks.
    AreaExpanding { growth: f32 },
    /// Several candidate positions; any one of them can connect.
    MultiState,
}

/// Secondary bursts spawned radially around a cluster weapon's detonation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClusterSpec {
    pub count: u8,
    /// Distance of each child burst from the detonation point.
    pub spread: f32,
    /// Child burst damage as a fraction of the parent splash damage.
    pub damage_factor: f32,
    /// Child burst radius as a fraction of the parent splash radius.
    pub radius_factor: f32,
}

/// Status effect a weapon may inflict on hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OnHitStatus {
    pub kind: StatusEffectKind,
    /// Probability per hit (0.0–1.0).
    pub chance: f32,
    /// Strength the applied instance starts with.
    pub strength: f32,
}

/// Immutable stat block for one weapon kind.
#[derive(Debug, Clone, PartialEq)]
pub struct WeaponDefinition {
    pub kind: WeaponKind,
    pub name: &'static str,
    pub damage: f32,
    /// Shots per second. Always > 0.
    pub fire_rate: f32,
    pub range: f32,
    /// Units per second, or [`INSTANT_SPEED`].
    pub projectile_speed: f32,
    pub energy_cost: f32,
    /// -1 means unlimited.
    pub ammo_capacity: i32,
    pub reload_time: f32,
    pub discipline: FireDiscipline,
    pub pattern: FiringPattern,
    /// 0.0–1.0; 1.0 is perfectly accurate.
    pub accuracy: f32,
    pub critical_chance: f32,
    pub critical_multiplier: f32,
    /// Uniform per-shot damage variance (0.05 = ±5%).
    pub damage_variance: f32,
    /// Damage factor for every projectile after the first in a multi-projectile event.
    pub secondary_damage_factor: f32,
    pub penetration: u8,
    pub ricochets: u8,
    pub splash_radius: f32,
    pub splash_damage: f32,
    pub element: Element,
    pub movement: MovementKind,
    /// Seconds until a delayed detonation.
    pub fuse: Option<f32>,
    pub cluster: Option<ClusterSpec>,
    pub on_hit: Option<OnHitStatus>,
}

impl WeaponDefinition {
    pub fn has_unlimited_ammo(&self) -> bool {
        self.ammo_capacity == UNLIMITED_AMMO
    }

    pub fn is_instant(&self) -> bool {
        !self.projectile_speed.is_finite()
    }

    /// Minimum seconds between fire events.
    pub fn shot_interval(&self) -> f32 {
        1.0 / self.fire_rate
    }

    /// How long a projectile lives: range ÷ speed, or a short constant for instant weapons.
    pub fn lifespan(&self) -> f32 {
        if self.is_instant() || self.projectile_speed <= 0.0 {
            crate::constants::projectile::INSTANT_LIFESPAN
        } else {
            self.range / self.projectile_speed
        }
    }

    /// Whether hits lose damage with distance from the muzzle.
    pub fn uses_distance_falloff(&self) -> bool {
        matches!(self.movement, MovementKind::AreaExpanding { .. })
            || matches!(self.pattern, FiringPattern::Cone { .. })
    }

    pub fn is_charge(&self) -> bool {
        matches!(self.discipline, FireDiscipline::Charge { .. })
    }
}

impl WeaponKind {
    /// Builtin stat block for this weapon.
    pub fn spec(&self) -> WeaponDefinition {
        let base = WeaponDefinition {
            kind: *self,
            name: self.name(),
            damage: 10.0,
            fire_rate: 1.0,
            range: 200.0,
            projectile_speed: 100.0,
            energy_cost: 5.0,
            ammo_capacity: UNLIMITED_AMMO,
            reload_time: 0.0,
            discipline: FireDiscipline::Instant,
            pattern: FiringPattern::Single,
            accuracy: 0.9,
            critical_chance: 0.05,
            critical_multiplier: 1.5,
            damage_variance: 0.0,
            secondary_damage_factor: 1.0,
            penetration: 0,
            ricochets: 0,
            splash_radius: 0.0,
            splash_damage: 0.0,
            element: Element::Physical,
            movement: MovementKind::Linear,
            fuse: None,
            cluster: None,
            on_hit: None,
        };

        match self {
            Self::Standard => WeaponDefinition {
                damage: 25.0,
                fire_rate: 3.0,
                range: 300.0,
                projectile_speed: 120.0,
                energy_cost: 5.0,
                discipline: FireDiscipline::FullAuto,
                accuracy: 0.95,
                critical_chance: 0.0,
                damage_variance: 0.05,
                ..base
            },
            Self::Laser => WeaponDefinition {
                damage: 8.0,
                fire_rate: 12.0,
                range: 200.0,
                projectile_speed: INSTANT_SPEED,
                energy_cost: 2.0,
                discipline: FireDiscipline::FullAuto,
                accuracy: 1.0,
                critical_chance: 0.1,
                movement: MovementKind::Beam,
                ..base
            },
            Self::Plasma => WeaponDefinition {
                damage: 40.0,
                fire_rate: 1.5,
                range: 250.0,
                projectile_speed: 80.0,
                energy_cost: 15.0,
                ammo_capacity: 20,
                reload_time: 2.0,
                discipline: FireDiscipline::Charge {
                    charge_time: 1.2,
                    min_ratio: 0.25,
                },
                critical_chance: 0.1,
                critical_multiplier: 2.0,
                splash_radius: 6.0,
                splash_damage: 15.0,
                element: Element::Plasma,
                on_hit: Some(OnHitStatus {
                    kind: StatusEffectKind::Melting,
                    chance: 0.4,
                    strength: 1.0,
                }),
                ..base
            },
            Self::Missile => WeaponDefinition {
                damage: 60.0,
                fire_rate: 1.0,
                range: 400.0,
                projectile_speed: 60.0,
                energy_cost: 10.0,
                ammo_capacity: 8,
                reload_time: 2.5,
                accuracy: 0.85,
                critical_multiplier: 2.0,
                splash_radius: 8.0,
                splash_damage: 25.0,
                element: Element::Explosive,
                movement: MovementKind::Homing { turn_rate: 3.0 },
                ..base
            },
            Self::Railgun => WeaponDefinition {
                damage: 120.0,
                fire_rate: 0.5,
                range: 600.0,
                projectile_speed: INSTANT_SPEED,
                energy_cost: 30.0,
                ammo_capacity: 5,
                reload_time: 3.0,
                discipline: FireDiscipline::Charge {
                    charge_time: 2.0,
                    min_ratio: 0.5,
                },
                accuracy: 1.0,
                critical_chance: 0.2,
                critical_multiplier: 2.0,
                penetration: 3,
                movement: MovementKind::Beam,
                ..base
            },
            Self::Scatter => WeaponDefinition {
                damage: 12.0,
                fire_rate: 1.2,
                range: 80.0,
                projectile_speed: 100.0,
                energy_cost: 8.0,
                ammo_capacity: 6,
                reload_time: 1.8,
                pattern: FiringPattern::Spread { count: 7, arc: 0.6 },
                accuracy: 0.8,
                secondary_damage_factor: 0.9,
                ..base
            },
            Self::Flamethrower => WeaponDefinition {
                damage: 6.0,
                fire_rate: 15.0,
                range: 40.0,
                projectile_speed: 30.0,
                energy_cost: 1.5,
                ammo_capacity: 100,
                reload_time: 2.0,
                discipline: FireDiscipline::FullAuto,
                pattern: FiringPattern::Cone {
                    count: 3,
                    half_angle: 0.25,
                },
                accuracy: 0.7,
                critical_chance: 0.0,
                secondary_damage_factor: 0.8,
                element: Element::Fire,
                movement: MovementKind::AreaExpanding { growth: 3.0 },
                on_hit: Some(OnHitStatus {
                    kind: StatusEffectKind::Burning,
                    chance: 0.35,
                    strength: 1.0,
                }),
                ..base
            },
            Self::Tesla => WeaponDefinition {
                damage: 18.0,
                fire_rate: 4.0,
                range: 120.0,
                projectile_speed: INSTANT_SPEED,
                energy_cost: 6.0,
                discipline: FireDiscipline::FullAuto,
                accuracy: 1.0,
                element: Element::Electric,
                movement: MovementKind::Beam,
                on_hit: Some(OnHitStatus {
                    kind: StatusEffectKind::Electrified,
                    chance: 0.5,
                    strength: 1.0,
                }),
                ..base
            },
            Self::Cryo => WeaponDefinition {
                damage: 15.0,
                fire_rate: 5.0,
                range: 180.0,
                projectile_speed: 90.0,
                energy_cost: 4.0,
                ammo_capacity: 40,
                reload_time: 1.5,
                discipline: FireDiscipline::FullAuto,
                element: Element::Ice,
                on_hit: Some(OnHitStatus {
                    kind: StatusEffectKind::Frozen,
                    chance: 0.3,
                    strength: 1.0,
                }),
                ..base
            },
            Self::PulseRifle => WeaponDefinition {
                damage: 20.0,
                fire_rate: 2.0,
                range: 250.0,
                projectile_speed: 150.0,
                energy_cost: 4.0,
                ammo_capacity: 30,
                reload_time: 1.5,
                discipline: FireDiscipline::Burst {
                    shots: 3,
                    interval: 0.08,
                },
                pattern: FiringPattern::Burst,
                accuracy: 0.92,
                ..base
            },
            Self::Nova => WeaponDefinition {
                damage: 15.0,
                fire_rate: 0.8,
                range: 100.0,
                projectile_speed: 70.0,
                energy_cost: 20.0,
                pattern: FiringPattern::Ring { count: 12 },
                accuracy: 1.0,
                secondary_damage_factor: 0.85,
                ..base
            },
            Self::Vortex => WeaponDefinition {
                damage: 10.0,
                fire_rate: 1.0,
                range: 150.0,
                projectile_speed: 60.0,
                energy_cost: 12.0,
                pattern: FiringPattern::Spiral {
                    count: 16,
                    step: 0.4,
                    delay: 0.03,
                },
                accuracy: 1.0,
                secondary_damage_factor: 0.9,
                ..base
            },
            Self::WaveCannon => WeaponDefinition {
                damage: 14.0,
                fire_rate: 1.5,
                range: 200.0,
                projectile_speed: 90.0,
                energy_cost: 10.0,
                ammo_capacity: 24,
                reload_time: 2.0,
                pattern: FiringPattern::Wave {
                    count: 9,
                    amplitude: 0.5,
                    frequency: 0.7,
                    delay: 0.02,
                },
                secondary_damage_factor: 0.9,
                ..base
            },
            Self::Helix => WeaponDefinition {
                damage: 11.0,
                fire_rate: 1.2,
                range: 220.0,
                projectile_speed: 100.0,
                energy_cost: 12.0,
                pattern: FiringPattern::Helix {
                    per_strand: 6,
                    twist: 0.6,
                    tilt: 0.12,
                    delay: 0.04,
                },
                secondary_damage_factor: 0.9,
                element: Element::Plasma,
                ..base
            },
            Self::Quantum => WeaponDefinition {
                damage: 35.0,
                fire_rate: 1.5,
                range: 300.0,
                projectile_speed: 90.0,
                energy_cost: 14.0,
                critical_chance: 0.15,
                element: Element::Quantum,
                movement: MovementKind::MultiState,
                on_hit: Some(OnHitStatus {
                    kind: StatusEffectKind::QuantumEntangled,
                    chance: 0.25,
                    strength: 1.0,
                }),
                ..base
            },
            Self::Ricochet => WeaponDefinition {
                damage: 22.0,
                fire_rate: 2.5,
                range: 350.0,
                projectile_speed: 110.0,
                energy_cost: 5.0,
                ammo_capacity: 40,
                reload_time: 1.5,
                discipline: FireDiscipline::FullAuto,
                ricochets: 3,
                ..base
            },
            Self::ClusterBomb => WeaponDefinition {
                damage: 45.0,
                fire_rate: 0.6,
                range: 250.0,
                projectile_speed: 50.0,
                energy_cost: 18.0,
                ammo_capacity: 6,
                reload_time: 3.0,
                splash_radius: 6.0,
                splash_damage: 20.0,
                element: Element::Explosive,
                cluster: Some(ClusterSpec {
                    count: 6,
                    spread: 5.0,
                    damage_factor: 0.4,
                    radius_factor: 0.5,
                }),
                ..base
            },
            Self::Mine => WeaponDefinition {
                damage: 30.0,
                fire_rate: 1.0,
                range: 100.0,
                projectile_speed: 25.0,
                energy_cost: 8.0,
                ammo_capacity: 10,
                reload_time: 2.0,
                splash_radius: 10.0,
                splash_damage: 40.0,
                element: Element::Explosive,
                fuse: Some(1.5),
                ..base
            },
            Self::Nanite => WeaponDefinition {
                damage: 8.0,
                fire_rate: 6.0,
                range: 200.0,
                projectile_speed: 70.0,
                energy_cost: 3.0,
                discipline: FireDiscipline::FullAuto,
                element: Element::Nanite,
                movement: MovementKind::Homing { turn_rate: 5.0 },
                on_hit: Some(OnHitStatus {
                    kind: StatusEffectKind::NaniteSwarm,
                    chance: 0.6,
                    strength: 1.0,
                }),
                ..base
            },
        }
    }
}

/// Partial override of a builtin weapon's stats, loaded from configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponOverride {
    pub kind: Option<WeaponKind>,
    pub damage: Option<f32>,
    pub fire_rate: Option<f32>,
    pub range: Option<f32>,
    pub projectile_speed: Option<f32>,
    pub energy_cost: Option<f32>,
    pub ammo_capacity: Option<i32>,
    pub reload_time: Option<f32>,
    pub accuracy: Option<f32>,
    pub critical_chance: Option<f32>,
    pub critical_multiplier: Option<f32>,
    pub splash_radius: Option<f32>,
    pub splash_damage: Option<f32>,
}

impl WeaponOverride {
    /// Copy every set field onto `def`.
    pub fn apply(&self, def: &mut WeaponDefinition) {
        if let Some(v) = self.damage {
            def.damage = v;
        }
        if let Some(v) = self.fire_rate {
            def.fire_rate = v;
        }
        if let Some(v) = self.range {
            def.range = v;
        }
        if let Some(v) = self.projectile_speed {
            def.projectile_speed = v;
        }
        if let Some(v) = self.energy_cost {
            def.energy_cost = v;
        }
        if let Some(v) = self.ammo_capacity {
            def.ammo_capacity = v;
        }
        if let Some(v) = self.reload_time {
            def.reload_time = v;
        }
        if let Some(v) = self.accuracy {
            def.accuracy = v;
        }
        if let Some(v) = self.critical_chance {
            def.critical_chance = v;
        }
        if let Some(v) = self.critical_multiplier {
            def.critical_multiplier = v;
        }
        if let Some(v) = self.splash_radius {
            def.splash_radius = v;
        }
        if let Some(v) = self.splash_damage {
            def.splash_damage = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_in_index_order() {
        for (i, kind) in WeaponKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
            assert_eq!(kind.spec().kind, *kind);
        }
    }

    #[test]
    fn test_standard_matches_reference_stats() {
        let s = WeaponKind::Standard.spec();
        assert_eq!(s.damage, 25.0);
        assert_eq!(s.fire_rate, 3.0);
        assert!(s.has_unlimited_ammo());
        assert!(s.damage_variance <= 0.05);
    }

    #[test]
    fn test_lifespan_kinetic_vs_instant() {
        let std = WeaponKind::Standard.spec();
        assert!((std.lifespan() - 300.0 / 120.0).abs() < 1e-5);
        let laser = WeaponKind::Laser.spec();
        assert!(laser.is_instant());
        assert_eq!(
            laser.lifespan(),
            crate::constants::projectile::INSTANT_LIFESPAN
        );
    }

    #[test]
    fn test_pattern_counts() {
        assert_eq!(WeaponKind::Scatter.spec().pattern.projectile_count(), 7);
        assert_eq!(WeaponKind::Nova.spec().pattern.projectile_count(), 12);
        assert_eq!(WeaponKind::Helix.spec().pattern.projectile_count(), 12);
        assert_eq!(WeaponKind::PulseRifle.spec().pattern.projectile_count(), 1);
    }

    #[test]
    fn test_falloff_weapons() {
        assert!(WeaponKind::Flamethrower.spec().uses_distance_falloff());
        assert!(!WeaponKind::Standard.spec().uses_distance_falloff());
    }

    #[test]
    fn test_override_applies_only_set_fields() {
        let mut def = WeaponKind::Standard.spec();
        let ov = WeaponOverride {
            kind: Some(WeaponKind::Standard),
            damage: Some(30.0),
            ..Default::default()
        };
        ov.apply(&mut def);
        assert_eq!(def.damage, 30.0);
        assert_eq!(def.fire_rate, 3.0);
    }
}
