//! Combat tuning constants - projectile limits, damage floors, timings.
//!
//! Values that are tunable per session live in the engine configuration;
//! the ones here are fixed rules of the simulation.

pub mod projectile {
    /// Projectiles farther than this from the world origin are culled.
    pub const WORLD_BOUNDS: f32 = 2000.0;
    /// Lifespan for weapons whose projectile speed is effectively infinite.
    pub const INSTANT_LIFESPAN: f32 = 0.1;
    /// Collision radius of an ordinary kinetic projectile.
    pub const DEFAULT_RADIUS: f32 = 0.5;
    /// Extra half-width given to beam segments when testing hits.
    pub const BEAM_HALF_WIDTH: f32 = 0.3;
    /// Starting radius of an area-expanding projectile (flame puffs).
    pub const AREA_START_RADIUS: f32 = 0.5;
    /// Number of candidate positions carried by multi-state projectiles.
    pub const MULTI_STATE_CANDIDATES: usize = 3;
    /// How far each candidate may wander from the nominal position per second.
    pub const MULTI_STATE_JITTER: f32 = 4.0;
    /// Maximum distance a candidate may drift from the nominal position.
    pub const MULTI_STATE_MAX_OFFSET: f32 = 6.0;
    /// Damage kept per ricochet bounce.
    pub const RICOCHET_RETENTION: f32 = 0.8;
    /// Damage lost per target pierced.
    pub const PENETRATION_DAMAGE_LOSS: f32 = 0.25;
    /// Speed kept per target pierced.
    pub const PENETRATION_SPEED_RETENTION: f32 = 0.85;
    /// Hard cap on secondary bursts produced by one cluster detonation.
    pub const MAX_CLUSTER_CHILDREN: u8 = 12;
    /// Hard cap on ricochet charges.
    pub const MAX_RICOCHETS: u8 = 8;
    /// Hard cap on targets a projectile can pierce.
    pub const MAX_PENETRATION: u8 = 10;
}

pub mod damage {
    /// Damage never drops below this after balancing.
    pub const MIN_DAMAGE: f32 = 1.0;
    /// Distance falloff for area/cone weapons never drops below this fraction.
    pub const FALLOFF_FLOOR: f32 = 0.3;
    /// Fire rate never drops below this after balancing.
    pub const MIN_FIRE_RATE: f32 = 0.05;
    /// Energy cost multiplier floor so efficiency can never make shots free.
    pub const MIN_ENERGY_COST_FACTOR: f32 = 0.1;
}

pub mod weapon {
    /// Sentinel ammo capacity meaning "never runs dry".
    pub const UNLIMITED_AMMO: i32 = -1;
    /// Default aim jitter factor (scaled by `1 - accuracy`).
    pub const MAX_DEVIATION: f32 = 0.15;
    /// Highest upgrade level a weapon can reach.
    pub const MAX_UPGRADE_LEVEL: u8 = 5;
    /// Default shared energy pool.
    pub const ENERGY_POOL: f32 = 100.0;
    /// Default energy regeneration per second.
    pub const ENERGY_REGEN: f32 = 12.0;
    /// Maximum weapons that can be equipped at once.
    pub const MAX_EQUIPPED: usize = 6;
}

pub mod synergy {
    /// Strength multiplier applied by a chain reaction.
    pub const CHAIN_STRENGTH_BONUS: f32 = 1.25;
    /// Seconds added to each participant by a chain reaction.
    pub const CHAIN_DURATION_BONUS: f32 = 5.0;
    /// Synergy strength never grows beyond this.
    pub const MAX_STRENGTH: f32 = 5.0;
}

pub mod status {
    /// Radius within which a chain-capable effect can jump.
    pub const CHAIN_RADIUS: f32 = 8.0;
    /// Per-tick probability of a chain jump.
    pub const CHAIN_CHANCE: f32 = 0.1;
    /// Duration fraction a chained copy receives.
    pub const CHAIN_DURATION_FACTOR: f32 = 0.5;
    /// Chained copies stop jumping after this many generations.
    pub const MAX_CHAIN_GENERATIONS: u8 = 3;
    /// Radius within which a spreading effect can ignite neighbours.
    pub const SPREAD_RADIUS: f32 = 5.0;
    /// Per-tick probability of a spread attempt.
    pub const SPREAD_CHANCE: f32 = 0.02;
    /// Per-tick probability of a quantum special event.
    pub const QUANTUM_EVENT_CHANCE: f32 = 0.01;
    /// Upper bound on independent instances of one kind on one target.
    pub const MAX_INDEPENDENT_INSTANCES: u8 = 4;
}
