//! Combat configuration - seeds, energy pool, tuning tables and overrides.
//!
//! Everything here is plain serde data with defaults, so a partial JSON file
//! only needs the fields it changes. [`CombatConfig::validate`] runs before
//! an engine is built; invalid values are configuration-time errors, never
//! per-frame ones.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use voidfire_logic::balance::{BalanceTuning, DifficultyTier};
use voidfire_logic::catalog::{CatalogError, StatusCatalog, SynergyCatalog, WeaponCatalog};
use voidfire_logic::constants::{projectile, synergy, weapon};
use voidfire_logic::status::StatusTuning;
use voidfire_logic::weapons::WeaponOverride;

/// Per-subsystem random stream selectors, mixed into the base seed.
pub mod streams {
    pub const WEAPONS: u64 = 0x5745_4150_4f4e_5331;
    pub const STATUS: u64 = 0x5354_4154_5553_3031;
    pub const ENGINE: u64 = 0x454e_4749_4e45_3031;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error(transparent)]
    Catalog(#[from] CatalogError),
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

/// Shared energy pool.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    pub max: f32,
    pub regen_per_second: f32,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max: weapon::ENERGY_POOL,
            regen_per_second: weapon::ENERGY_REGEN,
        }
    }
}

/// Chain-reaction amplification.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynergyConfig {
    /// Strength multiplier applied to every participant.
    pub chain_strength_bonus: f32,
    /// Seconds added to every participant.
    pub chain_duration_bonus: f32,
    /// Strength never exceeds this.
    pub max_strength: f32,
}

impl Default for SynergyConfig {
    fn default() -> Self {
        Self {
            chain_strength_bonus: synergy::CHAIN_STRENGTH_BONUS,
            chain_duration_bonus: synergy::CHAIN_DURATION_BONUS,
            max_strength: synergy::MAX_STRENGTH,
        }
    }
}

/// Balancing tuning plus the starting difficulty tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceConfig {
    pub difficulty: DifficultyTier,
    pub tuning: BalanceTuning,
}

pub type StatusConfig = StatusTuning;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Base seed; each subsystem derives its own stream.
    pub seed: u64,
    /// Projectiles farther than this from the origin are culled.
    pub world_bounds: f32,
    pub energy: EnergyConfig,
    /// Aim jitter bound at accuracy 0.
    pub max_deviation: f32,
    pub balance: BalanceConfig,
    pub status: StatusConfig,
    pub synergy: SynergyConfig,
    pub weapon_overrides: Vec<WeaponOverride>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            seed: 0x5EED,
            world_bounds: projectile::WORLD_BOUNDS,
            energy: EnergyConfig::default(),
            max_deviation: weapon::MAX_DEVIATION,
            balance: BalanceConfig::default(),
            status: StatusConfig::default(),
            synergy: SynergyConfig::default(),
            weapon_overrides: Vec::new(),
        }
    }
}

/// The three validated catalogs an engine runs on.
#[derive(Debug, Clone)]
pub struct Catalogs {
    pub weapons: WeaponCatalog,
    pub statuses: StatusCatalog,
    pub synergies: SynergyCatalog,
}

impl CombatConfig {
    /// Parse and validate.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: CombatConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Seed for one subsystem's random stream.
    pub fn stream_seed(&self, stream: u64) -> u64 {
        self.seed ^ stream
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.world_bounds > 0.0) {
            return Err(invalid("world_bounds", "must be > 0"));
        }
        if !(self.energy.max > 0.0) {
            return Err(invalid("energy.max", "must be > 0"));
        }
        if !(self.energy.regen_per_second >= 0.0) {
            return Err(invalid("energy.regen_per_second", "must be >= 0"));
        }
        if !(0.0..=1.0).contains(&self.max_deviation) {
            return Err(invalid("max_deviation", "must be within [0, 1]"));
        }

        let b = &self.balance.tuning;
        if !(b.sample_interval > 0.0) {
            return Err(invalid("balance.sample_interval", "must be > 0"));
        }
        if b.window_samples == 0 {
            return Err(invalid("balance.window_samples", "must be >= 1"));
        }
        if !(b.low_threshold < b.high_threshold) {
            return Err(invalid(
                "balance.low_threshold",
                format!(
                    "must be below high_threshold ({} >= {})",
                    b.low_threshold, b.high_threshold
                ),
            ));
        }
        if !(b.drift_rate >= 0.0) {
            return Err(invalid("balance.drift_rate", "must be >= 0"));
        }
        if !(b.damage_floor > 0.0 && b.damage_floor <= 1.0 && b.damage_ceiling >= 1.0) {
            return Err(invalid("balance.damage_floor", "need 0 < floor <= 1 <= ceiling"));
        }
        if !(b.energy_floor > 0.0 && b.energy_floor <= 1.0 && b.energy_ceiling >= 1.0) {
            return Err(invalid("balance.energy_floor", "need 0 < floor <= 1 <= ceiling"));
        }
        if !(b.weapon_scale_min > 0.0
            && b.weapon_scale_min <= 1.0
            && b.weapon_scale_max >= 1.0)
        {
            return Err(invalid("balance.weapon_scale_min", "need 0 < min <= 1 <= max"));
        }
        if !(b.weapon_low_success < b.weapon_high_success) {
            return Err(invalid(
                "balance.weapon_low_success",
                "must be below weapon_high_success",
            ));
        }

        let s = &self.status;
        for (field, chance) in [
            ("status.chain_chance", s.chain_chance),
            ("status.spread_chance", s.spread_chance),
            ("status.quantum_event_chance", s.quantum_event_chance),
        ] {
            if !(0.0..=1.0).contains(&chance) {
                return Err(invalid(field, "must be within [0, 1]"));
            }
        }
        if !(s.chain_radius >= 0.0 && s.spread_radius >= 0.0) {
            return Err(invalid("status.chain_radius", "radii must be >= 0"));
        }
        if !(s.chain_duration_factor > 0.0 && s.chain_duration_factor <= 1.0) {
            return Err(invalid("status.chain_duration_factor", "must be within (0, 1]"));
        }

        let y = &self.synergy;
        if !(y.chain_strength_bonus >= 1.0) {
            return Err(invalid("synergy.chain_strength_bonus", "must be >= 1"));
        }
        if !(y.chain_duration_bonus >= 0.0) {
            return Err(invalid("synergy.chain_duration_bonus", "must be >= 0"));
        }
        if !(y.max_strength > 0.0) {
            return Err(invalid("synergy.max_strength", "must be > 0"));
        }
        Ok(())
    }

    /// Build and validate the catalogs, applying weapon overrides first.
    pub fn build_catalogs(&self) -> Result<Catalogs, ConfigError> {
        let weapons = WeaponCatalog::with_overrides(&self.weapon_overrides)?;
        let statuses = StatusCatalog::builtin()?;
        let synergies = SynergyCatalog::builtin()?;
        log::info!(
            "catalogs validated: {} weapons, {} status effects, {} synergies, {} chain rules ({} overrides)",
            weapons.iter().count(),
            statuses.iter().count(),
            synergies.iter().count(),
            synergies.rules().len(),
            self.weapon_overrides.len()
        );
        Ok(Catalogs {
            weapons,
            statuses,
            synergies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidfire_logic::weapons::WeaponKind;

    #[test]
    fn test_default_is_valid() {
        CombatConfig::default().validate().unwrap();
        CombatConfig::default().build_catalogs().unwrap();
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = CombatConfig::from_json(r#"{ "seed": 7, "energy": { "max": 150.0 } }"#)
            .unwrap();
        assert_eq!(config.seed, 7);
        assert_eq!(config.energy.max, 150.0);
        assert_eq!(config.energy.regen_per_second, weapon::ENERGY_REGEN);
        assert_eq!(config.world_bounds, projectile::WORLD_BOUNDS);
    }

    #[test]
    fn test_bad_json_is_error() {
        assert!(matches!(
            CombatConfig::from_json("{ seed: "),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let mut config = CombatConfig::default();
        config.balance.tuning.low_threshold = 0.9;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "balance.low_threshold",
                ..
            }
        ));
    }

    #[test]
    fn test_override_flows_into_catalog() {
        let config = CombatConfig::from_json(
            r#"{ "weapon_overrides": [ { "kind": "Standard", "damage": 32.0 } ] }"#,
        )
        .unwrap();
        let catalogs = config.build_catalogs().unwrap();
        assert_eq!(catalogs.weapons.get(WeaponKind::Standard).damage, 32.0);
    }

    #[test]
    fn test_invalid_override_surfaces_catalog_error() {
        let config = CombatConfig::from_json(
            r#"{ "weapon_overrides": [ { "kind": "Laser", "accuracy": 1.5 } ] }"#,
        )
        .unwrap();
        assert!(matches!(
            config.build_catalogs(),
            Err(ConfigError::Catalog(_))
        ));
    }

    #[test]
    fn test_streams_differ() {
        let config = CombatConfig::default();
        assert_ne!(
            config.stream_seed(streams::WEAPONS),
            config.stream_seed(streams::STATUS)
        );
    }
}
