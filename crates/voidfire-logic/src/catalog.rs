//! Validated lookup tables built once at startup.
//!
//! Catalogs are indexed by enum discriminant, so once construction succeeds
//! every lookup is infallible. All configuration mistakes (missing kinds,
//! duplicates, impossible stats) surface here as a [`CatalogError`] instead
//! of as a per-frame failure.

use std::collections::HashMap;

use thiserror::Error;

use crate::status::{StackingRule, StatusEffectDefinition, StatusEffectKind};
use crate::synergy::{
    ChainReactionKind, ChainReactionRule, SynergyDefinition, SynergyKey, SynergyKind,
};
use crate::weapons::{
    FireDiscipline, FiringPattern, WeaponDefinition, WeaponKind, WeaponOverride,
};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("no definition for {0}")]
    Missing(String),
    #[error("duplicate definition for {0}")]
    Duplicate(String),
    #[error("{kind}: invalid {field}: {reason}")]
    InvalidStat {
        kind: String,
        field: &'static str,
        reason: String,
    },
    #[error("synergy {kind} has {count} distinct ingredients (expected 2 or 3)")]
    IngredientCount { kind: String, count: usize },
    #[error("synergies {first} and {second} share the same ingredient set")]
    DuplicateKey { first: String, second: String },
    #[error("chain reaction {0} needs at least two participants")]
    ChainParticipants(String),
    #[error("weapon override is missing its kind")]
    OverrideWithoutKind,
}

fn invalid(kind: impl std::fmt::Debug, field: &'static str, reason: impl Into<String>) -> CatalogError {
    CatalogError::InvalidStat {
        kind: format!("{:?}", kind),
        field,
        reason: reason.into(),
    }
}

// ============================================================================
// WEAPONS
// ============================================================================

/// Weapon kind → definition.
#[derive(Debug, Clone)]
pub struct WeaponCatalog {
    defs: Vec<WeaponDefinition>,
}

impl WeaponCatalog {
    /// Builtin definitions, validated.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_definitions(WeaponKind::ALL.iter().map(|k| k.spec()).collect())
    }

    /// Builtin definitions with overrides applied, then validated.
    pub fn with_overrides(overrides: &[WeaponOverride]) -> Result<Self, CatalogError> {
        let mut defs: Vec<WeaponDefinition> = WeaponKind::ALL.iter().map(|k| k.spec()).collect();
        for ov in overrides {
            let kind = ov.kind.ok_or(CatalogError::OverrideWithoutKind)?;
            ov.apply(&mut defs[kind.index()]);
        }
        Self::from_definitions(defs)
    }

    /// Build from an arbitrary list; every kind must appear exactly once.
    pub fn from_definitions(defs: Vec<WeaponDefinition>) -> Result<Self, CatalogError> {
        let mut slots: Vec<Option<WeaponDefinition>> = vec![None; WeaponKind::COUNT];
        for def in defs {
            validate_weapon(&def)?;
            let slot = &mut slots[def.kind.index()];
            if slot.is_some() {
                return Err(CatalogError::Duplicate(format!("{:?}", def.kind)));
            }
            *slot = Some(def);
        }

        let mut out = Vec::with_capacity(WeaponKind::COUNT);
        for (kind, slot) in WeaponKind::ALL.iter().zip(slots) {
            match slot {
                Some(def) => out.push(def),
                None => return Err(CatalogError::Missing(format!("{:?}", kind))),
            }
        }
        Ok(Self { defs: out })
    }

    pub fn get(&self, kind: WeaponKind) -> &WeaponDefinition {
        &self.defs[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeaponDefinition> {
        self.defs.iter()
    }
}

fn validate_weapon(def: &WeaponDefinition) -> Result<(), CatalogError> {
    let k = def.kind;
    if !(def.fire_rate > 0.0) || !def.fire_rate.is_finite() {
        return Err(invalid(k, "fire_rate", format!("must be > 0, got {}", def.fire_rate)));
    }
    if !(def.damage >= 0.0) {
        return Err(invalid(k, "damage", "must be >= 0"));
    }
    if !(def.range > 0.0) {
        return Err(invalid(k, "range", "must be > 0"));
    }
    if !(def.projectile_speed > 0.0) {
        return Err(invalid(k, "projectile_speed", "must be > 0 (or infinite)"));
    }
    if !(0.0..=1.0).contains(&def.accuracy) {
        return Err(invalid(k, "accuracy", format!("{} outside [0, 1]", def.accuracy)));
    }
    if !(0.0..=1.0).contains(&def.critical_chance) {
        return Err(invalid(k, "critical_chance", "outside [0, 1]"));
    }
    if !(def.critical_multiplier >= 1.0) {
        return Err(invalid(k, "critical_multiplier", "must be >= 1"));
    }
    if !(0.0..1.0).contains(&def.damage_variance) {
        return Err(invalid(k, "damage_variance", "outside [0, 1)"));
    }
    if def.ammo_capacity == 0 || def.ammo_capacity < -1 {
        return Err(invalid(k, "ammo_capacity", "must be positive or -1"));
    }
    if !(def.energy_cost >= 0.0) || !(def.reload_time >= 0.0) {
        return Err(invalid(k, "energy_cost/reload_time", "must be >= 0"));
    }
    if !(def.splash_radius >= 0.0) || !(def.splash_damage >= 0.0) {
        return Err(invalid(k, "splash", "must be >= 0"));
    }
    if let Some(fuse) = def.fuse {
        if !(fuse > 0.0) {
            return Err(invalid(k, "fuse", "must be > 0"));
        }
    }
    if let Some(status) = def.on_hit {
        if !(0.0..=1.0).contains(&status.chance) {
            return Err(invalid(k, "on_hit.chance", "outside [0, 1]"));
        }
    }

    match def.discipline {
        FireDiscipline::Burst { shots, interval } => {
            if shots < 2 || !(interval > 0.0) {
                return Err(invalid(k, "discipline", "burst needs >= 2 shots and interval > 0"));
            }
        }
        FireDiscipline::Charge {
            charge_time,
            min_ratio,
        } => {
            if !(charge_time > 0.0) {
                return Err(invalid(k, "discipline", "charge_time must be > 0"));
            }
            if !(min_ratio > 0.0 && min_ratio <= 1.0) {
                return Err(invalid(k, "discipline", "min_ratio must be in (0, 1]"));
            }
        }
        FireDiscipline::Instant | FireDiscipline::FullAuto => {}
    }

    let burst_discipline = matches!(def.discipline, FireDiscipline::Burst { .. });
    let burst_pattern = matches!(def.pattern, FiringPattern::Burst);
    if burst_discipline != burst_pattern {
        return Err(invalid(k, "pattern", "burst pattern and burst discipline must be paired"));
    }

    let multi = !matches!(def.pattern, FiringPattern::Single | FiringPattern::Burst);
    if multi && def.pattern.projectile_count() < 2 {
        return Err(invalid(k, "pattern", "multi-projectile pattern needs at least 2 projectiles"));
    }
    Ok(())
}

// ============================================================================
// STATUS EFFECTS
// ============================================================================

/// Status effect kind → definition.
#[derive(Debug, Clone)]
pub struct StatusCatalog {
    defs: Vec<StatusEffectDefinition>,
}

impl StatusCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_definitions(StatusEffectKind::ALL.iter().map(|k| k.spec()).collect())
    }

    pub fn from_definitions(defs: Vec<StatusEffectDefinition>) -> Result<Self, CatalogError> {
        let mut slots: Vec<Option<StatusEffectDefinition>> = vec![None; StatusEffectKind::COUNT];
        for def in defs {
            validate_status(&def)?;
            let slot = &mut slots[def.kind.index()];
            if slot.is_some() {
                return Err(CatalogError::Duplicate(format!("{:?}", def.kind)));
            }
            *slot = Some(def);
        }

        let mut out = Vec::with_capacity(StatusEffectKind::COUNT);
        for (kind, slot) in StatusEffectKind::ALL.iter().zip(slots) {
            match slot {
                Some(def) => out.push(def),
                None => return Err(CatalogError::Missing(format!("{:?}", kind))),
            }
        }
        Ok(Self { defs: out })
    }

    pub fn get(&self, kind: StatusEffectKind) -> &StatusEffectDefinition {
        &self.defs[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusEffectDefinition> {
        self.defs.iter()
    }
}

fn validate_status(def: &StatusEffectDefinition) -> Result<(), CatalogError> {
    let k = def.kind;
    if def.max_stacks == 0 {
        return Err(invalid(k, "max_stacks", "must be >= 1"));
    }
    if !(def.base_duration > 0.0) {
        return Err(invalid(k, "base_duration", "must be > 0"));
    }
    if def.damage_per_second < 0.0 || def.heal_per_second < 0.0 {
        return Err(invalid(k, "per_second", "must be >= 0"));
    }
    let m = &def.modifiers;
    for (field, v) in [
        ("modifiers.damage", m.damage),
        ("modifiers.movement_speed", m.movement_speed),
        ("modifiers.attack_speed", m.attack_speed),
        ("modifiers.damage_taken", m.damage_taken),
    ] {
        if !(v >= 0.0) || !v.is_finite() {
            return Err(invalid(k, field, "must be finite and >= 0"));
        }
    }
    if def.max_stacks > 1
        && !matches!(
            def.stacking,
            StackingRule::IncreaseIntensity | StackingRule::Independent
        )
    {
        return Err(invalid(
            k,
            "max_stacks",
            "only increase-intensity and independent kinds can exceed one stack",
        ));
    }
    Ok(())
}

// ============================================================================
// SYNERGIES
// ============================================================================

/// Synergy definitions plus the unordered-key lookup and chain-reaction rules.
#[derive(Debug, Clone)]
pub struct SynergyCatalog {
    defs: Vec<SynergyDefinition>,
    by_key: HashMap<SynergyKey, SynergyKind>,
    rules: Vec<ChainReactionRule>,
}

impl SynergyCatalog {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_parts(
            SynergyKind::ALL.iter().map(|k| k.spec()).collect(),
            ChainReactionKind::ALL.iter().map(|k| k.rule()).collect(),
        )
    }

    pub fn from_parts(
        defs: Vec<SynergyDefinition>,
        rules: Vec<ChainReactionRule>,
    ) -> Result<Self, CatalogError> {
        let mut slots: Vec<Option<SynergyDefinition>> = vec![None; SynergyKind::COUNT];
        let mut by_key: HashMap<SynergyKey, SynergyKind> = HashMap::new();

        for def in defs {
            let count = def.key.len();
            if !(2..=3).contains(&count) {
                return Err(CatalogError::IngredientCount {
                    kind: format!("{:?}", def.kind),
                    count,
                });
            }
            if !(def.strength > 0.0) {
                return Err(invalid(def.kind, "strength", "must be > 0"));
            }
            if let Some(existing) = by_key.get(&def.key) {
                return Err(CatalogError::DuplicateKey {
                    first: format!("{:?}", existing),
                    second: format!("{:?}", def.kind),
                });
            }
            let slot = &mut slots[def.kind.index()];
            if slot.is_some() {
                return Err(CatalogError::Duplicate(format!("{:?}", def.kind)));
            }
            by_key.insert(def.key.clone(), def.kind);
            *slot = Some(def);
        }

        let mut out = Vec::with_capacity(SynergyKind::COUNT);
        for (kind, slot) in SynergyKind::ALL.iter().zip(slots) {
            match slot {
                Some(def) => out.push(def),
                None => return Err(CatalogError::Missing(format!("{:?}", kind))),
            }
        }

        for rule in &rules {
            let mut distinct = rule.participants.to_vec();
            distinct.sort();
            distinct.dedup();
            if distinct.len() < 2 {
                return Err(CatalogError::ChainParticipants(rule.name.to_string()));
            }
        }

        Ok(Self {
            defs: out,
            by_key,
            rules,
        })
    }

    pub fn get(&self, kind: SynergyKind) -> &SynergyDefinition {
        &self.defs[kind.index()]
    }

    /// Order-independent lookup.
    pub fn lookup(&self, key: &SynergyKey) -> Option<SynergyKind> {
        self.by_key.get(key).copied()
    }

    pub fn rules(&self) -> &[ChainReactionRule] {
        &self.rules
    }

    pub fn iter(&self) -> impl Iterator<Item = &SynergyDefinition> {
        self.defs.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synergy::Ingredient;

    #[test]
    fn test_builtin_catalogs_validate() {
        assert!(WeaponCatalog::builtin().is_ok());
        assert!(StatusCatalog::builtin().is_ok());
        assert!(SynergyCatalog::builtin().is_ok());
    }

    #[test]
    fn test_missing_weapon_fails_fast() {
        let defs: Vec<_> = WeaponKind::ALL
            .iter()
            .filter(|k| **k != WeaponKind::Mine)
            .map(|k| k.spec())
            .collect();
        let err = WeaponCatalog::from_definitions(defs).unwrap_err();
        assert_eq!(err, CatalogError::Missing("Mine".into()));
    }

    #[test]
    fn test_duplicate_weapon_rejected() {
        let mut defs: Vec<_> = WeaponKind::ALL.iter().map(|k| k.spec()).collect();
        defs.push(WeaponKind::Laser.spec());
        assert!(matches!(
            WeaponCatalog::from_definitions(defs),
            Err(CatalogError::Duplicate(_))
        ));
    }

    #[test]
    fn test_zero_fire_rate_rejected() {
        let ov = WeaponOverride {
            kind: Some(WeaponKind::Laser),
            fire_rate: Some(0.0),
            ..Default::default()
        };
        let err = WeaponCatalog::with_overrides(&[ov]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidStat { field: "fire_rate", .. }));
    }

    #[test]
    fn test_nan_overrides_rejected() {
        let energy = WeaponOverride {
            kind: Some(WeaponKind::Standard),
            energy_cost: Some(f32::NAN),
            ..Default::default()
        };
        let err = WeaponCatalog::with_overrides(&[energy]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidStat { field: "energy_cost/reload_time", .. }));

        let crit = WeaponOverride {
            kind: Some(WeaponKind::Railgun),
            critical_multiplier: Some(f32::NAN),
            ..Default::default()
        };
        let err = WeaponCatalog::with_overrides(&[crit]).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidStat { field: "critical_multiplier", .. }));
    }

    #[test]
    fn test_override_without_kind_rejected() {
        let ov = WeaponOverride {
            damage: Some(3.0),
            ..Default::default()
        };
        assert_eq!(
            WeaponCatalog::with_overrides(&[ov]).unwrap_err(),
            CatalogError::OverrideWithoutKind
        );
    }

    #[test]
    fn test_override_visible_through_catalog() {
        let ov = WeaponOverride {
            kind: Some(WeaponKind::Nova),
            damage: Some(99.0),
            ..Default::default()
        };
        let cat = WeaponCatalog::with_overrides(&[ov]).unwrap();
        assert_eq!(cat.get(WeaponKind::Nova).damage, 99.0);
    }

    #[test]
    fn test_status_missing_fails() {
        let defs: Vec<_> = StatusEffectKind::ALL[1..].iter().map(|k| k.spec()).collect();
        assert!(matches!(
            StatusCatalog::from_definitions(defs),
            Err(CatalogError::Missing(_))
        ));
    }

    #[test]
    fn test_status_refresh_with_many_stacks_rejected() {
        let mut defs: Vec<_> = StatusEffectKind::ALL.iter().map(|k| k.spec()).collect();
        defs[StatusEffectKind::Frozen.index()].max_stacks = 3;
        assert!(StatusCatalog::from_definitions(defs).is_err());
    }

    #[test]
    fn test_synergy_lookup_either_order() {
        let cat = SynergyCatalog::builtin().unwrap();
        let k1 = SynergyKey::new(&[
            Ingredient::Weapon(WeaponKind::Scatter),
            Ingredient::Weapon(WeaponKind::Standard),
        ]);
        let k2 = SynergyKey::new(&[
            Ingredient::Weapon(WeaponKind::Standard),
            Ingredient::Weapon(WeaponKind::Scatter),
        ]);
        assert_eq!(cat.lookup(&k1), Some(SynergyKind::Scattershot));
        assert_eq!(cat.lookup(&k2), Some(SynergyKind::Scattershot));
    }

    #[test]
    fn test_duplicate_synergy_key_rejected() {
        let mut defs: Vec<_> = SynergyKind::ALL.iter().map(|k| k.spec()).collect();
        defs[SynergyKind::Pinball.index()].key = defs[SynergyKind::Scattershot.index()].key.clone();
        let err = SynergyCatalog::from_parts(defs, Vec::new()).unwrap_err();
        assert!(matches!(err, CatalogError::DuplicateKey { .. }));
    }

    #[test]
    fn test_single_ingredient_synergy_rejected() {
        let mut defs: Vec<_> = SynergyKind::ALL.iter().map(|k| k.spec()).collect();
        defs[0].key = SynergyKey::new(&[Ingredient::Weapon(WeaponKind::Standard)]);
        assert!(matches!(
            SynergyCatalog::from_parts(defs, Vec::new()),
            Err(CatalogError::IngredientCount { count: 1, .. })
        ));
    }
}
