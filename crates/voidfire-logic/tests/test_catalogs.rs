//! Integration tests for catalog construction and the pure combat formulas.
//!
//! Exercises: builtin catalogs → overrides → pattern expansion → damage
//! pipeline → progression scaling → balance scoring.
//!
//! All tests are pure logic: no engine state, no randomness.

use voidfire_logic::balance::{
    composite_score, direction_for, drift_target, drift_toward, BalanceDirection, BalanceTuning,
    PerformanceSnapshot,
};
use voidfire_logic::catalog::{CatalogError, StatusCatalog, SynergyCatalog, WeaponCatalog};
use voidfire_logic::damage::{compute_hit_damage, HitInputs};
use voidfire_logic::patterns::expand_pattern;
use voidfire_logic::status::{StackingRule, StatusEffectKind};
use voidfire_logic::synergy::{Ingredient, PowerUpKind, SynergyKey, SynergyKind};
use voidfire_logic::upgrades::{apply_level, level_scaling, EvolutionStage};
use voidfire_logic::weapons::{FiringPattern, WeaponKind, WeaponOverride};

// ── Helpers ────────────────────────────────────────────────────────────

fn catalogs() -> (WeaponCatalog, StatusCatalog, SynergyCatalog) {
    (
        WeaponCatalog::builtin().expect("builtin weapons valid"),
        StatusCatalog::builtin().expect("builtin statuses valid"),
        SynergyCatalog::builtin().expect("builtin synergies valid"),
    )
}

// ── Catalog completeness ───────────────────────────────────────────────

#[test]
fn every_kind_has_an_entry() {
    let (weapons, statuses, synergies) = catalogs();
    for kind in WeaponKind::ALL {
        assert_eq!(weapons.get(kind).kind, kind);
    }
    for kind in StatusEffectKind::ALL {
        assert_eq!(statuses.get(kind).kind, kind);
    }
    for kind in SynergyKind::ALL {
        assert_eq!(synergies.get(kind).kind, kind);
    }
    assert_eq!(weapons.iter().count(), WeaponKind::COUNT);
}

#[test]
fn every_weapon_fire_rate_positive() {
    let (weapons, _, _) = catalogs();
    for def in weapons.iter() {
        assert!(def.fire_rate > 0.0, "{} has fire rate {}", def.name, def.fire_rate);
        assert!(def.ammo_capacity == -1 || def.ammo_capacity > 0);
    }
}

#[test]
fn stack_caps_respect_rules() {
    let (_, statuses, _) = catalogs();
    for def in statuses.iter() {
        match def.stacking {
            StackingRule::IncreaseIntensity | StackingRule::Independent => {
                assert!(def.max_stacks >= 1)
            }
            _ => assert_eq!(def.max_stacks, 1, "{} should not stack", def.name),
        }
    }
}

#[test]
fn missing_weapon_fails_fast() {
    let defs: Vec<_> = WeaponKind::ALL
        .iter()
        .filter(|k| **k != WeaponKind::Mine)
        .map(|k| k.spec())
        .collect();
    let err = WeaponCatalog::from_definitions(defs).unwrap_err();
    assert!(matches!(err, CatalogError::Missing(_)));
}

#[test]
fn override_with_zero_fire_rate_rejected() {
    let err = WeaponCatalog::with_overrides(&[WeaponOverride {
        kind: Some(WeaponKind::Laser),
        fire_rate: Some(0.0),
        ..Default::default()
    }])
    .unwrap_err();
    assert!(matches!(err, CatalogError::InvalidStat { .. }));
}

#[test]
fn override_changes_only_target_weapon() {
    let weapons = WeaponCatalog::with_overrides(&[WeaponOverride {
        kind: Some(WeaponKind::Standard),
        damage: Some(40.0),
        ..Default::default()
    }])
    .expect("valid override");
    assert_eq!(weapons.get(WeaponKind::Standard).damage, 40.0);
    assert_eq!(
        weapons.get(WeaponKind::Laser).damage,
        WeaponKind::Laser.spec().damage
    );
}

// ── Synergy lookup ─────────────────────────────────────────────────────

#[test]
fn synergy_lookup_is_order_independent() {
    let (_, _, synergies) = catalogs();
    let forward = SynergyKey::new(&[
        Ingredient::Weapon(WeaponKind::Nova),
        Ingredient::Weapon(WeaponKind::Vortex),
        Ingredient::PowerUp(PowerUpKind::TimeWarp),
    ]);
    let shuffled = SynergyKey::new(&[
        Ingredient::PowerUp(PowerUpKind::TimeWarp),
        Ingredient::Weapon(WeaponKind::Vortex),
        Ingredient::Weapon(WeaponKind::Nova),
    ]);
    assert_eq!(synergies.lookup(&forward), Some(SynergyKind::Singularity));
    assert_eq!(synergies.lookup(&shuffled), Some(SynergyKind::Singularity));
}

#[test]
fn chain_rules_reference_real_synergies() {
    let (_, _, synergies) = catalogs();
    for rule in synergies.rules() {
        assert!(rule.participants.len() >= 2);
        for p in rule.participants {
            assert_eq!(synergies.get(*p).kind, *p);
        }
    }
}

// ── Patterns and damage ────────────────────────────────────────────────

#[test]
fn every_weapon_pattern_expands_to_its_count() {
    let (weapons, _, _) = catalogs();
    for def in weapons.iter() {
        let shots = expand_pattern(
            &def.pattern,
            voidfire_logic::math::Vec3::FORWARD,
            def.secondary_damage_factor,
        );
        assert_eq!(shots.len(), def.pattern.projectile_count(), "{}", def.name);
        assert!(shots.iter().all(|s| s.direction.is_finite()));
    }
}

#[test]
fn helix_has_two_strands() {
    let helix = WeaponKind::Helix.spec();
    assert!(matches!(helix.pattern, FiringPattern::Helix { .. }));
    let shots = expand_pattern(&helix.pattern, voidfire_logic::math::Vec3::FORWARD, 0.9);
    assert_eq!(shots.len() % 2, 0);
}

#[test]
fn leveled_evolved_plasma_hit() {
    let plasma = WeaponKind::Plasma.spec();
    let level = level_scaling(3);
    let b = compute_hit_damage(&HitInputs {
        base: plasma.damage,
        charge_ratio: 1.0,
        level_multiplier: level.damage,
        evolution_multiplier: EvolutionStage::Enhanced.damage_multiplier(),
        element: plasma.element,
        falloff: None,
    });
    // 40 × 1.3 × 1.1 = 57.2, plus 30% plasma
    assert!((b.after_level - 57.2).abs() < 1e-3);
    assert!((b.total - 74.36).abs() < 1e-2);
}

#[test]
fn level_five_extends_range() {
    let railgun = WeaponKind::Railgun.spec();
    let lv5 = apply_level(&railgun, 5);
    assert!((lv5.range - railgun.range * 1.2).abs() < 1e-3);
}

// ── Balance math ───────────────────────────────────────────────────────

#[test]
fn struggling_player_drifts_toward_ceiling() {
    let tuning = BalanceTuning::default();
    let perf = PerformanceSnapshot {
        accuracy: 0.1,
        damage_per_second: 5.0,
        kills_per_minute: 1.0,
        deaths_per_minute: 0.0,
    };
    let score = composite_score(&perf, &tuning.targets, &tuning.weights);
    let direction = direction_for(score, &tuning);
    assert_eq!(direction, BalanceDirection::Easier);

    let target = drift_target(direction, tuning.damage_floor, tuning.damage_ceiling);
    let mut m = 1.0;
    for _ in 0..200 {
        let next = drift_toward(m, target, tuning.drift_rate);
        assert!(next >= m);
        assert!(next <= tuning.damage_ceiling);
        m = next;
    }
    assert_eq!(m, tuning.damage_ceiling);
}
