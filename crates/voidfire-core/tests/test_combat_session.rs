//! End-to-end combat sessions driven through the public engine API.

use std::cell::RefCell;
use std::rc::Rc;

use voidfire_core::components::Health;
use voidfire_core::config::CombatConfig;
use voidfire_core::engine::{CombatEngine, FrameInput, FrameReport};
use voidfire_core::systems::{
    BalanceState, CombatEvent, CombatObserver, FireOutcome, ObserverError,
};
use voidfire_logic::math::Vec3;
use voidfire_logic::status::StatusEffectKind;
use voidfire_logic::synergy::SynergyKind;
use voidfire_logic::weapons::WeaponKind;

const FRAME: f32 = 1.0 / 60.0;

// ── Helpers ──────────────────────────────────────────────────────────────

fn engine() -> CombatEngine {
    CombatEngine::new(CombatConfig::default()).unwrap()
}

fn held() -> FrameInput {
    FrameInput {
        fire_held: true,
        aim: Vec3::FORWARD,
        target: None,
    }
}

fn idle() -> FrameInput {
    FrameInput {
        fire_held: false,
        aim: Vec3::FORWARD,
        target: None,
    }
}

fn run(engine: &mut CombatEngine, seconds: f32, input: &FrameInput) -> Vec<FrameReport> {
    let frames = (seconds / FRAME).round() as u32;
    (0..frames).map(|_| engine.update(FRAME, input)).collect()
}

fn count_fired(reports: &[FrameReport]) -> usize {
    reports
        .iter()
        .flat_map(|r| r.events.iter())
        .filter(|e| matches!(e, CombatEvent::WeaponFired { .. }))
        .count()
}

// ── Weapons ──────────────────────────────────────────────────────────────

#[test]
fn standard_shot_spawns_one_projectile_and_costs_five_energy() {
    let mut engine = engine();
    engine.equip_weapon(WeaponKind::Standard);

    let report = engine.update(FRAME, &held());
    assert!(matches!(
        report.fire,
        Some(FireOutcome::Fired { projectiles: 1, .. })
    ));

    let projectiles = engine.weapons().projectiles();
    assert_eq!(projectiles.len(), 1);
    let damage = projectiles[0].damage;
    assert!(
        (23.75..=26.25).contains(&damage),
        "damage {} outside ±5% of 25",
        damage
    );
    assert_eq!(engine.weapons().energy(), 95.0);
}

#[test]
fn full_auto_respects_fire_rate() {
    let mut engine = engine();
    engine.equip_weapon(WeaponKind::Standard);
    let reports = run(&mut engine, 1.0, &held());
    let fired = count_fired(&reports);
    assert!((3..=4).contains(&fired), "fired {} times in 1s at 3/s", fired);
}

#[test]
fn early_charge_release_is_free() {
    let mut engine = engine();
    engine.equip_weapon(WeaponKind::Railgun);

    run(&mut engine, 0.5, &held());
    let report = engine.update(FRAME, &idle());

    assert!(matches!(
        report.fire,
        Some(FireOutcome::ChargeCancelled { .. })
    ));
    assert!(report
        .events
        .iter()
        .any(|e| matches!(e, CombatEvent::ChargeCancelled { weapon: WeaponKind::Railgun, .. })));
    assert_eq!(engine.weapons().energy(), 100.0);
    assert!(engine.weapons().projectiles().is_empty());
}

#[test]
fn full_charge_release_fires() {
    let mut engine = engine();
    engine.equip_weapon(WeaponKind::Railgun);

    run(&mut engine, 2.1, &held());
    let report = engine.update(FRAME, &idle());

    match report.fire {
        Some(FireOutcome::Fired { charge_ratio, .. }) => assert_eq!(charge_ratio, 1.0),
        other => panic!("expected a shot, got {:?}", other),
    }
    assert_eq!(engine.weapons().energy(), 70.0);
}

// ── Status effects ───────────────────────────────────────────────────────

#[test]
fn burning_deals_fifteen_damage_over_its_duration() {
    let mut engine = engine();
    let target = engine.spawn_enemy(Vec3::new(0.0, 0.0, 50.0), 100.0, 1.0);
    engine.apply_status(target, StatusEffectKind::Burning);

    run(&mut engine, 4.0, &idle());

    let health = *engine.world.get::<&Health>(target).unwrap();
    assert!(
        (health.max - health.current - 15.0).abs() < 1e-3,
        "took {}",
        health.max - health.current
    );
    assert!(!engine.status().has_effect(target, StatusEffectKind::Burning));
}

#[test]
fn repeated_applications_never_exceed_stack_caps() {
    let mut engine = engine();
    for (i, kind) in StatusEffectKind::ALL.into_iter().enumerate() {
        let target = engine.spawn_enemy(Vec3::new(i as f32 * 100.0, 0.0, 300.0), 1.0e6, 1.0);
        for _ in 0..20 {
            engine.apply_status(target, kind);
        }
        let cap = engine.status().definition(kind).max_stacks.max(1);
        let count = engine.status().stack_count(target, kind);
        assert!(count >= 1 && count <= cap, "{:?}: {} > {}", kind, count, cap);
    }
}

#[test]
fn killed_enemy_loses_its_effects() {
    let mut engine = engine();
    engine.equip_weapon(WeaponKind::Standard);
    let target = engine.spawn_enemy(Vec3::new(0.0, 0.0, 30.0), 1.0, 2.0);
    engine.apply_status(target, StatusEffectKind::Frozen);

    let reports = run(&mut engine, 0.5, &held());
    assert!(reports.iter().any(|r| r.kills.contains(&target)));
    assert!(engine.status().get_all(target).is_empty());
    assert_eq!(engine.enemy_count(), 0);
}

// ── Synergies ────────────────────────────────────────────────────────────

#[test]
fn synergy_runs_its_rarity_duration_then_expires() {
    let mut engine = engine();
    engine.equip_weapon(WeaponKind::Standard);
    engine.equip_weapon(WeaponKind::Scatter);

    engine.update(FRAME, &idle());
    assert!(engine.synergy().is_active(SynergyKind::Scattershot));

    run(&mut engine, 14.5, &idle());
    assert!(engine.synergy().is_active(SynergyKind::Scattershot));

    let reports = run(&mut engine, 1.0, &idle());
    assert!(!engine.synergy().is_active(SynergyKind::Scattershot));
    assert!(reports.iter().flat_map(|r| r.events.iter()).any(|e| matches!(
        e,
        CombatEvent::SynergyExpired {
            kind: SynergyKind::Scattershot
        }
    )));
}

#[test]
fn rechecking_an_active_synergy_does_not_restart_it() {
    let mut engine = engine();
    engine.equip_weapon(WeaponKind::Standard);
    engine.equip_weapon(WeaponKind::Scatter);
    engine.update(FRAME, &idle());
    run(&mut engine, 5.0, &idle());
    let before = engine.synergy().get(SynergyKind::Scattershot).unwrap().remaining;

    // Loadout change forces another check
    engine.equip_weapon(WeaponKind::Laser);
    let report = engine.update(FRAME, &idle());

    let after = engine.synergy().get(SynergyKind::Scattershot).unwrap().remaining;
    assert!(after < before);
    assert!(!report.events.iter().any(|e| matches!(
        e,
        CombatEvent::SynergyActivated {
            kind: SynergyKind::Scattershot,
            ..
        }
    )));
}

// ── Balancing ────────────────────────────────────────────────────────────

#[test]
fn struggling_player_drifts_easier() {
    let mut engine = engine();
    engine.equip_weapon(WeaponKind::Standard);
    let aim_away = FrameInput {
        fire_held: true,
        aim: Vec3::new(0.0, 0.0, -1.0),
        target: None,
    };
    engine.spawn_enemy(Vec3::new(0.0, 0.0, 40.0), 100.0, 2.0);

    for _ in 0..6 {
        engine.damage_player(1.0e4);
        run(&mut engine, 10.0, &aim_away);
    }

    let multiplier = engine.balance().damage_multiplier();
    assert!(multiplier > 1.0, "multiplier {}", multiplier);
    assert!(multiplier <= engine.config().balance.tuning.damage_ceiling);
    assert!(engine.balance().energy_efficiency() > 1.0);
}

#[test]
fn balance_state_survives_json_roundtrip() {
    let mut engine = engine();
    engine.equip_weapon(WeaponKind::Standard);
    engine.spawn_enemy(Vec3::new(0.0, 0.0, 25.0), 500.0, 2.0);
    run(&mut engine, 25.0, &held());

    let state = engine.balance().state().clone();
    let json = serde_json::to_string(&state).unwrap();
    let back: BalanceState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
    assert!(!back.samples.is_empty());
}

// ── Events ───────────────────────────────────────────────────────────────

struct Recorder {
    seen: Rc<RefCell<Vec<CombatEvent>>>,
}

impl CombatObserver for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn on_event(&mut self, event: &CombatEvent) -> Result<(), ObserverError> {
        self.seen.borrow_mut().push(event.clone());
        Ok(())
    }
}

struct Grumpy;

impl CombatObserver for Grumpy {
    fn name(&self) -> &str {
        "grumpy"
    }

    fn on_event(&mut self, _event: &CombatEvent) -> Result<(), ObserverError> {
        Err(ObserverError::new("grumpy", "always fails"))
    }
}

#[test]
fn failing_observer_does_not_starve_the_others() {
    let mut engine = engine();
    let seen = Rc::new(RefCell::new(Vec::new()));
    engine.events_mut().subscribe(Box::new(Grumpy));
    engine.events_mut().subscribe(Box::new(Recorder { seen: seen.clone() }));

    engine.equip_weapon(WeaponKind::Standard);
    let report = engine.update(FRAME, &held());

    let seen = seen.borrow();
    assert_eq!(*seen, report.events);
    assert!(seen
        .iter()
        .any(|e| matches!(e, CombatEvent::WeaponFired { weapon: WeaponKind::Standard, .. })));
    assert_eq!(engine.events_mut().failures(), report.events.len() as u64);
}

#[test]
fn same_seed_replays_identically() {
    let script = |engine: &mut CombatEngine| {
        engine.equip_weapon(WeaponKind::Scatter);
        engine.spawn_enemy(Vec3::new(1.0, 0.0, 20.0), 80.0, 2.0);
        engine.spawn_enemy(Vec3::new(-3.0, 0.0, 35.0), 80.0, 2.0);
        let mut total = 0.0;
        for frame in 0..300 {
            let input = FrameInput {
                fire_held: frame % 2 == 0,
                aim: Vec3::FORWARD,
                target: None,
            };
            total += engine.update(FRAME, &input).damage_dealt;
        }
        total
    };

    let mut a = engine();
    let mut b = engine();
    assert_eq!(script(&mut a), script(&mut b));
    assert_eq!(a.balance().state(), b.balance().state());
}
