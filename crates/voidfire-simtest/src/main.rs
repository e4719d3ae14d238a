//! Voidfire Headless Combat Harness
//!
//! Drives seeded combat sessions through the real engine with scripted bots
//! and checks catalog consistency, fire-rate limits, stacking caps, synergy
//! activation and balancing direction. No renderer, no audio, no input.
//!
//! Usage:
//!   cargo run -p voidfire-simtest
//!   cargo run -p voidfire-simtest -- --verbose
//!   cargo run -p voidfire-simtest -- --json

use serde::Serialize;
use voidfire_core::config::CombatConfig;
use voidfire_core::engine::{CombatEngine, FrameInput};
use voidfire_core::systems::CombatEvent;
use voidfire_logic::math::Vec3;
use voidfire_logic::status::{StackingRule, StatusEffectKind};
use voidfire_logic::synergy::Ingredient;
use voidfire_logic::weapons::{FireDiscipline, WeaponKind};

// ── Tuning file (same JSON a game build ships with) ────────────────────
const TUNING_JSON: &str = include_str!("../../../data/tuning.json");

const FRAME: f32 = 1.0 / 60.0;
const BOT_SECONDS: f32 = 180.0;
const BOT_SEEDS: [u64; 3] = [1, 7, 42];

// ── Test harness ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn main() {
    let verbose = std::env::args().any(|a| a == "--verbose");
    let json = std::env::args().any(|a| a == "--json");
    println!("=== Voidfire Combat Harness ===\n");

    let mut results = Vec::new();

    // 1. Tuning file
    let config = match CombatConfig::from_json(TUNING_JSON) {
        Ok(c) => {
            results.push(TestResult {
                name: "tuning_parse".into(),
                passed: true,
                detail: format!("seed {}", c.seed),
            });
            c
        }
        Err(e) => {
            results.push(TestResult {
                name: "tuning_parse".into(),
                passed: false,
                detail: e.to_string(),
            });
            CombatConfig::default()
        }
    };

    // 2. Catalog consistency
    results.extend(validate_catalogs(&config, verbose));

    // 3. Weapon firing sweep
    results.extend(validate_weapon_firing(&config, verbose));

    // 4. Status stacking sweep
    results.extend(validate_status_stacking(&config, verbose));

    // 5. Synergy activation sweep
    results.extend(validate_synergies(&config, verbose));

    // 6. Balancing bots
    results.extend(validate_balancing(&config, verbose));

    // 7. Determinism and save/restore
    results.extend(validate_determinism(&config, verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(report) => println!("{}", report),
            Err(e) => eprintln!("failed to encode report: {}", e),
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

fn new_engine(config: &CombatConfig) -> Option<CombatEngine> {
    match CombatEngine::new(config.clone()) {
        Ok(engine) => Some(engine),
        Err(e) => {
            eprintln!("engine construction failed: {}", e);
            None
        }
    }
}

fn engine_failure(name: &str) -> Vec<TestResult> {
    vec![TestResult {
        name: name.into(),
        passed: false,
        detail: "engine could not be built".into(),
    }]
}

// ── 2. Catalogs ─────────────────────────────────────────────────────────

fn validate_catalogs(config: &CombatConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Catalogs ---");
    let mut results = Vec::new();

    let catalogs = match config.build_catalogs() {
        Ok(c) => c,
        Err(e) => {
            results.push(TestResult {
                name: "catalogs_build".into(),
                passed: false,
                detail: e.to_string(),
            });
            return results;
        }
    };

    results.push(TestResult {
        name: "weapon_catalog_complete".into(),
        passed: catalogs.weapons.iter().count() == WeaponKind::COUNT,
        detail: format!("{} weapons", catalogs.weapons.iter().count()),
    });

    let bad_rates: Vec<_> = catalogs
        .weapons
        .iter()
        .filter(|w| !(w.fire_rate > 0.0) || !(0.0..=1.0).contains(&w.accuracy))
        .map(|w| w.name)
        .collect();
    results.push(TestResult {
        name: "weapon_stats_in_range".into(),
        passed: bad_rates.is_empty(),
        detail: if bad_rates.is_empty() {
            "all fire rates positive, accuracies within [0, 1]".into()
        } else {
            format!("out of range: {:?}", bad_rates)
        },
    });

    if verbose {
        for w in catalogs.weapons.iter() {
            println!(
                "  {:<14} dmg {:>6.1}  rate {:>5.2}/s  energy {:>5.1}  {:?}",
                w.name, w.damage, w.fire_rate, w.energy_cost, w.discipline
            );
        }
    }

    let bad_status: Vec<_> = catalogs
        .statuses
        .iter()
        .filter(|s| s.max_stacks == 0 || !(s.base_duration > 0.0))
        .map(|s| s.name)
        .collect();
    results.push(TestResult {
        name: "status_catalog_valid".into(),
        passed: bad_status.is_empty() && catalogs.statuses.iter().count() == StatusEffectKind::COUNT,
        detail: format!(
            "{} effects, {} invalid",
            catalogs.statuses.iter().count(),
            bad_status.len()
        ),
    });

    let mut keys: Vec<_> = catalogs.synergies.iter().map(|s| s.key.clone()).collect();
    let before = keys.len();
    keys.sort();
    keys.dedup();
    results.push(TestResult {
        name: "synergy_keys_unique".into(),
        passed: keys.len() == before,
        detail: format!(
            "{} synergies, {} chain rules",
            before,
            catalogs.synergies.rules().len()
        ),
    });

    results
}

// ── 3. Weapon firing ────────────────────────────────────────────────────

/// Fire button pattern that engages a weapon's discipline as fast as it allows.
fn trigger_held(discipline: FireDiscipline, frame: u32) -> bool {
    match discipline {
        FireDiscipline::FullAuto => true,
        FireDiscipline::Instant | FireDiscipline::Burst { .. } => frame % 2 == 0,
        FireDiscipline::Charge { charge_time, .. } => {
            let cycle = ((charge_time + 0.05) / FRAME).ceil() as u32 + 1;
            frame % cycle != cycle - 1
        }
    }
}

fn validate_weapon_firing(config: &CombatConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Weapon Firing ---");
    let mut results = Vec::new();
    let seconds = 4.0;
    let frames = (seconds / FRAME) as u32;

    for kind in WeaponKind::ALL {
        let Some(mut engine) = new_engine(config) else {
            return engine_failure("weapon_firing");
        };
        engine.equip_weapon(kind);
        let def = engine.catalogs().weapons.get(kind).clone();
        let per_event = match def.discipline {
            FireDiscipline::Burst { shots, .. } => shots.max(1) as u32,
            _ => 1,
        };

        let mut fired = 0u32;
        let mut energy_ok = true;
        for frame in 0..frames {
            let input = FrameInput {
                fire_held: trigger_held(def.discipline, frame),
                aim: Vec3::FORWARD,
                target: None,
            };
            let report = engine.update(FRAME, &input);
            fired += report
                .events
                .iter()
                .filter(|e| matches!(e, CombatEvent::WeaponFired { .. }))
                .count() as u32;
            energy_ok &= engine.weapons().energy() >= 0.0;
        }

        let limit = ((def.fire_rate * seconds).ceil() as u32 + 1) * per_event;
        if verbose {
            println!(
                "  {:<14} fired {:>3} (limit {:>3})",
                def.name, fired, limit
            );
        }
        results.push(TestResult {
            name: format!("fires_{:?}", kind).to_lowercase(),
            passed: fired >= 1 && fired <= limit && energy_ok,
            detail: format!(
                "{} fire events in {:.0}s, limit {}, energy {:.1}",
                fired,
                seconds,
                limit,
                engine.weapons().energy()
            ),
        });
    }

    results
}

// ── 4. Status stacking ──────────────────────────────────────────────────

fn validate_status_stacking(config: &CombatConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Status Stacking ---");
    let mut results = Vec::new();
    let Some(mut engine) = new_engine(config) else {
        return engine_failure("status_stacking");
    };

    let mut violations = Vec::new();
    // Targets sit far apart so nothing chains or spreads between them.
    for (i, kind) in StatusEffectKind::ALL.into_iter().enumerate() {
        let target = engine.spawn_enemy(Vec3::new(i as f32 * 100.0, 0.0, 500.0), 1.0e6, 1.0);
        for _ in 0..12 {
            engine.apply_status(target, kind);
        }
        let def = engine.status().definition(kind);
        let count = engine.status().stack_count(target, kind);
        let cap = match def.stacking {
            StackingRule::Independent => def.max_stacks.max(1),
            StackingRule::IncreaseIntensity => def.max_stacks,
            _ => 1,
        };
        if verbose {
            println!("  {:<14} {:?} -> {} / {}", def.name, def.stacking, count, cap);
        }
        if count == 0 || count > cap.max(1) {
            violations.push(format!("{:?}={}", kind, count));
        }
    }

    results.push(TestResult {
        name: "stack_caps_respected".into(),
        passed: violations.is_empty(),
        detail: if violations.is_empty() {
            format!("{} effect kinds capped", StatusEffectKind::COUNT)
        } else {
            format!("violations: {}", violations.join(", "))
        },
    });

    // Effects expire on their own
    for _ in 0..(120.0 / FRAME) as u32 {
        engine.update(FRAME, &FrameInput::default());
    }
    let lingering = engine.status().affected_count();
    results.push(TestResult {
        name: "effects_expire".into(),
        passed: lingering == 0,
        detail: format!("{} entities still affected after 120s", lingering),
    });

    results
}

// ── 5. Synergies ────────────────────────────────────────────────────────

fn validate_synergies(config: &CombatConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Synergies ---");
    let mut results = Vec::new();
    let Some(probe) = new_engine(config) else {
        return engine_failure("synergies");
    };
    let definitions: Vec<_> = probe.catalogs().synergies.iter().cloned().collect();

    let mut missing = Vec::new();
    for def in &definitions {
        let Some(mut engine) = new_engine(config) else {
            return engine_failure("synergies");
        };
        for ingredient in def.key.ingredients() {
            match ingredient {
                Ingredient::Weapon(w) => {
                    engine.equip_weapon(*w);
                }
                Ingredient::PowerUp(p) => engine.grant_power_up(*p),
            }
        }
        let report = engine.update(FRAME, &FrameInput::default());
        let announced = report.events.iter().any(|e| {
            matches!(e, CombatEvent::SynergyActivated { kind, first_discovery: true } if *kind == def.kind)
        });
        if verbose {
            println!("  {:<18} active={} announced={}", def.name, engine.synergy().is_active(def.kind), announced);
        }
        if !engine.synergy().is_active(def.kind) || !announced {
            missing.push(def.name);
        }
    }

    results.push(TestResult {
        name: "synergies_activate".into(),
        passed: missing.is_empty(),
        detail: if missing.is_empty() {
            format!("{} synergies activate from their ingredients", definitions.len())
        } else {
            format!("not activated: {:?}", missing)
        },
    });

    results
}

// ── 6. Balancing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bot {
    /// Aims at every enemy, never dies.
    Strong,
    /// Fires away from the fight and dies every 20 seconds.
    Weak,
}

#[derive(Debug, Clone, PartialEq)]
struct BotRun {
    damage_multiplier: f32,
    energy_efficiency: f32,
    damage_dealt: f32,
    kills: usize,
}

fn run_bot(config: &CombatConfig, bot: Bot, seed: u64) -> Option<(BotRun, CombatEngine)> {
    let mut engine = new_engine(&config.clone().with_seed(seed))?;
    engine.equip_weapon(WeaponKind::Standard);

    let aim = match bot {
        Bot::Strong => Vec3::FORWARD,
        Bot::Weak => Vec3::new(0.0, 0.0, -1.0),
    };
    let input = FrameInput {
        fire_held: true,
        aim,
        target: None,
    };

    let mut run = BotRun {
        damage_multiplier: 1.0,
        energy_efficiency: 1.0,
        damage_dealt: 0.0,
        kills: 0,
    };
    let frames = (BOT_SECONDS / FRAME) as u32;
    let death_every = (20.0 / FRAME) as u32;
    for frame in 0..frames {
        if engine.enemy_count() == 0 {
            engine.spawn_enemy(Vec3::new(0.0, 0.0, 20.0), 40.0, 2.0);
        }
        if bot == Bot::Weak && frame > 0 && frame % death_every == 0 {
            engine.damage_player(1.0e4);
        }
        let report = engine.update(FRAME, &input);
        run.damage_dealt += report.damage_dealt;
        run.kills += report.kills.len();
    }
    run.damage_multiplier = engine.balance().damage_multiplier();
    run.energy_efficiency = engine.balance().energy_efficiency();
    Some((run, engine))
}

fn validate_balancing(config: &CombatConfig, verbose: bool) -> Vec<TestResult> {
    println!("--- Balancing ---");
    let mut results = Vec::new();

    for seed in BOT_SEEDS {
        let (Some((strong, _)), Some((weak, _))) = (
            run_bot(config, Bot::Strong, seed),
            run_bot(config, Bot::Weak, seed),
        ) else {
            return engine_failure("balancing");
        };
        if verbose {
            println!(
                "  seed {:>3}: strong x{:.3} ({} kills, {:.0} dmg)  weak x{:.3} ({} kills)",
                seed,
                strong.damage_multiplier,
                strong.kills,
                strong.damage_dealt,
                weak.damage_multiplier,
                weak.kills
            );
        }

        results.push(TestResult {
            name: format!("strong_bot_gets_harder_seed_{}", seed),
            passed: strong.damage_multiplier < 1.0 && strong.energy_efficiency < 1.0,
            detail: format!(
                "damage x{:.3}, energy x{:.3}, {} kills",
                strong.damage_multiplier, strong.energy_efficiency, strong.kills
            ),
        });
        results.push(TestResult {
            name: format!("weak_bot_gets_easier_seed_{}", seed),
            passed: weak.damage_multiplier > 1.0 && weak.energy_efficiency > 1.0,
            detail: format!(
                "damage x{:.3}, energy x{:.3}, {} kills",
                weak.damage_multiplier, weak.energy_efficiency, weak.kills
            ),
        });

        let tuning = &config.balance.tuning;
        let bounded = [strong.damage_multiplier, weak.damage_multiplier]
            .iter()
            .all(|m| *m >= tuning.damage_floor && *m <= tuning.damage_ceiling);
        results.push(TestResult {
            name: format!("multipliers_bounded_seed_{}", seed),
            passed: bounded,
            detail: format!(
                "within [{:.2}, {:.2}]",
                tuning.damage_floor, tuning.damage_ceiling
            ),
        });
    }

    results
}

// ── 7. Determinism ──────────────────────────────────────────────────────

fn validate_determinism(config: &CombatConfig, _verbose: bool) -> Vec<TestResult> {
    println!("--- Determinism ---");
    let mut results = Vec::new();

    let (Some((a, engine)), Some((b, _))) = (
        run_bot(config, Bot::Strong, config.seed),
        run_bot(config, Bot::Strong, config.seed),
    ) else {
        return engine_failure("determinism");
    };
    results.push(TestResult {
        name: "same_seed_same_session".into(),
        passed: a == b,
        detail: format!("{:.1} dmg / {} kills both runs", a.damage_dealt, a.kills),
    });

    let mut buf = Vec::new();
    let saved = engine.save(&mut buf);
    let Some(mut fresh) = new_engine(config) else {
        return engine_failure("save_restore_balance");
    };
    match saved.and_then(|_| fresh.load(&buf[..])) {
        Ok(()) => results.push(TestResult {
            name: "save_restore_balance".into(),
            passed: fresh.balance().state() == engine.balance().state()
                && fresh.progression() == engine.progression(),
            detail: format!("{} byte save", buf.len()),
        }),
        Err(e) => results.push(TestResult {
            name: "save_restore_balance".into(),
            passed: false,
            detail: e.to_string(),
        }),
    }

    results
}
