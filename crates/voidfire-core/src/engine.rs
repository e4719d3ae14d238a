//! Combat engine - owns every subsystem and runs them in a fixed order each frame

use std::collections::BTreeMap;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use voidfire_logic::balance::DifficultyTier;
use voidfire_logic::constants::damage::MIN_FIRE_RATE;
use voidfire_logic::damage::{clamp_damage, splash_damage};
use voidfire_logic::math::Vec3;
use voidfire_logic::status::StatusEffectKind;
use voidfire_logic::synergy::{Ingredient, PowerUpKind};
use voidfire_logic::upgrades::{clamp_level, WeaponExperience};
use voidfire_logic::weapons::{MovementKind, OnHitStatus, WeaponKind};

use crate::components::*;
use crate::config::{streams, Catalogs, CombatConfig, ConfigError};
use crate::persistence::ProgressionSnapshot;
use crate::systems::*;

/// Player hull points.
pub const PLAYER_MAX_HEALTH: f32 = 100.0;

/// External input for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    pub fire_held: bool,
    pub aim: Vec3,
    /// Where homing projectiles should steer; nearest enemy when `None`.
    pub target: Option<Vec3>,
}

/// What happened during one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameReport {
    pub fire: Option<FireOutcome>,
    pub hits: usize,
    pub damage_dealt: f32,
    pub kills: Vec<Entity>,
    /// Every event dispatched this frame, in order.
    pub events: Vec<CombatEvent>,
}

/// Pending damage against one target.
struct HitRecord {
    weapon: WeaponKind,
    projectile: Option<u32>,
    target: Entity,
    position: Vec3,
    damage: f32,
    critical: bool,
    status: Option<OnHitStatus>,
}

/// Main combat engine
pub struct CombatEngine {
    /// Player and enemies
    pub world: World,
    player: Entity,
    config: CombatConfig,
    catalogs: Catalogs,
    weapons: WeaponController,
    status: StatusEffectManager,
    synergy: SynergyEngine,
    balance: BalancingEngine,
    events: EventBus,
    power_ups: BTreeMap<PowerUpKind, f32>,
    upgrades: BTreeMap<WeaponKind, u8>,
    experience: BTreeMap<WeaponKind, WeaponExperience>,
    /// Damage dealt so far by each live projectile, keyed by projectile id.
    projectile_damage: BTreeMap<u32, f32>,
    ingredients_dirty: bool,
    was_held: bool,
    elapsed: f64,
    rng: StdRng,
}

impl CombatEngine {
    /// Validate `config`, build the catalogs and spawn the player.
    pub fn new(config: CombatConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let catalogs = config.build_catalogs()?;

        let mut world = World::new();
        let player = world.spawn((
            Player,
            Position::default(),
            Velocity::default(),
            Hitbox::default(),
            Health::new(PLAYER_MAX_HEALTH),
        ));

        Ok(Self {
            world,
            player,
            weapons: WeaponController::new(catalogs.weapons.clone(), &config),
            status: StatusEffectManager::new(
                catalogs.statuses.clone(),
                config.status,
                config.stream_seed(streams::STATUS),
            ),
            synergy: SynergyEngine::new(catalogs.synergies.clone(), config.synergy),
            balance: BalancingEngine::new(&config.balance),
            events: EventBus::new(),
            power_ups: BTreeMap::new(),
            upgrades: BTreeMap::new(),
            experience: BTreeMap::new(),
            projectile_damage: BTreeMap::new(),
            ingredients_dirty: false,
            was_held: false,
            elapsed: 0.0,
            rng: StdRng::seed_from_u64(config.stream_seed(streams::ENGINE)),
            catalogs,
            config,
        })
    }

    // ── Accessors ──────────────────────────────────────────────────────

    pub fn player(&self) -> Entity {
        self.player
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn catalogs(&self) -> &Catalogs {
        &self.catalogs
    }

    pub fn weapons(&self) -> &WeaponController {
        &self.weapons
    }

    pub fn status(&self) -> &StatusEffectManager {
        &self.status
    }

    pub fn synergy(&self) -> &SynergyEngine {
        &self.synergy
    }

    pub fn balance(&self) -> &BalancingEngine {
        &self.balance
    }

    /// The bus, for subscribing observers.
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Simulated seconds since creation.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn enemy_count(&self) -> usize {
        self.world.query::<&Enemy>().iter().count()
    }

    pub fn player_health(&self) -> Option<Health> {
        self.world.get::<&Health>(self.player).ok().map(|h| *h)
    }

    pub fn active_power_ups(&self) -> impl Iterator<Item = (PowerUpKind, f32)> + '_ {
        self.power_ups.iter().map(|(k, t)| (*k, *t))
    }

    pub fn experience(&self, kind: WeaponKind) -> WeaponExperience {
        self.experience.get(&kind).copied().unwrap_or_default()
    }

    pub fn upgrade_level(&self, kind: WeaponKind) -> u8 {
        self.upgrades.get(&kind).copied().unwrap_or(1)
    }

    // ── Loadout ────────────────────────────────────────────────────────

    pub fn equip_weapon(&mut self, kind: WeaponKind) -> bool {
        let first = self.weapons.active_kind().is_none();
        if !self.weapons.equip(kind, self.upgrade_level(kind)) {
            return false;
        }
        self.weapons
            .set_evolution_multiplier(kind, self.experience(kind).damage_multiplier());
        self.events.push(CombatEvent::WeaponEquipped { weapon: kind });
        if first {
            self.events.push(CombatEvent::WeaponSwitched {
                from: None,
                to: kind,
            });
        }
        self.ingredients_dirty = true;
        true
    }

    pub fn unequip_weapon(&mut self, kind: WeaponKind) -> bool {
        let before = self.weapons.active_kind();
        if !self.weapons.unequip(kind) {
            return false;
        }
        let after = self.weapons.active_kind();
        if let Some(to) = after {
            if before != after {
                self.events.push(CombatEvent::WeaponSwitched { from: before, to });
            }
        }
        self.ingredients_dirty = true;
        true
    }

    pub fn switch_weapon(&mut self, kind: WeaponKind) -> bool {
        let from = self.weapons.active_kind();
        if from == Some(kind) {
            return true;
        }
        if !self.weapons.switch_to(kind) {
            return false;
        }
        self.events
            .push(CombatEvent::WeaponSwitched { from, to: kind });
        self.ingredients_dirty = true;
        true
    }

    /// Set a permanent upgrade level (clamped to 1..=5).
    pub fn set_upgrade_level(&mut self, kind: WeaponKind, level: u8) {
        let level = clamp_level(level);
        self.upgrades.insert(kind, level);
        self.weapons.set_level(kind, level);
    }

    pub fn set_difficulty(&mut self, tier: DifficultyTier) {
        self.balance.set_difficulty(tier);
    }

    pub fn difficulty(&self) -> DifficultyTier {
        self.balance.difficulty()
    }

    pub fn set_game_level(&mut self, level: u32) {
        self.balance.set_level(level);
    }

    // ── Power-ups ──────────────────────────────────────────────────────

    pub fn grant_power_up(&mut self, kind: PowerUpKind) {
        self.grant_power_up_for(kind, kind.default_duration());
    }

    /// Grant (or refresh) a power-up for `duration` seconds.
    pub fn grant_power_up_for(&mut self, kind: PowerUpKind, duration: f32) {
        let duration = duration.max(0.0);
        let fresh = self.power_ups.insert(kind, duration).is_none();
        self.events.push(CombatEvent::PowerUpGained { kind });
        match kind {
            PowerUpKind::Shield => {
                let app = StatusApplication::new(StatusEffectKind::Shielded).with_duration(duration);
                self.status.apply_with(self.player, app, &mut self.events);
            }
            PowerUpKind::DamageBoost => {
                let app =
                    StatusApplication::new(StatusEffectKind::Overcharged).with_duration(duration);
                self.status.apply_with(self.player, app, &mut self.events);
            }
            PowerUpKind::EnergySurge => self.weapons.refill_energy(),
            _ => {}
        }
        if fresh {
            log::debug!("power-up {:?} for {:.1}s", kind, duration);
            self.ingredients_dirty = true;
        }
    }

    fn tick_power_ups(&mut self, dt: f32) {
        let mut expired = Vec::new();
        for (kind, remaining) in self.power_ups.iter_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                expired.push(*kind);
            }
        }
        for kind in expired {
            self.power_ups.remove(&kind);
            self.events.push(CombatEvent::PowerUpExpired { kind });
            self.ingredients_dirty = true;
        }
    }

    /// Equipped weapons plus active power-ups.
    pub fn ingredients(&self) -> Vec<Ingredient> {
        self.weapons
            .equipped_kinds()
            .into_iter()
            .map(Ingredient::Weapon)
            .chain(self.power_ups.keys().map(|k| Ingredient::PowerUp(*k)))
            .collect()
    }

    // ── Entities ───────────────────────────────────────────────────────

    /// Spawn an enemy; health is scaled by difficulty and progression.
    pub fn spawn_enemy(&mut self, position: Vec3, base_health: f32, radius: f32) -> Entity {
        self.spawn_enemy_with(
            position,
            Enemy {
                base_health,
                base_speed: 0.0,
                base_damage: 0.0,
            },
            radius,
        )
    }

    pub fn spawn_enemy_with(&mut self, position: Vec3, enemy: Enemy, radius: f32) -> Entity {
        let health = self.balance.calculate_enemy_health(enemy.base_health);
        self.world.spawn((
            enemy,
            Position(position),
            Velocity::default(),
            Hitbox {
                radius: radius.max(0.0),
            },
            Health::new(health),
        ))
    }

    /// Point an enemy along `direction` at its scaled speed.
    pub fn set_enemy_heading(&mut self, enemy: Entity, direction: Vec3) -> bool {
        let Ok(base) = self.world.get::<&Enemy>(enemy).map(|e| e.base_speed) else {
            return false;
        };
        let speed = self.balance.calculate_enemy_speed(base);
        match self.world.get::<&mut Velocity>(enemy) {
            Ok(mut v) => {
                v.0 = direction.normalize_or(Vec3::ZERO) * speed;
                true
            }
            Err(_) => false,
        }
    }

    /// Move the player ship. Movement itself is driven from outside.
    pub fn set_player_motion(&mut self, position: Vec3, velocity: Vec3) {
        if let Ok(mut p) = self.world.get::<&mut Position>(self.player) {
            p.0 = position;
        }
        if let Ok(mut v) = self.world.get::<&mut Velocity>(self.player) {
            v.0 = velocity;
        }
    }

    /// An enemy lands an attack on the player. Returns damage taken.
    pub fn enemy_attack(&mut self, enemy: Entity) -> f32 {
        let Ok(base) = self.world.get::<&Enemy>(enemy).map(|e| e.base_damage) else {
            return 0.0;
        };
        let outgoing = self.status.aggregate_modifiers(enemy).damage;
        let amount = self.balance.calculate_enemy_damage(base) * outgoing;
        self.damage_player(amount)
    }

    /// Damage the player after its incoming-damage modifiers. A lethal hit
    /// counts as a death and respawns the player at full health.
    pub fn damage_player(&mut self, amount: f32) -> f32 {
        let taken = self.status.aggregate_modifiers(self.player).damage_taken;
        let dealt = match self.world.get::<&mut Health>(self.player) {
            Ok(mut h) => h.damage(amount * taken),
            Err(_) => 0.0,
        };
        if self.player_health().is_some_and(|h| h.is_dead()) {
            self.record_player_death();
        }
        dealt
    }

    pub fn record_player_death(&mut self) {
        self.balance.record_death();
        self.status.remove_entity(self.player);
        if let Ok(mut h) = self.world.get::<&mut Health>(self.player) {
            *h = Health::new(PLAYER_MAX_HEALTH);
        }
        log::debug!("player died at {:.1}s", self.elapsed);
    }

    /// Apply a status effect directly (environment hazards, scripted events).
    pub fn apply_status(&mut self, target: Entity, kind: StatusEffectKind) -> ApplyOutcome {
        self.status.apply(target, kind, &mut self.events)
    }

    /// Remove every dispellable effect from the player.
    pub fn cleanse_player(&mut self) -> usize {
        self.status
            .remove_all_dispellable(self.player, &mut self.events)
    }

    // ── Frame ──────────────────────────────────────────────────────────

    /// Advance the whole combat simulation by `dt` seconds.
    pub fn update(&mut self, dt: f32, input: &FrameInput) -> FrameReport {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        self.elapsed += dt as f64;
        let mut report = FrameReport::default();

        // Input resolution and timers
        self.tick_power_ups(dt);
        self.weapons.tick(dt, &mut self.events);
        self.refresh_weapon_stats();

        // Weapon fire
        let (position, carrier) = self.player_motion();
        let fire_input = FireInput {
            position,
            aim: input.aim,
            carrier_velocity: carrier,
            fire_held: input.fire_held,
            was_held: self.was_held,
        };
        self.was_held = input.fire_held;
        if self.weapons.active_kind().is_some() {
            report.fire = Some(self.weapons.try_fire(&fire_input, &mut self.events));
        }

        // Projectiles
        self.move_enemies(dt);
        let targets = self.live_targets();
        self.steer_homing(&targets, input.target);
        let mut bursts = self.weapons.update_projectiles(dt);

        // Collision and damage
        let mut hits = self.collide(&targets, &mut bursts);
        hits.extend(self.resolve_bursts(&targets, &bursts));
        self.apply_hits(hits, &mut report);
        self.account_finished_projectiles();

        // Status effects
        self.tick_status(dt, &mut report);

        // Synergies
        if self.ingredients_dirty {
            let ingredients = self.ingredients();
            self.synergy
                .check_for_synergies(&ingredients, &mut self.events);
            self.ingredients_dirty = false;
        }
        self.synergy.update(dt, &mut self.events);

        // Balance
        self.balance.update(dt);

        for entity in &report.kills {
            self.status.remove_entity(*entity);
            let _ = self.world.despawn(*entity);
        }
        report.events = self.events.dispatch();
        report
    }

    fn refresh_weapon_stats(&mut self) {
        let balance = &self.balance;
        let bonus = self.synergy.combined_bonus();
        let mods = self.status.aggregate_modifiers(self.player);
        self.weapons.refresh_stats(|def| {
            let mut out = balance.apply_balancing(def);
            out.damage = clamp_damage(out.damage * bonus.damage * mods.damage);
            out.fire_rate = (out.fire_rate * bonus.fire_rate * mods.attack_speed).max(MIN_FIRE_RATE);
            out.energy_cost = (out.energy_cost * bonus.energy_cost).max(0.0);
            out
        });
    }

    fn player_motion(&self) -> (Vec3, Vec3) {
        let position = self
            .world
            .get::<&Position>(self.player)
            .map(|p| p.0)
            .unwrap_or_default();
        let velocity = self
            .world
            .get::<&Velocity>(self.player)
            .map(|v| v.0)
            .unwrap_or_default();
        (position, velocity)
    }

    fn move_enemies(&mut self, dt: f32) {
        let status = &self.status;
        for (entity, (pos, vel, _)) in self
            .world
            .query_mut::<(&mut Position, &Velocity, &Enemy)>()
        {
            let speed = status.aggregate_modifiers(entity).movement_speed;
            pos.0 += vel.0 * (speed * dt);
        }
    }

    fn live_targets(&self) -> Vec<(Entity, Vec3, f32)> {
        let mut targets: Vec<(Entity, Vec3, f32)> = self
            .world
            .query::<(&Enemy, &Position, &Hitbox, &Health)>()
            .iter()
            .filter(|(_, (_, _, _, h))| !h.is_dead())
            .map(|(e, (_, p, hb, _))| (e, p.0, hb.radius))
            .collect();
        targets.sort_by_key(|(e, _, _)| *e);
        targets
    }

    fn steer_homing(&mut self, targets: &[(Entity, Vec3, f32)], aim_point: Option<Vec3>) {
        for p in self.weapons.projectiles_mut() {
            if !matches!(p.movement, MovementKind::Homing { .. }) {
                continue;
            }
            let here = p.position;
            p.homing_target = aim_point.or_else(|| {
                targets
                    .iter()
                    .min_by(|a, b| {
                        a.1.distance_squared(&here)
                            .total_cmp(&b.1.distance_squared(&here))
                    })
                    .map(|t| t.1)
            });
        }
    }

    fn collide(
        &mut self,
        targets: &[(Entity, Vec3, f32)],
        bursts: &mut Vec<AreaBurst>,
    ) -> Vec<HitRecord> {
        let mut hits = Vec::new();
        let status = &self.status;
        for p in self.weapons.projectiles_mut() {
            for &(entity, position, radius) in targets {
                if !p.active {
                    break;
                }
                if p.already_hit(entity) || !p.check_collision(position, radius) {
                    continue;
                }
                let info = p.calculate_damage_info(position);
                let taken = status.aggregate_modifiers(entity).damage_taken;
                hits.push(HitRecord {
                    weapon: p.weapon,
                    projectile: Some(p.id),
                    target: entity,
                    position,
                    damage: info.total * taken,
                    critical: info.critical,
                    status: info.status,
                });
                if let HitResolution::Terminated(terminal) = p.on_hit_target(position, Some(entity))
                {
                    bursts.extend(terminal);
                }
            }
        }
        hits
    }

    fn resolve_bursts(
        &mut self,
        targets: &[(Entity, Vec3, f32)],
        bursts: &[AreaBurst],
    ) -> Vec<HitRecord> {
        let mut hits = Vec::new();
        for burst in bursts {
            self.events.push(CombatEvent::AreaBurst {
                weapon: burst.weapon,
                center: burst.center,
                radius: burst.radius,
            });
            for &(entity, position, radius) in targets {
                if burst.exclude == Some(entity) {
                    continue;
                }
                let distance = (burst.center.distance(&position) - radius).max(0.0);
                let amount = splash_damage(burst.damage, burst.radius, distance);
                if amount <= 0.0 {
                    continue;
                }
                let taken = self.status.aggregate_modifiers(entity).damage_taken;
                hits.push(HitRecord {
                    weapon: burst.weapon,
                    projectile: None,
                    target: entity,
                    position,
                    damage: amount * taken,
                    critical: false,
                    status: None,
                });
            }
        }
        hits
    }

    fn apply_hits(&mut self, hits: Vec<HitRecord>, report: &mut FrameReport) {
        for hit in hits {
            let (dealt, killed) = match self.world.get::<&mut Health>(hit.target) {
                Ok(mut h) => {
                    if h.is_dead() {
                        continue;
                    }
                    let dealt = h.damage(hit.damage);
                    (dealt, h.is_dead())
                }
                Err(_) => continue,
            };

            report.hits += 1;
            report.damage_dealt += dealt;
            self.events.push(CombatEvent::ProjectileHit {
                weapon: hit.weapon,
                target: hit.target,
                position: hit.position,
                damage: dealt,
                critical: hit.critical,
            });
            match hit.projectile {
                Some(id) => *self.projectile_damage.entry(id).or_default() += dealt,
                None => self.balance.record_damage(dealt),
            }

            if killed {
                self.balance.record_kill();
                self.events.push(CombatEvent::TargetKilled {
                    target: hit.target,
                    weapon: Some(hit.weapon),
                });
                report.kills.push(hit.target);
            }
            self.gain_experience(hit.weapon, dealt, u32::from(killed));

            if killed {
                continue;
            }
            if let Some(on_hit) = hit.status {
                if self.rng.gen::<f32>() < on_hit.chance {
                    let app = StatusApplication::new(on_hit.kind)
                        .with_strength(on_hit.strength)
                        .from_source(hit.position);
                    self.status.apply_with(hit.target, app, &mut self.events);
                }
            }
        }
    }

    fn gain_experience(&mut self, kind: WeaponKind, damage: f32, kills: u32) {
        let xp = self.experience.entry(kind).or_default();
        if let Some(stage) = xp.record(damage, kills) {
            log::info!("{:?} evolved to {:?}", kind, stage);
            self.weapons
                .set_evolution_multiplier(kind, stage.damage_multiplier());
            self.events.push(CombatEvent::WeaponEvolved {
                weapon: kind,
                stage,
            });
        }
    }

    /// Report every projectile that finished this frame to the balancer.
    fn account_finished_projectiles(&mut self) {
        for p in self.weapons.prune_projectiles() {
            let damage = self.projectile_damage.remove(&p.id).unwrap_or(0.0);
            self.balance.record_weapon_usage(p.weapon, p.ever_hit, damage);
        }
    }

    fn tick_status(&mut self, dt: f32, report: &mut FrameReport) {
        let positions: Vec<(Entity, Vec3)> = self
            .live_targets()
            .into_iter()
            .map(|(e, p, _)| (e, p))
            .collect();
        let ticks = self.status.update(dt, &positions, &mut self.events);

        let mut player_died = false;
        for tick in ticks {
            let Ok(mut h) = self.world.get::<&mut Health>(tick.target) else {
                continue;
            };
            if h.is_dead() {
                continue;
            }
            h.heal(tick.heal);
            let dealt = h.damage(tick.damage);
            let killed = h.is_dead();
            drop(h);

            if tick.target == self.player {
                player_died |= killed;
                continue;
            }
            self.balance.record_damage(dealt);
            report.damage_dealt += dealt;
            if killed {
                self.balance.record_kill();
                self.events.push(CombatEvent::TargetKilled {
                    target: tick.target,
                    weapon: None,
                });
                report.kills.push(tick.target);
            }
        }
        if player_died {
            self.record_player_death();
        }
    }

    // ── Progression ────────────────────────────────────────────────────

    /// Permanent progression: difficulty, upgrades, evolution and discoveries.
    pub fn progression(&self) -> ProgressionSnapshot {
        ProgressionSnapshot {
            difficulty: self.balance.difficulty(),
            game_level: self.balance.level(),
            upgrade_levels: self.upgrades.clone(),
            experience: self.experience.clone(),
            discovered: self.synergy.discovered().clone(),
        }
    }

    pub fn apply_progression(&mut self, snapshot: &ProgressionSnapshot) {
        self.balance.set_difficulty(snapshot.difficulty);
        self.balance.set_level(snapshot.game_level);
        for (kind, level) in &snapshot.upgrade_levels {
            self.set_upgrade_level(*kind, *level);
        }
        self.experience = snapshot.experience.clone();
        for (kind, xp) in &self.experience {
            self.weapons
                .set_evolution_multiplier(*kind, xp.damage_multiplier());
        }
        for kind in &snapshot.discovered {
            self.synergy.mark_discovered(*kind);
        }
    }

    /// Swap in a restored balancing state.
    pub fn restore_balance(&mut self, state: BalanceState) {
        self.balance = BalancingEngine::from_state(self.config.balance.tuning, state);
    }

    /// Save progression and balance to a writer
    pub fn save<W: std::io::Write>(&self, writer: W) -> Result<(), crate::persistence::SaveError> {
        crate::persistence::save_session(writer, &self.progression(), self.balance.state())
    }

    /// Load progression and balance from a reader
    pub fn load<R: std::io::Read>(&mut self, reader: R) -> Result<(), crate::persistence::SaveError> {
        let loaded = crate::persistence::load_session(reader)?;
        self.restore_balance(loaded.balance);
        self.apply_progression(&loaded.progression);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidfire_logic::synergy::SynergyKind;

    // ── Helpers ──

    fn engine() -> CombatEngine {
        CombatEngine::new(CombatConfig::default()).unwrap()
    }

    fn fire() -> FrameInput {
        FrameInput {
            fire_held: true,
            aim: Vec3::FORWARD,
            target: None,
        }
    }

    fn idle() -> FrameInput {
        FrameInput {
            aim: Vec3::FORWARD,
            ..FrameInput::default()
        }
    }

    // ── Tests ──

    #[test]
    fn test_engine_creation() {
        let engine = engine();
        assert_eq!(engine.enemy_count(), 0);
        assert_eq!(engine.elapsed(), 0.0);
        assert_eq!(engine.player_health().unwrap().current, PLAYER_MAX_HEALTH);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = CombatConfig::default();
        config.energy.max = 0.0;
        assert!(CombatEngine::new(config).is_err());
    }

    #[test]
    fn test_shot_kills_enemy_ahead() {
        let mut engine = engine();
        engine.equip_weapon(WeaponKind::Standard);
        let enemy = engine.spawn_enemy(Vec3::new(0.0, 0.0, 30.0), 1.0, 2.0);

        let report = engine.update(1.0 / 60.0, &fire());
        assert!(report.fire.unwrap().fired());
        let mut killed = report.kills.contains(&enemy);
        for _ in 0..60 {
            if killed {
                break;
            }
            killed = engine.update(1.0 / 60.0, &idle()).kills.contains(&enemy);
        }
        assert!(killed);
        assert_eq!(engine.enemy_count(), 0);
        assert_eq!(engine.experience(WeaponKind::Standard).kills, 1);
    }

    #[test]
    fn test_weapons_plus_power_up_trigger_synergy() {
        let mut engine = engine();
        engine.equip_weapon(WeaponKind::Standard);
        engine.grant_power_up(PowerUpKind::RapidFire);
        let report = engine.update(0.01, &idle());
        assert!(engine.synergy().is_active(SynergyKind::BulletHell));
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, CombatEvent::SynergyActivated { kind: SynergyKind::BulletHell, .. })));
    }

    #[test]
    fn test_power_up_expiry_reported() {
        let mut engine = engine();
        engine.grant_power_up_for(PowerUpKind::Magnet, 0.5);
        engine.update(0.25, &idle());
        let report = engine.update(0.3, &idle());
        assert!(report
            .events
            .iter()
            .any(|e| matches!(e, CombatEvent::PowerUpExpired { kind: PowerUpKind::Magnet })));
        assert_eq!(engine.active_power_ups().count(), 0);
    }

    #[test]
    fn test_shield_halves_incoming_damage() {
        let mut engine = engine();
        engine.grant_power_up(PowerUpKind::Shield);
        assert_eq!(engine.damage_player(20.0), 10.0);
    }

    #[test]
    fn test_lethal_damage_counts_death_and_respawns() {
        let mut engine = engine();
        engine.damage_player(500.0);
        assert_eq!(engine.player_health().unwrap().current, PLAYER_MAX_HEALTH);
        assert_eq!(engine.balance().state().interval.deaths, 1);
    }

    #[test]
    fn test_upgrade_level_persists_across_equip() {
        let mut engine = engine();
        engine.set_upgrade_level(WeaponKind::Laser, 9);
        assert_eq!(engine.upgrade_level(WeaponKind::Laser), 5);
        engine.equip_weapon(WeaponKind::Laser);
        assert_eq!(engine.weapons().runtime(WeaponKind::Laser).unwrap().level, 5);
    }
}
