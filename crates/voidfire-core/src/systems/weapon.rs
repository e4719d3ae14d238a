//! Weapon controller - equipped weapons, shared energy, reload and charge state machines
//!
//! The controller owns the runtime state of every equipped weapon and the
//! list of projectiles they spawned. Timers (reload, charge, burst spacing,
//! pattern launch delays) are compared against the controller's own clock,
//! which only advances in [`WeaponController::tick`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use voidfire_logic::catalog::WeaponCatalog;
use voidfire_logic::constants::weapon::MAX_EQUIPPED;
use voidfire_logic::math::Vec3;
use voidfire_logic::patterns::expand_pattern;
use voidfire_logic::upgrades::{apply_level, clamp_level, level_scaling};
use voidfire_logic::weapons::{FireDiscipline, WeaponDefinition, WeaponKind};

use super::events::{CombatEvent, EventBus};
use super::projectile::{AreaBurst, LaunchParams, Projectile};
use crate::config::{streams, CombatConfig};

/// Per-frame firing input.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FireInput {
    pub position: Vec3,
    pub aim: Vec3,
    pub carrier_velocity: Vec3,
    pub fire_held: bool,
    /// Fire button state on the previous frame.
    pub was_held: bool,
}

impl FireInput {
    pub fn pressed(&self) -> bool {
        self.fire_held && !self.was_held
    }
}

/// Why a fire attempt produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireBlock {
    NoWeapon,
    Reloading,
    Cooldown,
    NoEnergy,
    NoAmmo,
    BurstInProgress,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireOutcome {
    /// Fire control not engaged.
    Idle,
    Fired { projectiles: usize, charge_ratio: f32 },
    Charging { ratio: f32 },
    /// Released below the minimum ratio; nothing spent.
    ChargeCancelled { ratio: f32 },
    Blocked(FireBlock),
}

impl FireOutcome {
    pub fn fired(&self) -> bool {
        matches!(self, FireOutcome::Fired { .. })
    }

    pub fn projectile_count(&self) -> usize {
        match self {
            FireOutcome::Fired { projectiles, .. } => *projectiles,
            _ => 0,
        }
    }
}

/// Runtime state of one equipped weapon.
#[derive(Debug, Clone)]
pub struct WeaponRuntime {
    pub kind: WeaponKind,
    pub level: u8,
    pub ammo: i32,
    pub reload_until: Option<f64>,
    pub last_shot_at: Option<f64>,
    pub charge_started_at: Option<f64>,
    pub burst_remaining: u8,
    pub next_burst_at: f64,
    pub evolution_multiplier: f32,
    effective: WeaponDefinition,
}

impl WeaponRuntime {
    fn new(def: &WeaponDefinition, level: u8) -> Self {
        let level = clamp_level(level);
        Self {
            kind: def.kind,
            level,
            ammo: def.ammo_capacity,
            reload_until: None,
            last_shot_at: None,
            charge_started_at: None,
            burst_remaining: 0,
            next_burst_at: 0.0,
            evolution_multiplier: 1.0,
            effective: apply_level(def, level),
        }
    }

    pub fn is_reloading(&self) -> bool {
        self.reload_until.is_some()
    }

    pub fn is_charging(&self) -> bool {
        self.charge_started_at.is_some()
    }

    /// Stats after level, balancing and bonus adjustments.
    pub fn effective(&self) -> &WeaponDefinition {
        &self.effective
    }
}

/// A pattern projectile waiting for its launch delay.
#[derive(Debug, Clone)]
struct PendingLaunch {
    launch_at: f64,
    projectile: Projectile,
}

pub struct WeaponController {
    catalog: WeaponCatalog,
    equipped: Vec<WeaponRuntime>,
    active: Option<usize>,
    energy: f32,
    energy_max: f32,
    energy_regen: f32,
    max_deviation: f32,
    world_bounds: f32,
    clock: f64,
    projectiles: Vec<Projectile>,
    pending: Vec<PendingLaunch>,
    burst_input: Option<FireInput>,
    next_id: u32,
    rng: StdRng,
}

impl WeaponController {
    pub fn new(catalog: WeaponCatalog, config: &CombatConfig) -> Self {
        Self {
            catalog,
            equipped: Vec::new(),
            active: None,
            energy: config.energy.max,
            energy_max: config.energy.max,
            energy_regen: config.energy.regen_per_second,
            max_deviation: config.max_deviation,
            world_bounds: config.world_bounds,
            clock: 0.0,
            projectiles: Vec::new(),
            pending: Vec::new(),
            burst_input: None,
            next_id: 0,
            rng: StdRng::seed_from_u64(config.stream_seed(streams::WEAPONS)),
        }
    }

    // ── Equipment ──────────────────────────────────────────────────────

    /// Equip a weapon at `level`. The first equipped weapon becomes active.
    pub fn equip(&mut self, kind: WeaponKind, level: u8) -> bool {
        if self.index_of(kind).is_some() || self.equipped.len() >= MAX_EQUIPPED {
            return false;
        }
        self.equipped
            .push(WeaponRuntime::new(self.catalog.get(kind), level));
        if self.active.is_none() {
            self.active = Some(self.equipped.len() - 1);
        }
        log::debug!("equipped {:?} at level {}", kind, clamp_level(level));
        true
    }

    /// Unequip and destroy the weapon's runtime state.
    pub fn unequip(&mut self, kind: WeaponKind) -> bool {
        let Some(idx) = self.index_of(kind) else {
            return false;
        };
        let active_kind = self.active_kind();
        self.equipped.remove(idx);
        self.active = match active_kind {
            Some(k) if k != kind => self.index_of(k),
            _ if self.equipped.is_empty() => None,
            _ => Some(0),
        };
        self.burst_input = None;
        log::debug!("unequipped {:?}", kind);
        true
    }

    /// Make an equipped weapon active. Cancels a charge for free; refused
    /// while a burst is still firing.
    pub fn switch_to(&mut self, kind: WeaponKind) -> bool {
        let Some(target) = self.index_of(kind) else {
            return false;
        };
        if let Some(idx) = self.active {
            if idx == target {
                return true;
            }
            let current = &mut self.equipped[idx];
            if current.burst_remaining > 0 {
                return false;
            }
            if current.charge_started_at.take().is_some() {
                log::debug!("{:?} charge dropped by weapon switch", current.kind);
            }
        }
        self.active = Some(target);
        log::debug!("switched to {:?}", kind);
        true
    }

    pub fn active_kind(&self) -> Option<WeaponKind> {
        self.active.map(|i| self.equipped[i].kind)
    }

    pub fn equipped_kinds(&self) -> Vec<WeaponKind> {
        self.equipped.iter().map(|w| w.kind).collect()
    }

    pub fn runtime(&self, kind: WeaponKind) -> Option<&WeaponRuntime> {
        self.index_of(kind).map(|i| &self.equipped[i])
    }

    fn index_of(&self, kind: WeaponKind) -> Option<usize> {
        self.equipped.iter().position(|w| w.kind == kind)
    }

    pub fn set_level(&mut self, kind: WeaponKind, level: u8) -> bool {
        let Some(idx) = self.index_of(kind) else {
            return false;
        };
        let rt = &mut self.equipped[idx];
        rt.level = clamp_level(level);
        rt.effective = apply_level(self.catalog.get(kind), rt.level);
        true
    }

    pub fn set_evolution_multiplier(&mut self, kind: WeaponKind, multiplier: f32) {
        if let Some(idx) = self.index_of(kind) {
            self.equipped[idx].evolution_multiplier = multiplier.max(0.0);
        }
    }

    /// Recompute every equipped weapon's effective stats from the leveled
    /// catalog definition.
    pub fn refresh_stats<F>(&mut self, adjust: F)
    where
        F: Fn(&WeaponDefinition) -> WeaponDefinition,
    {
        for rt in self.equipped.iter_mut() {
            let leveled = apply_level(self.catalog.get(rt.kind), rt.level);
            rt.effective = adjust(&leveled);
            if !rt.effective.has_unlimited_ammo() {
                rt.ammo = rt.ammo.min(rt.effective.ammo_capacity);
            }
        }
    }

    // ── Energy / clock ─────────────────────────────────────────────────

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn energy_max(&self) -> f32 {
        self.energy_max
    }

    pub fn refill_energy(&mut self) {
        self.energy = self.energy_max;
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Advance timers: energy regen, reload completion, burst continuation,
    /// delayed pattern launches.
    pub fn tick(&mut self, dt: f32, bus: &mut EventBus) {
        let dt = dt.max(0.0);
        self.clock += dt as f64;
        self.energy = (self.energy + self.energy_regen * dt).min(self.energy_max);

        for rt in self.equipped.iter_mut() {
            if let Some(until) = rt.reload_until {
                if self.clock >= until {
                    rt.reload_until = None;
                    rt.ammo = rt.effective.ammo_capacity;
                    log::debug!("{:?} reloaded ({} rounds)", rt.kind, rt.ammo);
                    bus.push(CombatEvent::ReloadFinished { weapon: rt.kind });
                }
            }
        }

        self.continue_burst(bus);

        let clock = self.clock;
        let (ready, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|p| p.launch_at <= clock);
        self.pending = waiting;
        self.projectiles
            .extend(ready.into_iter().map(|p| p.projectile));
    }

    fn continue_burst(&mut self, bus: &mut EventBus) {
        let Some(idx) = self.active else {
            return;
        };
        let FireDiscipline::Burst { interval, .. } = self.equipped[idx].effective.discipline
        else {
            return;
        };
        while self.equipped[idx].burst_remaining > 0 && self.clock >= self.equipped[idx].next_burst_at
        {
            let Some(input) = self.burst_input else {
                self.equipped[idx].burst_remaining = 0;
                break;
            };
            let def = self.equipped[idx].effective.clone();
            match self.fire_event(idx, &def, 1.0, &input, bus, true) {
                FireOutcome::Fired { .. } => {
                    let rt = &mut self.equipped[idx];
                    rt.burst_remaining = rt.burst_remaining.saturating_sub(1);
                    rt.next_burst_at += interval as f64;
                    if rt.is_reloading() {
                        rt.burst_remaining = 0;
                    }
                }
                _ => {
                    self.equipped[idx].burst_remaining = 0;
                }
            }
        }
    }

    // ── Firing ─────────────────────────────────────────────────────────

    /// Attempt to fire the active weapon. Never fails loudly: a blocked
    /// attempt is reported in the outcome.
    pub fn try_fire(&mut self, input: &FireInput, bus: &mut EventBus) -> FireOutcome {
        let Some(idx) = self.active else {
            return FireOutcome::Blocked(FireBlock::NoWeapon);
        };
        let def = self.equipped[idx].effective.clone();

        match def.discipline {
            FireDiscipline::Instant => {
                if input.pressed() {
                    self.fire_event(idx, &def, 1.0, input, bus, false)
                } else {
                    FireOutcome::Idle
                }
            }
            FireDiscipline::FullAuto => {
                if input.fire_held {
                    self.fire_event(idx, &def, 1.0, input, bus, false)
                } else {
                    FireOutcome::Idle
                }
            }
            FireDiscipline::Burst { shots, interval } => {
                if self.equipped[idx].burst_remaining > 0 {
                    return if input.pressed() {
                        FireOutcome::Blocked(FireBlock::BurstInProgress)
                    } else {
                        FireOutcome::Idle
                    };
                }
                if !input.pressed() {
                    return FireOutcome::Idle;
                }
                let outcome = self.fire_event(idx, &def, 1.0, input, bus, false);
                if outcome.fired() {
                    let clock = self.clock;
                    let rt = &mut self.equipped[idx];
                    if !rt.is_reloading() {
                        rt.burst_remaining = shots.saturating_sub(1);
                        rt.next_burst_at = clock + interval as f64;
                        self.burst_input = Some(*input);
                    }
                }
                outcome
            }
            FireDiscipline::Charge {
                charge_time,
                min_ratio,
            } => {
                let clock = self.clock;
                match (input.fire_held, self.equipped[idx].charge_started_at) {
                    (true, None) => {
                        if let Some(block) = self.check_gates(idx, &def, false) {
                            return FireOutcome::Blocked(block);
                        }
                        self.equipped[idx].charge_started_at = Some(clock);
                        FireOutcome::Charging { ratio: 0.0 }
                    }
                    (true, Some(start)) => FireOutcome::Charging {
                        ratio: charge_ratio(clock, start, charge_time),
                    },
                    (false, Some(start)) => {
                        self.equipped[idx].charge_started_at = None;
                        let ratio = charge_ratio(clock, start, charge_time);
                        if ratio < min_ratio {
                            log::debug!(
                                "{:?} charge cancelled at {:.2} (min {:.2})",
                                def.kind,
                                ratio,
                                min_ratio
                            );
                            bus.push(CombatEvent::ChargeCancelled {
                                weapon: def.kind,
                                ratio,
                            });
                            return FireOutcome::ChargeCancelled { ratio };
                        }
                        let ratio = ratio.clamp(min_ratio, 1.0);
                        self.fire_event(idx, &def, ratio, input, bus, false)
                    }
                    (false, None) => FireOutcome::Idle,
                }
            }
        }
    }

    fn check_gates(
        &self,
        idx: usize,
        def: &WeaponDefinition,
        burst_continuation: bool,
    ) -> Option<FireBlock> {
        let rt = &self.equipped[idx];
        if rt.is_reloading() {
            return Some(FireBlock::Reloading);
        }
        if !burst_continuation {
            if let Some(last) = rt.last_shot_at {
                if self.clock - last < def.shot_interval() as f64 {
                    return Some(FireBlock::Cooldown);
                }
            }
        }
        if self.energy < def.energy_cost {
            return Some(FireBlock::NoEnergy);
        }
        if !def.has_unlimited_ammo() && rt.ammo <= 0 {
            return Some(FireBlock::NoAmmo);
        }
        None
    }

    fn fire_event(
        &mut self,
        idx: usize,
        def: &WeaponDefinition,
        charge_ratio: f32,
        input: &FireInput,
        bus: &mut EventBus,
        burst_continuation: bool,
    ) -> FireOutcome {
        if let Some(block) = self.check_gates(idx, def, burst_continuation) {
            if block == FireBlock::NoAmmo {
                self.start_reload(idx, bus);
            }
            return FireOutcome::Blocked(block);
        }

        let (level, evolution) = {
            let rt = &self.equipped[idx];
            (level_scaling(rt.level).damage, rt.evolution_multiplier)
        };
        let shots = expand_pattern(&def.pattern, input.aim, def.secondary_damage_factor);
        let count = shots.len();

        for shot in shots {
            let direction = self.jitter(shot.direction, def.accuracy);
            let (damage, critical) = self.roll_damage(def);
            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1);
            let projectile = Projectile::new(
                id,
                def,
                &LaunchParams {
                    position: input.position,
                    direction,
                    carrier_velocity: input.carrier_velocity,
                    damage: damage * shot.damage_factor,
                    critical,
                    charge_ratio,
                    level_multiplier: level,
                    evolution_multiplier: evolution,
                    world_bounds: self.world_bounds,
                },
            );
            if shot.delay > 0.0 {
                self.pending.push(PendingLaunch {
                    launch_at: self.clock + shot.delay as f64,
                    projectile,
                });
            } else {
                self.projectiles.push(projectile);
            }
        }

        self.energy -= def.energy_cost;
        let clock = self.clock;
        let rt = &mut self.equipped[idx];
        if !def.has_unlimited_ammo() {
            rt.ammo -= 1;
        }
        if !burst_continuation {
            rt.last_shot_at = Some(clock);
        }
        let empty = !def.has_unlimited_ammo() && rt.ammo <= 0;

        bus.push(CombatEvent::WeaponFired {
            weapon: def.kind,
            position: input.position,
            projectiles: count,
            charge_ratio,
        });
        log::trace!("{:?} fired {} projectile(s)", def.kind, count);

        if empty {
            self.start_reload(idx, bus);
        }
        FireOutcome::Fired {
            projectiles: count,
            charge_ratio,
        }
    }

    fn start_reload(&mut self, idx: usize, bus: &mut EventBus) {
        let clock = self.clock;
        let rt = &mut self.equipped[idx];
        if rt.is_reloading() || rt.effective.has_unlimited_ammo() {
            return;
        }
        rt.reload_until = Some(clock + rt.effective.reload_time as f64);
        rt.burst_remaining = 0;
        rt.charge_started_at = None;
        log::debug!("{:?} reloading for {:.2}s", rt.kind, rt.effective.reload_time);
        bus.push(CombatEvent::ReloadStarted { weapon: rt.kind });
    }

    /// Manual reload of the active weapon. No-op when full or already reloading.
    pub fn reload(&mut self, bus: &mut EventBus) -> bool {
        let Some(idx) = self.active else {
            return false;
        };
        let rt = &self.equipped[idx];
        if rt.is_reloading()
            || rt.effective.has_unlimited_ammo()
            || rt.ammo >= rt.effective.ammo_capacity
        {
            return false;
        }
        self.start_reload(idx, bus);
        true
    }

    fn jitter(&mut self, direction: Vec3, accuracy: f32) -> Vec3 {
        let bound = (1.0 - accuracy).clamp(0.0, 1.0) * self.max_deviation;
        if bound <= 0.0 {
            return direction;
        }
        let offset = random_in_unit_sphere(&mut self.rng) * bound;
        (direction + offset).normalize_or(direction)
    }

    fn roll_damage(&mut self, def: &WeaponDefinition) -> (f32, bool) {
        let critical = def.critical_chance > 0.0 && self.rng.gen::<f32>() < def.critical_chance;
        let variance = if def.damage_variance > 0.0 {
            self.rng
                .gen_range(-def.damage_variance..=def.damage_variance)
        } else {
            0.0
        };
        let crit = if critical { def.critical_multiplier } else { 1.0 };
        (def.damage * (1.0 + variance) * crit, critical)
    }

    // ── Projectiles ────────────────────────────────────────────────────

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn projectiles_mut(&mut self) -> &mut [Projectile] {
        &mut self.projectiles
    }

    /// Projectiles still waiting on a pattern delay.
    pub fn pending_launches(&self) -> usize {
        self.pending.len()
    }

    /// Move every projectile; returns bursts from detonations.
    pub fn update_projectiles(&mut self, dt: f32) -> Vec<AreaBurst> {
        let mut bursts = Vec::new();
        for p in self.projectiles.iter_mut() {
            bursts.extend(p.update(dt, &mut self.rng));
        }
        bursts
    }

    /// Remove inactive projectiles and hand them back for accounting.
    pub fn prune_projectiles(&mut self) -> Vec<Projectile> {
        let (alive, dead): (Vec<_>, Vec<_>) = std::mem::take(&mut self.projectiles)
            .into_iter()
            .partition(|p| p.active);
        self.projectiles = alive;
        dead
    }
}

fn charge_ratio(clock: f64, start: f64, charge_time: f32) -> f32 {
    if charge_time <= 0.0 {
        return 1.0;
    }
    (((clock - start) as f32) / charge_time).clamp(0.0, 1.0)
}

fn random_in_unit_sphere<R: Rng>(rng: &mut R) -> Vec3 {
    loop {
        let v = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if v.length_squared() <= 1.0 {
            return v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidfire_logic::math::angle_between;

    fn controller() -> WeaponController {
        WeaponController::new(
            WeaponCatalog::builtin().unwrap(),
            &CombatConfig::default().with_seed(42),
        )
    }

    fn held() -> FireInput {
        FireInput {
            aim: Vec3::FORWARD,
            fire_held: true,
            ..Default::default()
        }
    }

    fn press() -> FireInput {
        held()
    }

    fn release() -> FireInput {
        FireInput {
            aim: Vec3::FORWARD,
            fire_held: false,
            was_held: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_weapon_blocks() {
        let mut c = controller();
        let mut bus = EventBus::new();
        assert_eq!(
            c.try_fire(&press(), &mut bus),
            FireOutcome::Blocked(FireBlock::NoWeapon)
        );
    }

    #[test]
    fn test_full_auto_rate_limited() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Standard, 1);
        let mut fired_at = Vec::new();
        for _ in 0..120 {
            if c.try_fire(&held(), &mut bus).fired() {
                fired_at.push(c.clock());
            }
            c.tick(1.0 / 60.0, &mut bus);
        }
        assert!(fired_at.len() >= 5);
        let interval = WeaponKind::Standard.spec().shot_interval() as f64;
        for w in fired_at.windows(2) {
            assert!(w[1] - w[0] >= interval);
        }
    }

    #[test]
    fn test_instant_needs_press_edge() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Nova, 1);
        assert!(c.try_fire(&press(), &mut bus).fired());
        c.tick(5.0, &mut bus);
        let hold = FireInput {
            was_held: true,
            ..held()
        };
        assert_eq!(c.try_fire(&hold, &mut bus), FireOutcome::Idle);
    }

    #[test]
    fn test_ring_spawns_whole_pattern() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Nova, 1);
        let out = c.try_fire(&press(), &mut bus);
        assert_eq!(out.projectile_count(), 12);
        assert_eq!(c.projectiles().len(), 12);
    }

    #[test]
    fn test_spiral_delays_launches() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Vortex, 1);
        c.try_fire(&press(), &mut bus);
        assert_eq!(c.projectiles().len(), 1);
        assert_eq!(c.pending_launches(), 15);
        for _ in 0..60 {
            c.tick(0.01, &mut bus);
        }
        assert_eq!(c.pending_launches(), 0);
        assert_eq!(c.projectiles().len(), 16);
    }

    #[test]
    fn test_energy_and_ammo_deducted_then_reload() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Missile, 1);
        let mut fired = 0;
        for _ in 0..8 {
            assert!(c.try_fire(&press(), &mut bus).fired());
            fired += 1;
            c.tick(1.0, &mut bus);
        }
        assert_eq!(fired, 8);
        let rt = c.runtime(WeaponKind::Missile).unwrap();
        assert!(rt.is_reloading());
        assert_eq!(
            c.try_fire(&press(), &mut bus),
            FireOutcome::Blocked(FireBlock::Reloading)
        );
        c.tick(3.0, &mut bus);
        assert_eq!(c.runtime(WeaponKind::Missile).unwrap().ammo, 8);
        let events = bus.dispatch();
        assert!(events
            .iter()
            .any(|e| matches!(e, CombatEvent::ReloadFinished { .. })));
    }

    #[test]
    fn test_insufficient_energy_is_silent() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Railgun, 1);
        c.energy = 10.0;
        assert_eq!(
            c.try_fire(&press(), &mut bus),
            FireOutcome::Blocked(FireBlock::NoEnergy)
        );
        c.refill_energy();
        assert!(matches!(
            c.try_fire(&press(), &mut bus),
            FireOutcome::Charging { .. }
        ));
        c.tick(2.0, &mut bus);
        c.energy = 10.0;
        let out = c.try_fire(&release(), &mut bus);
        assert_eq!(out, FireOutcome::Blocked(FireBlock::NoEnergy));
        assert_eq!(c.runtime(WeaponKind::Railgun).unwrap().ammo, 5);
    }

    #[test]
    fn test_burst_fires_all_shots() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::PulseRifle, 1);
        assert!(c.try_fire(&press(), &mut bus).fired());
        assert_eq!(
            c.try_fire(&press(), &mut bus),
            FireOutcome::Blocked(FireBlock::BurstInProgress)
        );
        for _ in 0..20 {
            c.tick(0.01, &mut bus);
        }
        assert_eq!(c.projectiles().len(), 3);
        assert_eq!(c.runtime(WeaponKind::PulseRifle).unwrap().ammo, 27);
    }

    #[test]
    fn test_burst_blocks_switch() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::PulseRifle, 1);
        c.equip(WeaponKind::Standard, 1);
        c.try_fire(&press(), &mut bus);
        assert!(!c.switch_to(WeaponKind::Standard));
        c.tick(0.5, &mut bus);
        assert!(c.switch_to(WeaponKind::Standard));
    }

    #[test]
    fn test_charge_release_scales_ratio() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Plasma, 1);
        assert!(matches!(
            c.try_fire(&press(), &mut bus),
            FireOutcome::Charging { .. }
        ));
        c.tick(0.6, &mut bus);
        let out = c.try_fire(&release(), &mut bus);
        match out {
            FireOutcome::Fired { charge_ratio, .. } => assert!((charge_ratio - 0.5).abs() < 1e-3),
            other => panic!("expected fire, got {:?}", other),
        }
        assert!((c.projectiles()[0].charge_ratio - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_switch_cancels_charge_for_free() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Railgun, 1);
        c.equip(WeaponKind::Standard, 1);
        c.try_fire(&press(), &mut bus);
        c.tick(1.0, &mut bus);
        let energy = c.energy();
        assert!(c.switch_to(WeaponKind::Standard));
        let rt = c.runtime(WeaponKind::Railgun).unwrap();
        assert!(!rt.is_charging());
        assert_eq!(rt.ammo, 5);
        assert_eq!(c.energy(), energy);
    }

    #[test]
    fn test_perfect_accuracy_has_no_jitter() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Nova, 1);
        c.try_fire(&press(), &mut bus);
        let first = &c.projectiles()[0];
        assert!(angle_between(&first.beam_end, &Vec3::FORWARD) < 1e-4);
    }

    #[test]
    fn test_jitter_bounded_by_accuracy() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Cryo, 1);
        let bound = (1.0 - 0.9f32) * CombatConfig::default().max_deviation;
        for _ in 0..50 {
            c.try_fire(&held(), &mut bus);
            c.tick(0.25, &mut bus);
        }
        for p in c.projectiles() {
            let dir = (p.beam_end - p.origin).normalize();
            assert!(angle_between(&dir, &Vec3::FORWARD) <= bound.atan() + 1e-3);
        }
    }

    #[test]
    fn test_unequip_destroys_state() {
        let mut c = controller();
        c.equip(WeaponKind::Missile, 3);
        c.equip(WeaponKind::Standard, 1);
        assert!(c.unequip(WeaponKind::Missile));
        assert!(c.runtime(WeaponKind::Missile).is_none());
        assert_eq!(c.active_kind(), Some(WeaponKind::Standard));
        assert!(c.unequip(WeaponKind::Standard));
        assert_eq!(c.active_kind(), None);
    }

    #[test]
    fn test_equip_limits() {
        let mut c = controller();
        for kind in WeaponKind::ALL.iter().take(MAX_EQUIPPED) {
            assert!(c.equip(*kind, 1));
        }
        assert!(!c.equip(WeaponKind::Nanite, 1));
        assert!(!c.equip(WeaponKind::Standard, 1));
    }

    #[test]
    fn test_energy_regenerates_to_cap() {
        let mut c = controller();
        let mut bus = EventBus::new();
        c.equip(WeaponKind::Nova, 1);
        c.try_fire(&press(), &mut bus);
        assert!(c.energy() < c.energy_max());
        c.tick(10.0, &mut bus);
        assert_eq!(c.energy(), c.energy_max());
    }
}
