//! Status effect manager - per-entity active effects, stacking, ticks and cross-entity spread
//!
//! Effects are keyed by target entity. A `BTreeMap` keeps iteration order
//! stable so seeded runs replay identically.

use std::collections::{BTreeMap, BTreeSet};

use hecs::Entity;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use voidfire_logic::catalog::StatusCatalog;
use voidfire_logic::constants::status::MAX_INDEPENDENT_INSTANCES;
use voidfire_logic::math::Vec3;
use voidfire_logic::status::{
    SpecialBehavior, StackingRule, StatModifiers, StatusEffectDefinition, StatusEffectKind,
    StatusTuning,
};

use super::events::{CombatEvent, EventBus};

/// One active effect on one target.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffectInstance {
    pub kind: StatusEffectKind,
    pub remaining: f32,
    pub duration: f32,
    /// Magnitude per stack.
    pub strength: f32,
    pub stacks: u8,
    pub source: Vec3,
    /// 0 for direct applications; +1 for every chain or spread hop.
    pub generation: u8,
}

impl StatusEffectInstance {
    /// Strength × stacks.
    pub fn effective_strength(&self) -> f32 {
        self.strength * self.stacks as f32
    }
}

/// Parameters for a single application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusApplication {
    pub kind: StatusEffectKind,
    pub strength: f32,
    /// `None` uses the kind's base duration.
    pub duration: Option<f32>,
    pub source: Vec3,
    pub generation: u8,
}

impl StatusApplication {
    pub fn new(kind: StatusEffectKind) -> Self {
        Self {
            kind,
            strength: 1.0,
            duration: None,
            source: Vec3::ZERO,
            generation: 0,
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = Some(duration);
        self
    }

    pub fn from_source(mut self, source: Vec3) -> Self {
        self.source = source;
        self
    }
}

/// How an application resolved against the target's existing effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Added,
    Refreshed,
    Extended,
    Stacked(u8),
    Replaced,
}

/// Damage or healing produced by one effect during one update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusTick {
    pub target: Entity,
    pub kind: StatusEffectKind,
    pub damage: f32,
    pub heal: f32,
}

pub struct StatusEffectManager {
    catalog: StatusCatalog,
    tuning: StatusTuning,
    effects: BTreeMap<Entity, Vec<StatusEffectInstance>>,
    rng: StdRng,
}

impl StatusEffectManager {
    pub fn new(catalog: StatusCatalog, tuning: StatusTuning, seed: u64) -> Self {
        Self {
            catalog,
            tuning,
            effects: BTreeMap::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn definition(&self, kind: StatusEffectKind) -> &StatusEffectDefinition {
        self.catalog.get(kind)
    }

    /// Apply an effect with default strength and duration.
    pub fn apply(
        &mut self,
        target: Entity,
        kind: StatusEffectKind,
        bus: &mut EventBus,
    ) -> ApplyOutcome {
        self.apply_with(target, StatusApplication::new(kind), bus)
    }

    pub fn apply_with(
        &mut self,
        target: Entity,
        application: StatusApplication,
        bus: &mut EventBus,
    ) -> ApplyOutcome {
        let def = self.catalog.get(application.kind);
        let duration = application
            .duration
            .unwrap_or(def.base_duration)
            .max(0.0);
        let strength = application.strength.max(0.0);
        let max_stacks = def.max_stacks.max(1);
        let fresh = StatusEffectInstance {
            kind: application.kind,
            remaining: duration,
            duration,
            strength,
            stacks: 1,
            source: application.source,
            generation: application.generation,
        };

        let list = self.effects.entry(target).or_default();
        let existing = list.iter().position(|e| e.kind == application.kind);

        let outcome = match (existing, def.stacking) {
            (None, _) => {
                list.push(fresh);
                ApplyOutcome::Added
            }
            (Some(i), StackingRule::Refresh) => {
                let e = &mut list[i];
                e.remaining = duration;
                e.duration = duration;
                ApplyOutcome::Refreshed
            }
            (Some(i), StackingRule::ExtendDuration) => {
                let e = &mut list[i];
                e.remaining += duration;
                e.duration = e.remaining;
                ApplyOutcome::Extended
            }
            (Some(i), StackingRule::IncreaseIntensity) => {
                let e = &mut list[i];
                e.remaining = duration;
                e.duration = duration;
                if e.stacks < max_stacks {
                    e.stacks += 1;
                    ApplyOutcome::Stacked(e.stacks)
                } else {
                    ApplyOutcome::Refreshed
                }
            }
            (Some(_), StackingRule::Independent) => {
                let cap = max_stacks.min(MAX_INDEPENDENT_INSTANCES) as usize;
                let count = list.iter().filter(|e| e.kind == application.kind).count();
                if count < cap {
                    list.push(fresh);
                    ApplyOutcome::Added
                } else {
                    // At capacity the instance closest to expiry is refreshed.
                    let oldest = list
                        .iter_mut()
                        .filter(|e| e.kind == application.kind)
                        .min_by(|a, b| a.remaining.total_cmp(&b.remaining));
                    if let Some(e) = oldest {
                        *e = fresh;
                    }
                    ApplyOutcome::Refreshed
                }
            }
            (Some(_), StackingRule::Replace) => {
                list.retain(|e| e.kind != application.kind);
                list.push(fresh);
                ApplyOutcome::Replaced
            }
        };

        let stacks = self.stack_count(target, application.kind);
        bus.push(CombatEvent::StatusApplied {
            target,
            kind: application.kind,
            stacks,
        });
        outcome
    }

    /// Advance every effect by `dt`. `positions` lists candidate targets for
    /// chain and spread behavior; entities missing from it never spread.
    pub fn update(
        &mut self,
        dt: f32,
        positions: &[(Entity, Vec3)],
        bus: &mut EventBus,
    ) -> Vec<StatusTick> {
        let dt = dt.max(0.0);
        let mut ticks = Vec::new();
        let mut queued: Vec<(Entity, StatusApplication)> = Vec::new();
        // Chain and spread only reach entities that did not carry the kind at frame start.
        let tagged: BTreeSet<(Entity, StatusEffectKind)> = self
            .effects
            .iter()
            .flat_map(|(&e, l)| l.iter().map(move |i| (e, i.kind)))
            .collect();

        for (&target, list) in self.effects.iter_mut() {
            let here = positions
                .iter()
                .find(|(e, _)| *e == target)
                .map(|(_, p)| *p);

            for effect in list.iter_mut() {
                let def = self.catalog.get(effect.kind);
                let step = dt.min(effect.remaining.max(0.0));
                let strength = effect.effective_strength();
                if step > 0.0 && (def.damage_per_second > 0.0 || def.heal_per_second > 0.0) {
                    ticks.push(StatusTick {
                        target,
                        kind: effect.kind,
                        damage: def.damage_per_second * strength * step,
                        heal: def.heal_per_second * strength * step,
                    });
                }
                effect.remaining -= dt;

                let Some(origin) = here else {
                    continue;
                };
                match def.special {
                    SpecialBehavior::None => {}
                    SpecialBehavior::Chain => {
                        if effect.generation >= self.tuning.max_chain_generations
                            || self.rng.gen::<f32>() >= self.tuning.chain_chance
                        {
                            continue;
                        }
                        let next = nearest_without(
                            positions,
                            target,
                            origin,
                            self.tuning.chain_radius,
                            effect.kind,
                            &tagged,
                            &queued,
                        );
                        if let Some(next) = next {
                            queued.push((
                                next,
                                StatusApplication {
                                    kind: effect.kind,
                                    strength: effect.strength,
                                    duration: Some(
                                        def.base_duration * self.tuning.chain_duration_factor,
                                    ),
                                    source: origin,
                                    generation: effect.generation + 1,
                                },
                            ));
                        }
                    }
                    SpecialBehavior::Spread => {
                        if effect.generation >= self.tuning.max_chain_generations {
                            continue;
                        }
                        let radius_sq = self.tuning.spread_radius * self.tuning.spread_radius;
                        for (other, pos) in positions {
                            if *other == target
                                || pos.distance_squared(&origin) > radius_sq
                                || tagged.contains(&(*other, effect.kind))
                            {
                                continue;
                            }
                            if self.rng.gen::<f32>() < self.tuning.spread_chance {
                                queued.push((
                                    *other,
                                    StatusApplication {
                                        kind: effect.kind,
                                        strength: effect.strength,
                                        duration: None,
                                        source: origin,
                                        generation: effect.generation + 1,
                                    },
                                ));
                            }
                        }
                    }
                    SpecialBehavior::Quantum => {
                        if self.rng.gen::<f32>() < self.tuning.quantum_event_chance {
                            bus.push(CombatEvent::QuantumEvent {
                                target,
                                kind: effect.kind,
                            });
                        }
                    }
                }
            }

            list.retain(|e| {
                let alive = e.remaining > 0.0;
                if !alive {
                    bus.push(CombatEvent::StatusRemoved {
                        target,
                        kind: e.kind,
                    });
                }
                alive
            });
        }
        self.effects.retain(|_, list| !list.is_empty());

        for (target, application) in queued {
            // First copy wins when several sources reach the same target.
            if self.has_effect(target, application.kind) {
                continue;
            }
            log::trace!(
                "{:?} spread to {:?} (generation {})",
                application.kind,
                target,
                application.generation
            );
            self.apply_with(target, application, bus);
        }
        ticks
    }

    pub fn has_effect(&self, target: Entity, kind: StatusEffectKind) -> bool {
        self.effects
            .get(&target)
            .is_some_and(|l| l.iter().any(|e| e.kind == kind))
    }

    /// The longest-lasting instance of `kind` on `target`.
    pub fn get_effect(&self, target: Entity, kind: StatusEffectKind) -> Option<&StatusEffectInstance> {
        self.effects.get(&target).and_then(|l| {
            l.iter()
                .filter(|e| e.kind == kind)
                .max_by(|a, b| a.remaining.total_cmp(&b.remaining))
        })
    }

    pub fn get_all(&self, target: Entity) -> &[StatusEffectInstance] {
        self.effects.get(&target).map(|l| l.as_slice()).unwrap_or(&[])
    }

    /// Total stacks (or instances, for independent kinds) of `kind`.
    pub fn stack_count(&self, target: Entity, kind: StatusEffectKind) -> u8 {
        self.effects.get(&target).map_or(0, |l| {
            l.iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.stacks)
                .fold(0u8, |a, b| a.saturating_add(b))
        })
    }

    /// Cleanse: remove every dispellable effect. Returns how many were removed.
    pub fn remove_all_dispellable(&mut self, target: Entity, bus: &mut EventBus) -> usize {
        let Some(list) = self.effects.get_mut(&target) else {
            return 0;
        };
        let before = list.len();
        let catalog = &self.catalog;
        list.retain(|e| {
            let keep = !catalog.get(e.kind).dispellable;
            if !keep {
                bus.push(CombatEvent::StatusRemoved {
                    target,
                    kind: e.kind,
                });
            }
            keep
        });
        let removed = before - list.len();
        if list.is_empty() {
            self.effects.remove(&target);
        }
        removed
    }

    /// Drop everything on a target (on death or despawn).
    pub fn remove_entity(&mut self, target: Entity) {
        self.effects.remove(&target);
    }

    /// Combined stat modifiers, each effect weighted by its effective strength.
    pub fn aggregate_modifiers(&self, target: Entity) -> StatModifiers {
        let mut out = StatModifiers::IDENTITY;
        for e in self.get_all(target) {
            out.compose(&self.catalog.get(e.kind).modifiers, e.effective_strength());
        }
        out
    }

    pub fn affected_count(&self) -> usize {
        self.effects.len()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }
}

fn nearest_without(
    positions: &[(Entity, Vec3)],
    from: Entity,
    origin: Vec3,
    radius: f32,
    kind: StatusEffectKind,
    tagged: &BTreeSet<(Entity, StatusEffectKind)>,
    queued: &[(Entity, StatusApplication)],
) -> Option<Entity> {
    let radius_sq = radius * radius;
    positions
        .iter()
        .filter(|(e, p)| *e != from && p.distance_squared(&origin) <= radius_sq)
        .filter(|(e, _)| !tagged.contains(&(*e, kind)))
        .filter(|(e, _)| !queued.iter().any(|(q, a)| q == e && a.kind == kind))
        .min_by(|a, b| {
            a.1.distance_squared(&origin)
                .total_cmp(&b.1.distance_squared(&origin))
        })
        .map(|(e, _)| *e)
}
