//! Synergy engine - detects ingredient combinations, runs activation timers
//! and fires chain reactions between overlapping synergies.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use voidfire_logic::catalog::SynergyCatalog;
use voidfire_logic::synergy::{
    ChainReactionKind, Ingredient, SynergyBonus, SynergyDefinition, SynergyKey, SynergyKind,
};

use super::events::{CombatEvent, EventBus};
use crate::config::SynergyConfig;

/// One running synergy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveSynergy {
    pub kind: SynergyKind,
    pub remaining: f32,
    /// Total seconds granted so far, including chain extensions.
    pub duration: f32,
    /// Current strength; starts at the definition's and grows with chain reactions.
    pub strength: f32,
}

pub struct SynergyEngine {
    catalog: SynergyCatalog,
    config: SynergyConfig,
    active: BTreeMap<SynergyKind, ActiveSynergy>,
    discovered: BTreeSet<SynergyKind>,
    /// Rules that already fired during the current co-activation episode.
    fired_rules: BTreeSet<ChainReactionKind>,
}

impl SynergyEngine {
    pub fn new(catalog: SynergyCatalog, config: SynergyConfig) -> Self {
        Self {
            catalog,
            config,
            active: BTreeMap::new(),
            discovered: BTreeSet::new(),
            fired_rules: BTreeSet::new(),
        }
    }

    pub fn definition(&self, kind: SynergyKind) -> &SynergyDefinition {
        self.catalog.get(kind)
    }

    /// Test every pair and triple of `ingredients` against the catalog and
    /// activate each match that is not already running. Already-active
    /// synergies keep their timers.
    pub fn check_for_synergies(
        &mut self,
        ingredients: &[Ingredient],
        bus: &mut EventBus,
    ) -> Vec<SynergyKind> {
        let mut set = ingredients.to_vec();
        set.sort();
        set.dedup();

        let mut matches: BTreeSet<SynergyKind> = BTreeSet::new();
        for i in 0..set.len() {
            for j in (i + 1)..set.len() {
                if let Some(kind) = self.catalog.lookup(&SynergyKey::new(&[set[i], set[j]])) {
                    matches.insert(kind);
                }
                for k in (j + 1)..set.len() {
                    let key = SynergyKey::new(&[set[i], set[j], set[k]]);
                    if let Some(kind) = self.catalog.lookup(&key) {
                        matches.insert(kind);
                    }
                }
            }
        }

        let mut activated = Vec::new();
        for kind in matches {
            if self.active.contains_key(&kind) {
                continue;
            }
            self.activate(kind, bus);
            activated.push(kind);
        }
        activated
    }

    fn activate(&mut self, kind: SynergyKind, bus: &mut EventBus) {
        let def = self.catalog.get(kind);
        let duration = def.duration();
        self.active.insert(
            kind,
            ActiveSynergy {
                kind,
                remaining: duration,
                duration,
                strength: def.strength,
            },
        );
        let first_discovery = self.discovered.insert(kind);
        if first_discovery {
            log::info!("synergy discovered: {}", def.name);
        } else {
            log::debug!("synergy activated: {} ({:.0}s)", def.name, duration);
        }
        bus.push(CombatEvent::SynergyActivated {
            kind,
            first_discovery,
        });
    }

    /// Count down timers, drop expired synergies, then evaluate chain rules.
    pub fn update(&mut self, dt: f32, bus: &mut EventBus) {
        let dt = dt.max(0.0);
        let mut expired = Vec::new();
        for (kind, active) in self.active.iter_mut() {
            active.remaining -= dt;
            if active.remaining <= 0.0 {
                expired.push(*kind);
            }
        }
        for kind in expired {
            self.active.remove(&kind);
            log::debug!("synergy expired: {:?}", kind);
            bus.push(CombatEvent::SynergyExpired { kind });
        }

        // A rule re-arms as soon as any participant is gone.
        let active = &self.active;
        let rules = self.catalog.rules();
        self.fired_rules.retain(|kind| {
            rules
                .iter()
                .find(|r| r.kind == *kind)
                .is_some_and(|r| r.participants.iter().all(|p| active.contains_key(p)))
        });

        self.evaluate_chain_reactions(bus);
    }

    fn evaluate_chain_reactions(&mut self, bus: &mut EventBus) {
        let ready: Vec<(ChainReactionKind, &'static str, &'static [SynergyKind])> = self
            .catalog
            .rules()
            .iter()
            .filter(|r| !self.fired_rules.contains(&r.kind))
            .filter(|r| r.participants.iter().all(|p| self.active.contains_key(p)))
            .map(|r| (r.kind, r.name, r.participants))
            .collect();

        for (kind, name, participants) in ready {
            for p in participants {
                if let Some(active) = self.active.get_mut(p) {
                    active.strength = (active.strength * self.config.chain_strength_bonus)
                        .min(self.config.max_strength);
                    active.remaining += self.config.chain_duration_bonus;
                    active.duration += self.config.chain_duration_bonus;
                }
            }
            self.fired_rules.insert(kind);
            log::info!("chain reaction: {} over {:?}", name, participants);
            bus.push(CombatEvent::ChainReaction {
                kind,
                participants: participants.to_vec(),
            });
        }
    }

    pub fn active_synergies(&self) -> impl Iterator<Item = &ActiveSynergy> {
        self.active.values()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn get(&self, kind: SynergyKind) -> Option<&ActiveSynergy> {
        self.active.get(&kind)
    }

    pub fn is_active(&self, kind: SynergyKind) -> bool {
        self.active.contains_key(&kind)
    }

    pub fn discovered(&self) -> &BTreeSet<SynergyKind> {
        &self.discovered
    }

    /// Restore a discovery from saved progression. No event is emitted.
    pub fn mark_discovered(&mut self, kind: SynergyKind) {
        self.discovered.insert(kind);
    }

    /// Product of every active synergy's bonus at its current strength.
    pub fn combined_bonus(&self) -> SynergyBonus {
        self.active.values().fold(SynergyBonus::NONE, |acc, a| {
            acc.combine(&self.catalog.get(a.kind).bonus.at_strength(a.strength))
        })
    }

    /// End every active synergy. Discoveries are kept.
    pub fn reset(&mut self) {
        self.active.clear();
        self.fired_rules.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voidfire_logic::synergy::PowerUpKind;
    use voidfire_logic::weapons::WeaponKind;

    // ── Helpers ──

    fn engine() -> SynergyEngine {
        SynergyEngine::new(SynergyCatalog::builtin().unwrap(), SynergyConfig::default())
    }

    fn w(kind: WeaponKind) -> Ingredient {
        Ingredient::Weapon(kind)
    }

    // ── Detection ──

    #[test]
    fn test_pair_in_either_order() {
        let mut a = engine();
        let mut b = engine();
        let mut bus = EventBus::new();
        let got_a = a.check_for_synergies(&[w(WeaponKind::Standard), w(WeaponKind::Scatter)], &mut bus);
        let got_b = b.check_for_synergies(&[w(WeaponKind::Scatter), w(WeaponKind::Standard)], &mut bus);
        assert_eq!(got_a, vec![SynergyKind::Scattershot]);
        assert_eq!(got_a, got_b);
    }

    #[test]
    fn test_triple_found_among_extras() {
        let mut e = engine();
        let mut bus = EventBus::new();
        let got = e.check_for_synergies(
            &[
                w(WeaponKind::Laser),
                w(WeaponKind::Vortex),
                Ingredient::PowerUp(PowerUpKind::TimeWarp),
                w(WeaponKind::Nova),
            ],
            &mut bus,
        );
        assert!(got.contains(&SynergyKind::Singularity));
    }

    #[test]
    fn test_check_is_idempotent() {
        let mut e = engine();
        let mut bus = EventBus::new();
        let set = [w(WeaponKind::Standard), w(WeaponKind::Scatter)];
        e.check_for_synergies(&set, &mut bus);
        e.update(4.0, &mut bus);
        let again = e.check_for_synergies(&set, &mut bus);
        assert!(again.is_empty());
        assert_eq!(e.active_count(), 1);
        let s = e.get(SynergyKind::Scattershot).unwrap();
        assert_eq!(s.remaining, 11.0);
    }

    #[test]
    fn test_common_synergy_expires_after_fifteen_seconds() {
        let mut e = engine();
        let mut bus = EventBus::new();
        e.check_for_synergies(&[w(WeaponKind::Standard), w(WeaponKind::Scatter)], &mut bus);
        assert_eq!(e.get(SynergyKind::Scattershot).unwrap().strength, 1.5);
        for _ in 0..14 {
            e.update(1.0, &mut bus);
        }
        assert!(e.is_active(SynergyKind::Scattershot));
        e.update(1.0, &mut bus);
        assert!(!e.is_active(SynergyKind::Scattershot));
        assert_eq!(e.active_synergies().count(), 0);
    }

    #[test]
    fn test_discovery_reported_once() {
        let mut e = engine();
        let mut bus = EventBus::new();
        let set = [w(WeaponKind::Standard), w(WeaponKind::Scatter)];
        e.check_for_synergies(&set, &mut bus);
        e.update(20.0, &mut bus);
        e.check_for_synergies(&set, &mut bus);

        let firsts: Vec<bool> = bus
            .dispatch()
            .into_iter()
            .filter_map(|ev| match ev {
                CombatEvent::SynergyActivated {
                    first_discovery, ..
                } => Some(first_discovery),
                _ => None,
            })
            .collect();
        assert_eq!(firsts, vec![true, false]);
        assert_eq!(e.discovered().len(), 1);
    }

    // ── Chain reactions ──

    #[test]
    fn test_chain_reaction_amplifies_participants_once() {
        let mut e = engine();
        let mut bus = EventBus::new();
        e.check_for_synergies(
            &[
                w(WeaponKind::Plasma),
                w(WeaponKind::Tesla),
                w(WeaponKind::Flamethrower),
                w(WeaponKind::Cryo),
            ],
            &mut bus,
        );
        let storm_before = *e.get(SynergyKind::PlasmaStorm).unwrap();
        e.update(0.5, &mut bus);
        let storm = *e.get(SynergyKind::PlasmaStorm).unwrap();
        assert!((storm.strength - storm_before.strength * 1.25).abs() < 1e-5);
        assert!((storm.remaining - (storm_before.remaining - 0.5 + 5.0)).abs() < 1e-4);

        e.update(0.5, &mut bus);
        let storm_later = *e.get(SynergyKind::PlasmaStorm).unwrap();
        assert_eq!(storm_later.strength, storm.strength);

        let chains = bus
            .dispatch()
            .iter()
            .filter(|ev| matches!(ev, CombatEvent::ChainReaction { .. }))
            .count();
        assert_eq!(chains, 1);
    }

    #[test]
    fn test_chain_strength_capped() {
        let config = SynergyConfig {
            chain_strength_bonus: 10.0,
            ..SynergyConfig::default()
        };
        let mut e = SynergyEngine::new(SynergyCatalog::builtin().unwrap(), config);
        let mut bus = EventBus::new();
        e.check_for_synergies(
            &[w(WeaponKind::Laser), w(WeaponKind::Railgun), w(WeaponKind::Cryo)],
            &mut bus,
        );
        e.update(0.1, &mut bus);
        assert_eq!(e.get(SynergyKind::FocusedLance).unwrap().strength, 5.0);
        assert_eq!(e.get(SynergyKind::Shatter).unwrap().strength, 5.0);
    }

    #[test]
    fn test_combined_bonus_neutral_when_idle() {
        let e = engine();
        assert_eq!(e.combined_bonus(), SynergyBonus::NONE);
    }

    #[test]
    fn test_reset_keeps_discoveries() {
        let mut e = engine();
        let mut bus = EventBus::new();
        e.check_for_synergies(&[w(WeaponKind::Standard), w(WeaponKind::Scatter)], &mut bus);
        e.reset();
        assert_eq!(e.active_count(), 0);
        assert!(e.discovered().contains(&SynergyKind::Scattershot));
    }
}
