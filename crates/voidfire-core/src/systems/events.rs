//! Combat event bus - ordered fan-out of combat events to observers
//!
//! Subsystems push events while they update. The engine dispatches the queue
//! once per frame: every observer sees every event, in subscription order.
//! An observer that fails is logged and skipped for that event; the remaining
//! observers still receive it.

use std::collections::VecDeque;

use hecs::Entity;
use thiserror::Error;
use voidfire_logic::math::Vec3;
use voidfire_logic::status::StatusEffectKind;
use voidfire_logic::synergy::{ChainReactionKind, PowerUpKind, SynergyKind};
use voidfire_logic::upgrades::EvolutionStage;
use voidfire_logic::weapons::WeaponKind;

/// Everything the combat core reports to collaborators (audio, particles, UI).
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    WeaponFired {
        weapon: WeaponKind,
        position: Vec3,
        projectiles: usize,
        charge_ratio: f32,
    },
    WeaponEquipped {
        weapon: WeaponKind,
    },
    WeaponSwitched {
        from: Option<WeaponKind>,
        to: WeaponKind,
    },
    ChargeCancelled {
        weapon: WeaponKind,
        ratio: f32,
    },
    ReloadStarted {
        weapon: WeaponKind,
    },
    ReloadFinished {
        weapon: WeaponKind,
    },
    ProjectileHit {
        weapon: WeaponKind,
        target: Entity,
        position: Vec3,
        damage: f32,
        critical: bool,
    },
    AreaBurst {
        weapon: WeaponKind,
        center: Vec3,
        radius: f32,
    },
    TargetKilled {
        target: Entity,
        weapon: Option<WeaponKind>,
    },
    StatusApplied {
        target: Entity,
        kind: StatusEffectKind,
        stacks: u8,
    },
    StatusRemoved {
        target: Entity,
        kind: StatusEffectKind,
    },
    /// One-off event from a quantum-category effect. No numeric effect.
    QuantumEvent {
        target: Entity,
        kind: StatusEffectKind,
    },
    PowerUpGained {
        kind: PowerUpKind,
    },
    PowerUpExpired {
        kind: PowerUpKind,
    },
    SynergyActivated {
        kind: SynergyKind,
        first_discovery: bool,
    },
    SynergyExpired {
        kind: SynergyKind,
    },
    ChainReaction {
        kind: ChainReactionKind,
        participants: Vec<SynergyKind>,
    },
    WeaponEvolved {
        weapon: WeaponKind,
        stage: EvolutionStage,
    },
}

/// Failure reported by an observer. Never propagates past the bus.
#[derive(Debug, Error)]
#[error("observer `{observer}` failed: {reason}")]
pub struct ObserverError {
    pub observer: String,
    pub reason: String,
}

impl ObserverError {
    pub fn new(observer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            observer: observer.into(),
            reason: reason.into(),
        }
    }
}

/// Subscriber to combat events.
pub trait CombatObserver {
    fn name(&self) -> &str;
    fn on_event(&mut self, event: &CombatEvent) -> Result<(), ObserverError>;
}

/// Handle returned by [`EventBus::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u32);

/// Queue of pending events plus the ordered observer list.
#[derive(Default)]
pub struct EventBus {
    queue: VecDeque<CombatEvent>,
    observers: Vec<(SubscriberId, Box<dyn CombatObserver>)>,
    next_id: u32,
    failures: u64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: CombatEvent) {
        self.queue.push_back(event);
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Add an observer at the end of the delivery order.
    pub fn subscribe(&mut self, observer: Box<dyn CombatObserver>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Total observer failures since creation.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    /// Deliver every queued event to every observer and return the events.
    pub fn dispatch(&mut self) -> Vec<CombatEvent> {
        let events: Vec<CombatEvent> = self.queue.drain(..).collect();
        for event in &events {
            for (_, observer) in self.observers.iter_mut() {
                if let Err(e) = observer.on_event(event) {
                    self.failures += 1;
                    log::warn!("{} (event {:?})", e, event);
                }
            }
        }
        events
    }

    /// Drop queued events without delivering them.
    pub fn clear(&mut self) {
        self.queue.clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.queue.len())
            .field("observers", &self.observers.len())
            .field("failures", &self.failures)
            .finish()
    }
}
