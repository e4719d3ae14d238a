//! Voidfire Core - Space Shooter Combat Engine
//!
//! A frame-stepped combat simulation: weapons fire projectiles, projectiles
//! hit enemies, hits apply damage and status effects, weapon and power-up
//! combinations unlock synergies, and a balancing engine retunes the numbers
//! to the player's performance.
//!
//! # Architecture
//!
//! Enemies and the player live in a `hecs` world. Each subsystem owns its
//! own state and random stream and is driven by [`engine::CombatEngine`] in
//! a fixed order:
//! - **WeaponController**: equipped weapons, energy, reload, charge, bursts
//! - **Projectile**: movement, collision and terminal behavior
//! - **StatusEffectManager**: per-entity effects, stacking, ticks, spread
//! - **SynergyEngine**: combination detection, timers, chain reactions
//! - **BalancingEngine**: performance window, multiplier drift, enemy scaling
//!
//! Collaborators observe the simulation through the [`systems::EventBus`].
//!
//! # Example
//!
//! ```rust,no_run
//! use voidfire_core::prelude::*;
//!
//! let mut engine = CombatEngine::new(CombatConfig::default()).unwrap();
//! engine.equip_weapon(WeaponKind::Standard);
//! engine.spawn_enemy(Vec3::new(0.0, 0.0, 40.0), 100.0, 2.0);
//!
//! let input = FrameInput { fire_held: true, aim: Vec3::FORWARD, target: None };
//! loop {
//!     engine.update(1.0 / 60.0, &input); // 60 FPS
//! }
//! ```

pub mod components;
pub mod systems;
pub mod config;
pub mod engine;
pub mod persistence;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::config::CombatConfig;
    pub use crate::engine::{CombatEngine, FrameInput, FrameReport};
    pub use crate::systems::{CombatEvent, CombatObserver, FireOutcome};
    pub use voidfire_logic::math::Vec3;
    pub use voidfire_logic::status::StatusEffectKind;
    pub use voidfire_logic::synergy::{PowerUpKind, SynergyKind};
    pub use voidfire_logic::weapons::WeaponKind;
}
