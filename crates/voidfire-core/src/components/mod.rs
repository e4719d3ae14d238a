//! Component definitions for the target registry.
//!
//! Components are pure data attached to `hecs` entities.
//! Behavior lives in the systems and the engine.

mod combatant;

pub use combatant::*;
