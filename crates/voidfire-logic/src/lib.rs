//! Pure combat logic for Voidfire.
//!
//! This crate holds every piece of the combat model that does not need
//! mutable session state or randomness: the catalogs, pattern geometry,
//! damage and balance formulas, and progression scaling. Functions take plain
//! data and return results, so the stateful engine in `voidfire-core`, the
//! headless harness, and any future front end share one source of truth.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`balance`] | Performance scoring, multiplier drift, difficulty tiers, enemy scaling |
//! | [`catalog`] | Validated, enum-indexed weapon/status/synergy catalogs |
//! | [`constants`] | Shared tuning constants (bounds, floors, caps) |
//! | [`damage`] | Direct-hit damage pipeline, falloff and splash curves |
//! | [`math`] | `Vec3` and the geometry helpers projectiles need |
//! | [`patterns`] | Firing pattern expansion into per-projectile launches |
//! | [`status`] | Status effect kinds, stacking rules, stat modifiers |
//! | [`synergy`] | Power-ups, synergy keys and definitions, chain-reaction rules |
//! | [`upgrades`] | Upgrade level scaling and experience-driven evolution |
//! | [`weapons`] | Weapon kinds, disciplines, patterns, movement and stat blocks |

pub mod balance;
pub mod catalog;
pub mod constants;
pub mod damage;
pub mod math;
pub mod patterns;
pub mod status;
pub mod synergy;
pub mod upgrades;
pub mod weapons;
