//! Damage pipeline - the order in which per-hit damage is assembled.
//!
//! 1. charge ratio
//! 2. upgrade level and evolution bonus
//! 3. elemental add-on for non-physical elements
//! 4. linear distance falloff for area/cone weapons (floored at 30%)
//!
//! Splash damage is computed separately from its own radius curve.

use serde::{Deserialize, Serialize};

use crate::constants::damage::{FALLOFF_FLOOR, MIN_DAMAGE};
use crate::weapons::Element;

/// Inputs for one direct hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitInputs {
    /// Damage rolled at fire time (base × crit × variance × global multipliers).
    pub base: f32,
    pub charge_ratio: f32,
    pub level_multiplier: f32,
    pub evolution_multiplier: f32,
    pub element: Element,
    /// `Some((distance, range))` when the weapon uses distance falloff.
    pub falloff: Option<(f32, f32)>,
}

/// Direct-hit damage broken down by pipeline stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DamageBreakdown {
    pub after_charge: f32,
    pub after_level: f32,
    pub elemental: f32,
    pub falloff_factor: f32,
    /// Final direct damage (physical + elemental, after falloff).
    pub total: f32,
}

/// Run the direct-hit pipeline.
pub fn compute_hit_damage(inputs: &HitInputs) -> DamageBreakdown {
    let after_charge = inputs.base * inputs.charge_ratio.clamp(0.0, 1.0);
    let after_level = after_charge * inputs.level_multiplier * inputs.evolution_multiplier;
    let elemental = after_level * inputs.element.bonus_fraction();
    let falloff_factor = match inputs.falloff {
        Some((distance, range)) => distance_falloff(distance, range),
        None => 1.0,
    };
    let total = sanitize((after_level + elemental) * falloff_factor);
    DamageBreakdown {
        after_charge,
        after_level,
        elemental: elemental * falloff_factor,
        falloff_factor,
        total,
    }
}

/// Linear falloff over `range`, never below [`FALLOFF_FLOOR`].
pub fn distance_falloff(distance: f32, range: f32) -> f32 {
    if !(range > 0.0) {
        return 1.0;
    }
    (1.0 - distance.max(0.0) / range).max(FALLOFF_FLOOR)
}

/// Splash damage at `distance` from the impact: full at the center, fading
/// linearly to zero at the edge.
pub fn splash_damage(splash: f32, radius: f32, distance: f32) -> f32 {
    if !(radius > 0.0) || splash <= 0.0 || distance > radius {
        return 0.0;
    }
    splash * (1.0 - distance.max(0.0) / radius)
}

/// Clamp a damage number to the sane floor, mapping NaN/negative to the floor.
pub fn clamp_damage(damage: f32) -> f32 {
    if damage.is_nan() {
        MIN_DAMAGE
    } else {
        damage.max(MIN_DAMAGE)
    }
}

fn sanitize(v: f32) -> f32 {
    if v.is_finite() {
        v.max(0.0)
    } else {
        0.0
    }
}
