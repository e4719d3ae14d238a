//! Firing pattern expansion - one fire event into per-projectile launches.
//!
//! Pure geometry: given the aim direction, each pattern produces a list of
//! launch directions with an optional per-projectile delay and a damage
//! factor (the first projectile carries full damage, the rest carry the
//! weapon's secondary factor). Accuracy jitter is applied later by the
//! caller, per projectile.

use std::f32::consts::{PI, TAU};

use crate::math::Vec3;
use crate::weapons::FiringPattern;

/// Golden angle in radians, used to fill cones evenly.
const GOLDEN_ANGLE: f32 = 2.399_963;

/// One projectile launch produced by a pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatternShot {
    /// Unit launch direction (before accuracy jitter).
    pub direction: Vec3,
    /// Seconds after the fire event at which this projectile launches.
    pub delay: f32,
    /// Damage multiplier relative to the primary projectile.
    pub damage_factor: f32,
}

/// Axis used to fan projectiles out around the aim direction.
///
/// World up for anything not pointing straight up or down.
pub fn fan_axis(aim: &Vec3) -> Vec3 {
    let n = aim.normalize_or(Vec3::FORWARD);
    if n.dot(&Vec3::UP).abs() < 0.99 {
        Vec3::UP
    } else {
        n.any_perpendicular()
    }
}

/// Expand a pattern around `aim`.
pub fn expand_pattern(
    pattern: &FiringPattern,
    aim: Vec3,
    secondary_damage_factor: f32,
) -> Vec<PatternShot> {
    let aim = aim.normalize_or(Vec3::FORWARD);
    let axis = fan_axis(&aim);

    let mut shots = match *pattern {
        FiringPattern::Single | FiringPattern::Burst => vec![shot(aim, 0.0)],

        FiringPattern::Spread { count, arc } => {
            let count = count.max(1) as usize;
            if count == 1 {
                vec![shot(aim, 0.0)]
            } else {
                (0..count)
                    .map(|i| {
                        let t = i as f32 / (count - 1) as f32;
                        let angle = -arc / 2.0 + arc * t;
                        shot(aim.rotate_around(&axis, angle), 0.0)
                    })
                    .collect()
            }
        }

        FiringPattern::Ring { count } => {
            let count = count.max(1) as usize;
            (0..count)
                .map(|i| {
                    let angle = TAU * i as f32 / count as f32;
                    shot(aim.rotate_around(&axis, angle), 0.0)
                })
                .collect()
        }

        FiringPattern::Spiral { count, step, delay } => (0..count.max(1) as usize)
            .map(|i| {
                let angle = step * i as f32;
                shot(aim.rotate_around(&axis, angle), delay * i as f32)
            })
            .collect(),

        FiringPattern::Wave {
            count,
            amplitude,
            frequency,
            delay,
        } => (0..count.max(1) as usize)
            .map(|i| {
                let angle = amplitude * (i as f32 * frequency).sin();
                shot(aim.rotate_around(&axis, angle), delay * i as f32)
            })
            .collect(),

        FiringPattern::Helix {
            per_strand,
            twist,
            tilt,
            delay,
        } => {
            let perp = aim.any_perpendicular();
            let mut out = Vec::with_capacity(per_strand as usize * 2);
            for i in 0..per_strand.max(1) as usize {
                for strand in [1.0f32, -1.0] {
                    // Second strand starts opposite the first and turns the other way.
                    let roll = strand * twist * i as f32 + if strand < 0.0 { PI } else { 0.0 };
                    let tilt_axis = perp.rotate_around(&aim, roll);
                    out.push(shot(aim.rotate_around(&tilt_axis, tilt), delay * i as f32));
                }
            }
            out
        }

        FiringPattern::Cone { count, half_angle } => {
            let count = count.max(1) as usize;
            let perp = aim.any_perpendicular();
            (0..count)
                .map(|i| {
                    if i == 0 {
                        return shot(aim, 0.0);
                    }
                    let r = half_angle * ((i as f32 + 0.5) / count as f32).sqrt();
                    let theta = GOLDEN_ANGLE * i as f32;
                    let tilt_axis = perp.rotate_around(&aim, theta);
                    shot(aim.rotate_around(&tilt_axis, r), 0.0)
                })
                .collect()
        }
    };

    for s in shots.iter_mut().skip(1) {
        s.damage_factor = secondary_damage_factor;
    }
    shots
}

fn shot(direction: Vec3, delay: f32) -> PatternShot {
    PatternShot {
        direction: direction.normalize_or(Vec3::FORWARD),
        delay,
        damage_factor: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::angle_between;

    const AIM: Vec3 = Vec3::FORWARD;

    #[test]
    fn test_single_is_aim() {
        let shots = expand_pattern(&FiringPattern::Single, AIM, 0.5);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].direction, AIM);
        assert_eq!(shots[0].damage_factor, 1.0);
    }

    #[test]
    fn test_spread_is_even_and_symmetric() {
        let shots = expand_pattern(&FiringPattern::Spread { count: 5, arc: 0.8 }, AIM, 0.9);
        assert_eq!(shots.len(), 5);
        let angles: Vec<f32> = shots.iter().map(|s| angle_between(&AIM, &s.direction)).collect();
        assert!((angles[0] - 0.4).abs() < 1e-4);
        assert!((angles[4] - 0.4).abs() < 1e-4);
        assert!(angles[2] < 1e-3);
        // Adjacent projectiles are equally spaced
        for w in shots.windows(2) {
            let gap = angle_between(&w[0].direction, &w[1].direction);
            assert!((gap - 0.2).abs() < 1e-3);
        }
    }

    #[test]
    fn test_secondary_damage_factor() {
        let shots = expand_pattern(&FiringPattern::Ring { count: 4 }, AIM, 0.85);
        assert_eq!(shots[0].damage_factor, 1.0);
        assert!(shots[1..].iter().all(|s| s.damage_factor == 0.85));
    }

    #[test]
    fn test_ring_covers_full_circle() {
        let shots = expand_pattern(&FiringPattern::Ring { count: 4 }, AIM, 1.0);
        let sum = shots
            .iter()
            .fold(Vec3::ZERO, |acc, s| acc + s.direction);
        assert!(sum.length() < 1e-4);
    }

    #[test]
    fn test_spiral_delays_increase() {
        let shots = expand_pattern(
            &FiringPattern::Spiral {
                count: 5,
                step: 0.4,
                delay: 0.05,
            },
            AIM,
            1.0,
        );
        for (i, s) in shots.iter().enumerate() {
            assert!((s.delay - 0.05 * i as f32).abs() < 1e-6);
        }
        let a3 = angle_between(&AIM, &shots[3].direction);
        assert!((a3 - 1.2).abs() < 1e-3);
    }

    #[test]
    fn test_wave_bounded_by_amplitude() {
        let shots = expand_pattern(
            &FiringPattern::Wave {
                count: 12,
                amplitude: 0.5,
                frequency: 0.7,
                delay: 0.0,
            },
            AIM,
            1.0,
        );
        for s in &shots {
            assert!(angle_between(&AIM, &s.direction) <= 0.5 + 1e-4);
        }
    }

    #[test]
    fn test_helix_strands_interleave_and_tilt() {
        let shots = expand_pattern(
            &FiringPattern::Helix {
                per_strand: 4,
                twist: 0.6,
                tilt: 0.12,
                delay: 0.04,
            },
            AIM,
            1.0,
        );
        assert_eq!(shots.len(), 8);
        for s in &shots {
            assert!((angle_between(&AIM, &s.direction) - 0.12).abs() < 1e-3);
        }
        // Interleaved pairs share a launch delay
        assert_eq!(shots[2].delay, shots[3].delay);
        // Strands start on opposite sides
        assert!(shots[0].direction.dot(&shots[1].direction) < AIM.dot(&shots[0].direction));
    }

    #[test]
    fn test_cone_within_half_angle() {
        let shots = expand_pattern(
            &FiringPattern::Cone {
                count: 9,
                half_angle: 0.3,
            },
            AIM,
            0.8,
        );
        assert_eq!(shots.len(), 9);
        for s in &shots {
            assert!(angle_between(&AIM, &s.direction) <= 0.3 + 1e-4);
        }
    }

    #[test]
    fn test_vertical_aim_still_fans() {
        let shots = expand_pattern(&FiringPattern::Ring { count: 6 }, Vec3::UP, 1.0);
        assert_eq!(shots.len(), 6);
        assert!(shots.iter().all(|s| s.direction.is_finite()));
    }
}
