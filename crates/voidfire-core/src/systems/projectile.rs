//! Projectiles - one in-flight shot and its movement, collision and terminal behavior
//!
//! Movement and collision shape are selected by the weapon's [`MovementKind`];
//! terminal behavior (penetration, ricochet, fuse, cluster) is composed from
//! the weapon's stat block, so a single struct covers every weapon.

use hecs::Entity;
use rand::Rng;
use voidfire_logic::constants::projectile::{
    AREA_START_RADIUS, BEAM_HALF_WIDTH, DEFAULT_RADIUS, MAX_CLUSTER_CHILDREN, MAX_PENETRATION,
    MAX_RICOCHETS, MULTI_STATE_CANDIDATES, MULTI_STATE_JITTER, MULTI_STATE_MAX_OFFSET,
    PENETRATION_DAMAGE_LOSS, PENETRATION_SPEED_RETENTION, RICOCHET_RETENTION,
};
use voidfire_logic::damage::{clamp_damage, compute_hit_damage, splash_damage, DamageBreakdown, HitInputs};
use voidfire_logic::math::{point_segment_distance, Vec3};
use voidfire_logic::weapons::{
    ClusterSpec, Element, MovementKind, OnHitStatus, WeaponDefinition, WeaponKind,
};

/// Area damage produced by a detonation or a terminal splash.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AreaBurst {
    pub weapon: WeaponKind,
    pub center: Vec3,
    pub radius: f32,
    /// Damage at the center; fades linearly to zero at `radius`.
    pub damage: f32,
    pub element: Element,
    /// Target already damaged directly by the same impact.
    pub exclude: Option<Entity>,
}

/// Result of [`Projectile::calculate_damage_info`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageInfo {
    pub direct: DamageBreakdown,
    pub splash: f32,
    /// Direct + splash, floored at the minimum damage.
    pub total: f32,
    pub critical: bool,
    /// Status the hit may apply (chance not yet rolled).
    pub status: Option<OnHitStatus>,
}

/// What happened on a hit, from the projectile's point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum HitResolution {
    /// Passed through; damage and speed reduced.
    Penetrated,
    /// Bounced off; damage reduced.
    Ricocheted,
    /// Stuck at the impact point until its fuse runs out.
    Stuck,
    /// Deactivated. Carries any terminal bursts.
    Terminated(Vec<AreaBurst>),
}

/// Everything fixed at fire time that the projectile carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaunchParams {
    pub position: Vec3,
    /// Unit direction after accuracy jitter.
    pub direction: Vec3,
    pub carrier_velocity: Vec3,
    /// Damage rolled at fire time (crit, variance, global multipliers, pattern factor).
    pub damage: f32,
    pub critical: bool,
    pub charge_ratio: f32,
    pub level_multiplier: f32,
    pub evolution_multiplier: f32,
    pub world_bounds: f32,
}

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u32,
    pub weapon: WeaponKind,
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    /// Launch point, used for distance falloff and beam segments.
    pub origin: Vec3,
    pub lifespan: f32,
    pub max_lifespan: f32,
    pub active: bool,
    pub has_hit: bool,
    /// True once any target was hit during the projectile's life.
    pub ever_hit: bool,
    pub damage: f32,
    pub critical: bool,
    pub charge_ratio: f32,
    pub level_multiplier: f32,
    pub evolution_multiplier: f32,
    pub element: Element,
    pub movement: MovementKind,
    pub range: f32,
    pub speed: f32,
    pub radius: f32,
    pub homing_target: Option<Vec3>,
    /// Remaining seconds before a delayed detonation.
    pub fuse: Option<f32>,
    pub stuck: bool,
    pub ricochets_left: u8,
    pub penetration_left: u8,
    pub splash_radius: f32,
    pub splash_damage: f32,
    pub cluster: Option<ClusterSpec>,
    pub on_hit: Option<OnHitStatus>,
    /// Multi-state candidate positions; empty once collapsed.
    pub candidates: Vec<Vec3>,
    pub beam_end: Vec3,
    uses_falloff: bool,
    hit_targets: Vec<Entity>,
    world_bounds: f32,
}

impl Projectile {
    pub fn new(id: u32, def: &WeaponDefinition, launch: &LaunchParams) -> Self {
        let direction = launch.direction.normalize_or(Vec3::FORWARD);
        let instant = def.is_instant();
        let speed = if instant { 0.0 } else { def.projectile_speed };
        let velocity = if instant {
            Vec3::ZERO
        } else {
            direction * speed + launch.carrier_velocity
        };

        let radius = match def.movement {
            MovementKind::AreaExpanding { .. } => AREA_START_RADIUS,
            MovementKind::Beam => BEAM_HALF_WIDTH,
            _ => DEFAULT_RADIUS,
        };
        let candidates = if def.movement == MovementKind::MultiState {
            vec![launch.position; MULTI_STATE_CANDIDATES]
        } else {
            Vec::new()
        };
        let lifespan = def.lifespan();

        Self {
            id,
            weapon: def.kind,
            position: launch.position,
            velocity,
            acceleration: Vec3::ZERO,
            origin: launch.position,
            lifespan,
            max_lifespan: lifespan,
            active: true,
            has_hit: false,
            ever_hit: false,
            damage: launch.damage,
            critical: launch.critical,
            charge_ratio: launch.charge_ratio,
            level_multiplier: launch.level_multiplier,
            evolution_multiplier: launch.evolution_multiplier,
            element: def.element,
            movement: def.movement,
            range: def.range,
            speed,
            radius,
            homing_target: None,
            fuse: def.fuse,
            stuck: false,
            ricochets_left: def.ricochets.min(MAX_RICOCHETS),
            penetration_left: def.penetration.min(MAX_PENETRATION),
            splash_radius: def.splash_radius,
            splash_damage: def.splash_damage,
            cluster: def.cluster,
            on_hit: def.on_hit,
            candidates,
            beam_end: launch.position + direction * def.range,
            uses_falloff: def.uses_distance_falloff(),
            hit_targets: Vec::new(),
            world_bounds: launch.world_bounds,
        }
    }

    pub fn is_beam(&self) -> bool {
        self.movement == MovementKind::Beam
    }

    /// Advance one frame. Returns bursts from a fuse or lifespan detonation.
    pub fn update<R: Rng>(&mut self, dt: f32, rng: &mut R) -> Vec<AreaBurst> {
        if !self.active {
            return Vec::new();
        }

        if !self.stuck {
            match self.movement {
                MovementKind::Linear => self.integrate(dt),
                MovementKind::Homing { turn_rate } => {
                    if let Some(target) = self.homing_target {
                        self.steer_toward(target, turn_rate, dt);
                    }
                    self.integrate(dt);
                }
                MovementKind::Beam => {}
                MovementKind::AreaExpanding { growth } => {
                    self.integrate(dt);
                    let age = (self.max_lifespan - self.lifespan + dt).max(0.0);
                    self.radius = AREA_START_RADIUS + growth * age;
                }
                MovementKind::MultiState => {
                    self.integrate(dt);
                    self.perturb_candidates(dt, rng);
                }
            }
        }

        self.lifespan -= dt;
        if let Some(fuse) = self.fuse.as_mut() {
            *fuse -= dt;
        }

        if self.position.length() > self.world_bounds {
            log::trace!("projectile {} left world bounds", self.id);
            self.active = false;
            return Vec::new();
        }

        let fuse_done = self.fuse.is_some_and(|f| f <= 0.0);
        if fuse_done || self.lifespan <= 0.0 {
            self.active = false;
            if self.fuse.is_some() || self.cluster.is_some() {
                return self.detonation_bursts(None);
            }
        }
        Vec::new()
    }

    fn integrate(&mut self, dt: f32) {
        self.velocity += self.acceleration * dt;
        self.position += self.velocity * dt;
    }

    fn steer_toward(&mut self, target: Vec3, turn_rate: f32, dt: f32) {
        let desired = (target - self.position).normalize_or(self.velocity.normalize());
        let current = self.velocity.normalize_or(desired);
        let t = (turn_rate * dt).clamp(0.0, 1.0);
        let speed = self.velocity.length();
        self.velocity = current.lerp(&desired, t).normalize_or(current) * speed;
    }

    fn perturb_candidates<R: Rng>(&mut self, dt: f32, rng: &mut R) {
        let step = self.velocity * dt;
        for candidate in self.candidates.iter_mut() {
            let jitter = Vec3::new(
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
                rng.gen_range(-1.0..=1.0),
            ) * (MULTI_STATE_JITTER * dt);
            let mut next = *candidate + step + jitter;
            let offset = next - self.position;
            if offset.length() > MULTI_STATE_MAX_OFFSET {
                next = self.position + offset.normalize() * MULTI_STATE_MAX_OFFSET;
            }
            *candidate = next;
        }
    }

    /// Whether `entity` was already hit during the current pass.
    pub fn already_hit(&self, entity: Entity) -> bool {
        self.hit_targets.contains(&entity)
    }

    pub fn mark_hit(&mut self, entity: Entity) {
        if !self.hit_targets.contains(&entity) {
            self.hit_targets.push(entity);
        }
    }

    /// Sphere/segment test against a target.
    pub fn check_collision(&self, target: Vec3, target_radius: f32) -> bool {
        if !self.active || self.stuck {
            return false;
        }
        let reach = self.radius + target_radius;
        match self.movement {
            MovementKind::Beam => {
                point_segment_distance(&target, &self.origin, &self.beam_end) <= reach
            }
            MovementKind::MultiState if !self.candidates.is_empty() => self
                .candidates
                .iter()
                .any(|c| c.distance_squared(&target) <= reach * reach),
            _ => self.position.distance_squared(&target) <= reach * reach,
        }
    }

    /// Damage against a target at `target`, through the full pipeline.
    pub fn calculate_damage_info(&self, target: Vec3) -> DamageInfo {
        let falloff = self
            .uses_falloff
            .then(|| (self.origin.distance(&target), self.range));
        let direct = compute_hit_damage(&HitInputs {
            base: self.damage,
            charge_ratio: self.charge_ratio,
            level_multiplier: self.level_multiplier,
            evolution_multiplier: self.evolution_multiplier,
            element: self.element,
            falloff,
        });
        let impact = self.impact_point(target);
        let splash = splash_damage(
            self.splash_damage,
            self.splash_radius,
            impact.distance(&target),
        );
        DamageInfo {
            direct,
            splash,
            total: clamp_damage(direct.total + splash),
            critical: self.critical,
            status: self.on_hit,
        }
    }

    /// Closest point of the projectile's shape to `target`.
    fn impact_point(&self, target: Vec3) -> Vec3 {
        match self.movement {
            MovementKind::Beam => {
                let seg = self.beam_end - self.origin;
                let len_sq = seg.length_squared();
                if len_sq <= f32::EPSILON {
                    return self.origin;
                }
                let t = ((target - self.origin).dot(&seg) / len_sq).clamp(0.0, 1.0);
                self.origin + seg * t
            }
            MovementKind::MultiState if !self.candidates.is_empty() => self
                .candidates
                .iter()
                .copied()
                .min_by(|a, b| a.distance_squared(&target).total_cmp(&b.distance_squared(&target)))
                .unwrap_or(self.position),
            _ => self.position,
        }
    }

    /// Resolve a hit on a target at `target`.
    ///
    /// Penetration is checked first, then ricochet, then fuse, then
    /// termination with splash and cluster bursts.
    pub fn on_hit_target(&mut self, target: Vec3, entity: Option<Entity>) -> HitResolution {
        let impact = self.impact_point(target);
        if !self.candidates.is_empty() {
            // First hit collapses every candidate into the one that connected.
            self.position = impact;
            self.candidates.clear();
        }
        self.has_hit = true;
        self.ever_hit = true;
        if let Some(e) = entity {
            self.mark_hit(e);
        }

        if self.penetration_left > 0 {
            self.penetration_left -= 1;
            self.damage *= 1.0 - PENETRATION_DAMAGE_LOSS;
            self.velocity = self.velocity * PENETRATION_SPEED_RETENTION;
            self.has_hit = false;
            return HitResolution::Penetrated;
        }

        if self.ricochets_left > 0 && !self.is_beam() {
            self.ricochets_left -= 1;
            let normal = (self.position - target).normalize_or(-self.velocity.normalize());
            self.velocity = self.velocity.reflect(&normal);
            self.damage *= RICOCHET_RETENTION;
            self.has_hit = false;
            // Only the surface it bounced off stays excluded.
            self.hit_targets.retain(|t| Some(*t) == entity);
            return HitResolution::Ricocheted;
        }

        if self.fuse.is_some() {
            self.position = impact;
            self.velocity = Vec3::ZERO;
            self.acceleration = Vec3::ZERO;
            self.stuck = true;
            return HitResolution::Stuck;
        }

        self.active = false;
        HitResolution::Terminated(self.detonation_bursts(entity))
    }

    fn detonation_bursts(&self, exclude: Option<Entity>) -> Vec<AreaBurst> {
        let mut bursts = Vec::new();
        if self.splash_radius > 0.0 && self.splash_damage > 0.0 {
            bursts.push(AreaBurst {
                weapon: self.weapon,
                center: self.position,
                radius: self.splash_radius,
                damage: self.splash_damage,
                element: self.element,
                exclude,
            });
        }
        if let Some(cluster) = self.cluster {
            bursts.extend(cluster_bursts(
                self.weapon,
                self.element,
                self.position,
                self.velocity,
                self.splash_radius,
                self.splash_damage,
                &cluster,
            ));
        }
        bursts
    }
}

/// Child bursts arranged radially around `center`, perpendicular to travel.
pub fn cluster_bursts(
    weapon: WeaponKind,
    element: Element,
    center: Vec3,
    velocity: Vec3,
    parent_radius: f32,
    parent_damage: f32,
    spec: &ClusterSpec,
) -> Vec<AreaBurst> {
    let count = spec.count.min(MAX_CLUSTER_CHILDREN) as usize;
    if count == 0 {
        return Vec::new();
    }
    let axis = velocity.normalize_or(Vec3::UP);
    let start = axis.any_perpendicular();
    (0..count)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            let offset = start.rotate_around(&axis, angle) * spec.spread;
            AreaBurst {
                weapon,
                center: center + offset,
                radius: parent_radius * spec.radius_factor,
                damage: parent_damage * spec.damage_factor,
                element,
                exclude: None,
            }
        })
        .collect()
}
