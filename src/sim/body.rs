//! Kinematic disc bodies
//!
//! A body owns its position, velocity and radius. The engine only touches
//! them through the operations here.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::swept_disc_segment_with_step;
use super::maze::WallSource;
use super::response::{
    CollisionOutcome, resolve_against_static, resolve_bodies, resolve_edge, resolve_wall,
};
use super::wall::WallRef;
use crate::consts::MIN_BODY_RADIUS;
use crate::settings::PhysicsSettings;

/// A moving disc
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KinematicBody {
    pub pos: Vec2,
    /// Position at the start of the current step (swept wall checks start here)
    pub prev_pos: Vec2,
    pub vel: Vec2,
    radius: f32,
    /// 0 means immovable
    pub inverse_mass: f32,
    /// Speed cap applied after integration and after every resolution
    pub max_speed: f32,
    /// Velocity retained per logical frame
    pub friction: f32,
}

impl KinematicBody {
    /// Unit-mass body with no speed cap and no friction
    pub fn new(pos: Vec2, radius: f32) -> Self {
        Self {
            pos,
            prev_pos: pos,
            vel: Vec2::ZERO,
            radius: sanitize_radius(radius),
            inverse_mass: 1.0,
            max_speed: f32::INFINITY,
            friction: 1.0,
        }
    }

    /// A body that never moves and acts as infinite mass in collisions
    pub fn immovable(pos: Vec2, radius: f32) -> Self {
        Self {
            inverse_mass: 0.0,
            ..Self::new(pos, radius)
        }
    }

    /// Non-positive or non-finite mass makes the body immovable
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.inverse_mass = if mass.is_finite() && mass > 0.0 { 1.0 / mass } else { 0.0 };
        self
    }

    pub fn with_max_speed(mut self, max_speed: f32) -> Self {
        self.max_speed = max_speed.max(0.0);
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction.clamp(0.0, 1.0);
        self
    }

    pub fn with_velocity(mut self, vel: Vec2) -> Self {
        self.vel = vel;
        self
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn set_radius(&mut self, radius: f32) {
        self.radius = sanitize_radius(radius);
    }

    #[inline]
    pub fn is_immovable(&self) -> bool {
        self.inverse_mass <= 0.0
    }

    /// Mass (infinite for immovable bodies)
    pub fn mass(&self) -> f32 {
        if self.is_immovable() {
            f32::INFINITY
        } else {
            1.0 / self.inverse_mass
        }
    }

    #[inline]
    pub fn speed(&self) -> f32 {
        self.vel.length()
    }

    /// Linear momentum (zero for immovable bodies)
    pub fn momentum(&self) -> Vec2 {
        if self.is_immovable() {
            Vec2::ZERO
        } else {
            self.vel / self.inverse_mass
        }
    }

    pub fn kinetic_energy(&self) -> f32 {
        if self.is_immovable() {
            0.0
        } else {
            0.5 * self.vel.length_squared() / self.inverse_mass
        }
    }

    /// Change velocity by `impulse / mass`
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.vel += impulse * self.inverse_mass;
    }

    /// Clamp speed to `max_speed`; a non-finite velocity is zeroed
    pub fn clamp_speed(&mut self) {
        if !self.vel.is_finite() {
            log::warn!("Non-finite velocity reset to zero");
            self.vel = Vec2::ZERO;
            return;
        }
        let speed = self.vel.length();
        if speed > self.max_speed {
            self.vel *= self.max_speed / speed;
        }
    }

    /// Integrate acceleration, apply friction, clamp, then advance position
    ///
    /// Stores the step-start position in `prev_pos`. Immovable bodies stay put.
    pub fn integrate(&mut self, accel: Vec2, dt: f32) {
        self.prev_pos = self.pos;
        if self.is_immovable() {
            return;
        }
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        self.vel += accel * dt;
        if self.friction < 1.0 {
            self.vel *= self.friction.powf(dt);
        }
        self.clamp_speed();
        self.pos += self.vel * dt;
    }

    /// One full physics step against walls
    ///
    /// Integrates, then resolves up to `settings.contact_iterations` wall
    /// contacts along the path, re-sweeping whatever displacement remains
    /// after each bounce. Speed is clamped again afterwards.
    pub fn step(
        &mut self,
        accel: Vec2,
        dt: f32,
        walls: WallSource<'_>,
        settings: &PhysicsSettings,
    ) -> Vec<CollisionOutcome> {
        self.integrate(accel, dt);

        let mut outcomes = Vec::new();
        let mut start = self.prev_pos;
        let mut remaining = 1.0;
        for iteration in 0..settings.contact_iterations.max(1) {
            if iteration > 0 {
                // Continue along the bounced velocity for the unused part of the step
                if remaining <= 0.0 || self.vel == Vec2::ZERO {
                    break;
                }
                start = self.pos;
                self.pos += self.vel * dt * remaining;
            }

            let Some((outcome, fraction)) = self.sweep_walls(start, walls, settings) else {
                break;
            };
            outcomes.push(outcome);
            remaining *= 1.0 - fraction;
        }

        self.clamp_speed();
        outcomes
    }

    /// Check the path from `prev_pos` to `pos` against walls
    ///
    /// Resolves the earliest contact only and reports which wall was struck.
    pub fn check_wall_collision(
        &mut self,
        walls: WallSource<'_>,
        settings: &PhysicsSettings,
    ) -> Option<CollisionOutcome> {
        self.sweep_walls(self.prev_pos, walls, settings)
            .map(|(outcome, _)| outcome)
    }

    fn sweep_walls(
        &mut self,
        start: Vec2,
        walls: WallSource<'_>,
        settings: &PhysicsSettings,
    ) -> Option<(CollisionOutcome, f32)> {
        let query_radius = self.radius * settings.path_query_scale;
        let mut earliest: Option<(super::collision::Contact, WallRef)> = None;

        for obstacle in walls.candidates(start, self.pos, query_radius) {
            if !obstacle.is_active() {
                continue;
            }
            let contact = swept_disc_segment_with_step(
                start,
                self.pos,
                self.radius,
                &obstacle.segment(),
                settings.sweep_step_fraction,
            );
            // Strict comparison keeps the lowest id on ties
            if contact.hit && earliest.is_none_or(|(best, _)| contact.fraction < best.fraction) {
                earliest = Some((contact, obstacle.wall_ref()));
            }
        }

        let (contact, wall) = earliest?;
        let margin = self.radius * settings.push_margin_fraction;
        let impulse = resolve_wall(self, &contact, settings.restitution, margin);
        Some((
            CollisionOutcome::Wall {
                wall,
                point: contact.point,
                normal: contact.normal,
                impulse,
            },
            contact.fraction,
        ))
    }

    /// Check and resolve overlap with another disc
    ///
    /// With `other` supplied, both bodies receive equal and opposite impulses
    /// and `other_pos`/`other_radius` are taken from it. Without it the other
    /// disc is treated as immovable.
    pub fn check_circle_collision(
        &mut self,
        other_pos: Vec2,
        other_radius: f32,
        other: Option<&mut KinematicBody>,
        restitution: f32,
    ) -> Option<CollisionOutcome> {
        let (normal, impulse) = match other {
            Some(other) => resolve_bodies(self, other, restitution)?,
            None => resolve_against_static(self, other_pos, other_radius, restitution)?,
        };
        self.clamp_speed();
        Some(CollisionOutcome::Body { normal, impulse })
    }

    /// Bounce off the arena rectangle `[0, size]`
    pub fn check_edge_collision(
        &mut self,
        size: Vec2,
        restitution: f32,
    ) -> Option<CollisionOutcome> {
        let (normal, impulse) = resolve_edge(self, size, restitution)?;
        self.clamp_speed();
        Some(CollisionOutcome::Edge { normal, impulse })
    }
}

fn sanitize_radius(radius: f32) -> f32 {
    if radius.is_finite() && radius > MIN_BODY_RADIUS {
        radius
    } else {
        MIN_BODY_RADIUS
    }
}
