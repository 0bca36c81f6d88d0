//! Collision response
//!
//! Wall contacts bounce the normal component of velocity with restitution
//! and push the body clear. Body contacts exchange an equal and opposite
//! impulse along the contact normal, weighted by inverse mass.
//!
//! For restitution below 1 kinetic energy never increases; at exactly 1 it
//! is conserved up to floating-point error.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::KinematicBody;
use super::collision::{Contact, disc_bounds_contact};
use super::wall::WallRef;

/// What a resolved collision did, returned instead of calling back into gameplay
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionOutcome {
    /// Struck a wall
    Wall {
        wall: WallRef,
        point: Vec2,
        normal: Vec2,
        impulse: f32,
    },
    /// Struck another disc
    Body { normal: Vec2, impulse: f32 },
    /// Struck the arena boundary
    Edge { normal: Vec2, impulse: f32 },
}

impl CollisionOutcome {
    pub fn normal(&self) -> Vec2 {
        match self {
            CollisionOutcome::Wall { normal, .. }
            | CollisionOutcome::Body { normal, .. }
            | CollisionOutcome::Edge { normal, .. } => *normal,
        }
    }

    pub fn impulse(&self) -> f32 {
        match self {
            CollisionOutcome::Wall { impulse, .. }
            | CollisionOutcome::Body { impulse, .. }
            | CollisionOutcome::Edge { impulse, .. } => *impulse,
        }
    }

    /// The wall struck, if this was a wall contact
    pub fn wall(&self) -> Option<WallRef> {
        match self {
            CollisionOutcome::Wall { wall, .. } => Some(*wall),
            _ => None,
        }
    }
}

/// Bounce a velocity off a surface
///
/// Only an approaching normal component is touched: it is negated and
/// scaled by `restitution`. The tangential component is left alone.
#[inline]
pub fn bounce_velocity(velocity: Vec2, normal: Vec2, restitution: f32) -> Vec2 {
    let vn = velocity.dot(normal);
    if vn >= 0.0 {
        return velocity;
    }
    velocity - (1.0 + restitution.clamp(0.0, 1.0)) * vn * normal
}

/// Resolve a disc against a wall contact
///
/// Moves the body to the contact position, pushes it out along the normal
/// by the penetration depth plus `margin`, and bounces its velocity.
/// Returns the velocity change along the normal (impulse per unit mass).
pub fn resolve_wall(
    body: &mut KinematicBody,
    contact: &Contact,
    restitution: f32,
    margin: f32,
) -> f32 {
    body.pos = contact.position + contact.normal * (contact.penetration + margin.max(0.0));

    let before = body.vel;
    body.vel = bounce_velocity(body.vel, contact.normal, restitution);
    (body.vel - before).dot(contact.normal)
}

/// Resolve two overlapping discs with a momentum-conserving impulse
///
/// Both bodies are separated along the contact normal in proportion to
/// their inverse masses, then receive equal and opposite impulses. Returns
/// `None` when the discs do not overlap or both are immovable, otherwise
/// the impulse magnitude (zero if they were already separating).
pub fn resolve_bodies(
    a: &mut KinematicBody,
    b: &mut KinematicBody,
    restitution: f32,
) -> Option<(Vec2, f32)> {
    let delta = a.pos - b.pos;
    let reach = a.radius() + b.radius();
    let dist_sq = delta.length_squared();
    if dist_sq >= reach * reach {
        return None;
    }

    let inv_sum = a.inverse_mass + b.inverse_mass;
    if inv_sum <= 0.0 {
        return None;
    }

    let dist = dist_sq.sqrt();
    // Coincident centres have no meaningful direction
    let normal = if dist > 1e-6 { delta / dist } else { Vec2::X };

    let overlap = reach - dist;
    a.pos += normal * overlap * (a.inverse_mass / inv_sum);
    b.pos -= normal * overlap * (b.inverse_mass / inv_sum);

    let vn = (a.vel - b.vel).dot(normal);
    if vn >= 0.0 {
        return Some((normal, 0.0));
    }

    let j = -(1.0 + restitution.clamp(0.0, 1.0)) * vn / inv_sum;
    a.vel += normal * (j * a.inverse_mass);
    b.vel -= normal * (j * b.inverse_mass);
    Some((normal, j))
}

/// Resolve a body against an immovable disc it has no handle to
pub fn resolve_against_static(
    body: &mut KinematicBody,
    other_pos: Vec2,
    other_radius: f32,
    restitution: f32,
) -> Option<(Vec2, f32)> {
    let mut anchor = KinematicBody::immovable(other_pos, other_radius);
    resolve_bodies(body, &mut anchor, restitution)
}

/// Keep a body inside the arena rectangle `[0, size]`
///
/// Each violated axis is clamped and bounced. Returns the combined inward
/// normal and total velocity change.
pub fn resolve_edge(body: &mut KinematicBody, size: Vec2, restitution: f32) -> Option<(Vec2, f32)> {
    let mut normal_sum = Vec2::ZERO;
    let mut impulse = 0.0;

    // At most one pass per axis
    for _ in 0..2 {
        let Some((normal, depth)) = disc_bounds_contact(body.pos, body.radius(), size) else {
            break;
        };
        body.pos += normal * depth;
        let before = body.vel;
        body.vel = bounce_velocity(body.vel, normal, restitution);
        impulse += (body.vel - before).dot(normal);
        normal_sum += normal;
    }

    if normal_sum == Vec2::ZERO {
        None
    } else {
        Some((normal_sum.normalize(), impulse))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::collision::{closest_point_on_segment, disc_segment_contact};
    use crate::sim::wall::Segment;

    #[test]
    fn test_bounce_velocity_scales_normal_only() {
        let vel = Vec2::new(3.0, -4.0);
        let normal = Vec2::Y;
        let out = bounce_velocity(vel, normal, 0.5);
        assert!((out.x - 3.0).abs() < 0.0001);
        assert!((out.y - 2.0).abs() < 0.0001);
    }

    #[test]
    fn test_bounce_velocity_full_reflection() {
        let out = bounce_velocity(Vec2::new(100.0, 0.0), Vec2::NEG_X, 1.0);
        assert!((out.x + 100.0).abs() < 0.001);
        assert!(out.y.abs() < 0.001);
    }

    #[test]
    fn test_bounce_ignores_separating_velocity() {
        let vel = Vec2::new(0.0, 5.0);
        assert_eq!(bounce_velocity(vel, Vec2::Y, 0.3), vel);
    }

    #[test]
    fn test_resolve_wall_pushes_clear_of_segment() {
        let wall = Segment::new(Vec2::new(150.0, 90.0), Vec2::new(150.0, 110.0));
        let mut body = KinematicBody::new(Vec2::new(150.0, 100.0), 6.0);
        body.vel = Vec2::new(2.0, 1.0);

        let contact = disc_segment_contact(body.pos, body.radius(), &wall);
        assert!(contact.hit);
        let margin = body.radius() * 0.5;
        resolve_wall(&mut body, &contact, 0.85, margin);

        let closest = closest_point_on_segment(body.pos, &wall);
        assert!(body.pos.distance(closest) >= body.radius());
    }

    #[test]
    fn test_resolve_wall_energy_bound() {
        let wall = Segment::new(Vec2::new(0.0, 0.0), Vec2::new(100.0, 0.0));
        let mut body = KinematicBody::new(Vec2::new(50.0, 3.0), 5.0);
        body.vel = Vec2::new(4.0, -6.0);

        let contact = disc_segment_contact(body.pos, body.radius(), &wall);
        let impulse = resolve_wall(&mut body, &contact, 0.5, 0.0);

        assert!((body.vel.x - 4.0).abs() < 0.0001);
        assert!((body.vel.y - 3.0).abs() < 0.0001);
        assert!((impulse - 9.0).abs() < 0.0001);
        assert!(body.vel.length() <= Vec2::new(4.0, -6.0).length());
    }

    #[test]
    fn test_head_on_equal_masses_exchange_velocities() {
        let mut a = KinematicBody::new(Vec2::new(-4.0, 0.0), 5.0);
        let mut b = KinematicBody::new(Vec2::new(4.0, 0.0), 5.0);
        a.vel = Vec2::new(3.0, 0.0);
        b.vel = Vec2::new(-3.0, 0.0);

        let (_, impulse) = resolve_bodies(&mut a, &mut b, 1.0).expect("overlapping");
        assert!(impulse > 0.0);
        assert!((a.vel - Vec2::new(-3.0, 0.0)).length() < 0.0001);
        assert!((b.vel - Vec2::new(3.0, 0.0)).length() < 0.0001);

        // Separated to touching distance
        assert!(a.pos.distance(b.pos) >= 10.0 - 0.0001);
    }

    #[test]
    fn test_immovable_body_does_not_move() {
        let mut ball = KinematicBody::new(Vec2::new(0.0, 0.0), 5.0);
        ball.vel = Vec2::new(2.0, 0.0);
        let mut post = KinematicBody::immovable(Vec2::new(8.0, 0.0), 5.0);

        resolve_bodies(&mut ball, &mut post, 1.0).expect("overlapping");
        assert_eq!(post.pos, Vec2::new(8.0, 0.0));
        assert_eq!(post.vel, Vec2::ZERO);
        assert!((ball.vel.x + 2.0).abs() < 0.0001);
        assert!(ball.pos.distance(post.pos) >= 10.0 - 0.0001);
    }

    #[test]
    fn test_two_immovable_bodies_are_ignored() {
        let mut a = KinematicBody::immovable(Vec2::ZERO, 5.0);
        let mut b = KinematicBody::immovable(Vec2::new(1.0, 0.0), 5.0);
        assert!(resolve_bodies(&mut a, &mut b, 1.0).is_none());
    }

    #[test]
    fn test_coincident_centres_pick_a_normal() {
        let mut a = KinematicBody::new(Vec2::ONE, 2.0);
        let mut b = KinematicBody::new(Vec2::ONE, 2.0);
        let (normal, _) = resolve_bodies(&mut a, &mut b, 0.5).expect("overlapping");
        assert_eq!(normal, Vec2::X);
        assert!(a.pos.distance(b.pos) >= 4.0 - 0.0001);
    }

    #[test]
    fn test_resolve_against_static() {
        let mut body = KinematicBody::new(Vec2::new(0.0, 10.0), 3.0);
        body.vel = Vec2::new(0.0, 4.0);
        let (normal, impulse) =
            resolve_against_static(&mut body, Vec2::new(0.0, 14.0), 3.0, 0.5).expect("hit");
        assert!((normal - Vec2::NEG_Y).length() < 0.0001);
        assert!((impulse - 6.0).abs() < 0.0001);
        assert!((body.vel.y + 2.0).abs() < 0.0001);
    }

    #[test]
    fn test_resolve_edge_corner() {
        let mut body = KinematicBody::new(Vec2::new(2.0, 1.0), 4.0);
        body.vel = Vec2::new(-1.0, -2.0);
        let (normal, _) = resolve_edge(&mut body, Vec2::new(100.0, 100.0), 1.0).expect("corner");

        assert!(normal.x > 0.0 && normal.y > 0.0);
        assert_eq!(body.pos, Vec2::new(4.0, 4.0));
        assert!((body.vel - Vec2::new(1.0, 2.0)).length() < 0.0001);
    }
}
