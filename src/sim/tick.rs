//! Fixed timestep simulation tick
//!
//! Advances the world one step and reports every collision it resolved.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::circles_overlap;
use super::maze::{Maze, WallSource};
use super::response::CollisionOutcome;
use super::state::{Entity, Role, World};
use crate::consts::*;
use crate::settings::PhysicsSettings;
use crate::{heading_to_vec, normalize_angle};

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Turn direction: -1 counter-clockwise, +1 clockwise
    pub rotate: f32,
    /// Accelerate along the ship's heading
    pub thrust: bool,
    /// Fire a projectile from the ship
    pub fire: bool,
}

/// One resolved collision, attributed to the entity that moved into it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionEvent {
    pub entity: u32,
    /// The other entity for body contacts
    pub other: Option<u32>,
    pub outcome: CollisionOutcome,
    /// A wall hit that destroyed the wall
    pub wall_destroyed: bool,
}

impl CollisionEvent {
    fn new(entity: u32, outcome: CollisionOutcome) -> Self {
        Self {
            entity,
            other: None,
            outcome,
            wall_destroyed: false,
        }
    }
}

/// Advance the world by one step
///
/// `dt` is a multiplier of the logical frame (1.0 = 1/60 s).
pub fn tick(world: &mut World, input: &TickInput, dt: f32) -> Vec<CollisionEvent> {
    let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

    apply_input(world, input, dt);

    let World {
        maze,
        entities,
        settings,
        ..
    } = world;

    let mut events = Vec::new();

    // Movement and walls, in id order; a wall destroyed here is already
    // gone for every entity after this one
    for entity in entities.iter_mut().filter(|e| e.active) {
        step_entity(entity, maze, settings, dt, &mut events);
    }

    // Body pairs (i < j)
    for i in 0..entities.len() {
        let (head, tail) = entities.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut() {
            if !a.active {
                break;
            }
            if b.active {
                resolve_pair(a, b, settings.restitution, &mut events);
            }
        }
    }

    world.entities.retain(|e| e.active);
    world.normalize_order();
    world.time_ticks += 1;

    if !events.is_empty() {
        log::trace!("Tick {}: {} collisions", world.time_ticks, events.len());
    }
    events
}

/// Steer the ship and fire
fn apply_input(world: &mut World, input: &TickInput, dt: f32) {
    let Some(ship) = world
        .entities
        .iter_mut()
        .find(|e| e.active && e.role == Role::Ship)
    else {
        return;
    };

    let turn = if input.rotate.is_finite() {
        input.rotate.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    ship.heading = normalize_angle(ship.heading + turn * SHIP_ROTATION_SPEED * dt);
    ship.accel = if input.thrust {
        heading_to_vec(ship.heading) * SHIP_THRUST_FORCE
    } else {
        Vec2::ZERO
    };

    let id = ship.id;
    if input.fire {
        world.fire(id, false);
    }
}

fn step_entity(
    entity: &mut Entity,
    maze: &mut Maze,
    settings: &PhysicsSettings,
    dt: f32,
    events: &mut Vec<CollisionEvent>,
) {
    if entity.role == Role::Anchor {
        return;
    }

    let outcomes = entity
        .body
        .step(entity.accel, dt, WallSource::Maze(maze), settings);

    match &mut entity.role {
        Role::Projectile { ttl, hostile } => {
            if let Some(&outcome) = outcomes.first() {
                entity.active = false;
                let mut event = CollisionEvent::new(entity.id, outcome);
                // Only the player's shots chip walls
                if !*hostile {
                    if let Some(id) = outcome.wall().and_then(|w| w.maze_id()) {
                        event.wall_destroyed = maze.damage_wall(id);
                    }
                }
                events.push(event);
                return;
            }

            *ttl = ttl.saturating_sub(1);
            let pos = entity.body.pos;
            let size = maze.size();
            let slack = PROJECTILE_BOUNDS_SLACK;
            if *ttl == 0
                || pos.x < -slack
                || pos.y < -slack
                || pos.x > size.x + slack
                || pos.y > size.y + slack
            {
                entity.active = false;
            }
        }
        _ => {
            events.extend(outcomes.into_iter().map(|o| CollisionEvent::new(entity.id, o)));
            if let Some(outcome) = entity
                .body
                .check_edge_collision(maze.size(), settings.restitution)
            {
                events.push(CollisionEvent::new(entity.id, outcome));
            }
        }
    }
}

/// Whether a projectile can hit this entity
fn is_target(projectile_hostile: bool, target: &Entity) -> bool {
    match target.role {
        Role::Ship => projectile_hostile,
        Role::Enemy | Role::Anchor => !projectile_hostile,
        Role::Projectile { .. } => false,
    }
}

fn resolve_pair(
    a: &mut Entity,
    b: &mut Entity,
    restitution: f32,
    events: &mut Vec<CollisionEvent>,
) {
    match (a.role, b.role) {
        (Role::Projectile { hostile, .. }, _) => projectile_hit(a, hostile, b, events),
        (_, Role::Projectile { hostile, .. }) => projectile_hit(b, hostile, a, events),
        _ => {
            let other_pos = b.body.pos;
            let other_radius = b.body.radius();
            let outcome = a.body.check_circle_collision(
                other_pos,
                other_radius,
                Some(&mut b.body),
                restitution,
            );
            if let Some(outcome) = outcome {
                b.body.clamp_speed();
                events.push(CollisionEvent {
                    other: Some(b.id),
                    ..CollisionEvent::new(a.id, outcome)
                });
            }
        }
    }
}

/// A projectile hands its momentum to the target and is spent
fn projectile_hit(
    projectile: &mut Entity,
    hostile: bool,
    target: &mut Entity,
    events: &mut Vec<CollisionEvent>,
) {
    if !is_target(hostile, target) {
        return;
    }
    let p = &projectile.body;
    if !circles_overlap(p.pos, p.radius(), target.body.pos, target.body.radius()) {
        return;
    }

    let momentum = p.momentum();
    let normal = (p.pos - target.body.pos).try_normalize().unwrap_or(Vec2::X);
    target.body.apply_impulse(momentum);
    target.body.clamp_speed();
    projectile.active = false;

    events.push(CollisionEvent {
        other: Some(target.id),
        ..CollisionEvent::new(
            projectile.id,
            CollisionOutcome::Body {
                normal,
                impulse: momentum.length(),
            },
        )
    });
}
