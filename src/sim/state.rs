//! World state and entity types
//!
//! Everything a tick reads or writes lives here. Entities stay sorted by id
//! so iteration order is stable.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::KinematicBody;
use super::maze::Maze;
use crate::consts::*;
use crate::heading_to_vec;
use crate::settings::PhysicsSettings;

/// Projectiles are light; a hit nudges the target rather than stopping it
pub const PROJECTILE_MASS: f32 = 0.1;

/// What an entity is, which decides how a tick treats it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// Player-controlled thruster ship
    Ship,
    /// Hostile disc
    Enemy,
    /// Shot fired by the ship (`hostile = false`) or an enemy
    Projectile { ttl: u32, hostile: bool },
    /// Immovable disc obstacle
    Anchor,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: u32,
    pub role: Role,
    pub body: KinematicBody,
    /// Acceleration applied on the next step (pixels/frame²)
    pub accel: Vec2,
    /// Facing in degrees (0 = right, 90 = down)
    pub heading: f32,
    pub active: bool,
}

impl Entity {
    pub fn is_projectile(&self) -> bool {
        matches!(self.role, Role::Projectile { .. })
    }
}

/// Complete simulation state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub maze: Maze,
    /// Live entities, sorted by id
    pub entities: Vec<Entity>,
    pub settings: PhysicsSettings,
    /// Simulation tick counter
    pub time_ticks: u64,
    next_id: u32,
}

impl World {
    pub fn new(maze: Maze, settings: PhysicsSettings) -> Self {
        Self {
            maze,
            entities: Vec::new(),
            settings: settings.sanitized(),
            time_ticks: 0,
            next_id: 1,
        }
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn spawn(&mut self, role: Role, body: KinematicBody, heading: f32) -> u32 {
        let id = self.next_entity_id();
        self.entities.push(Entity {
            id,
            role,
            body,
            accel: Vec2::ZERO,
            heading,
            active: true,
        });
        id
    }

    pub fn spawn_ship(&mut self, pos: Vec2) -> u32 {
        let body = KinematicBody::new(pos, SHIP_RADIUS)
            .with_max_speed(SHIP_MAX_SPEED)
            .with_friction(SHIP_FRICTION);
        self.spawn(Role::Ship, body, 0.0)
    }

    pub fn spawn_enemy(&mut self, pos: Vec2, vel: Vec2) -> u32 {
        let body = KinematicBody::new(pos, ENEMY_RADIUS)
            .with_max_speed(ENEMY_MAX_SPEED)
            .with_velocity(vel);
        self.spawn(Role::Enemy, body, 0.0)
    }

    pub fn spawn_anchor(&mut self, pos: Vec2) -> u32 {
        self.spawn(Role::Anchor, KinematicBody::immovable(pos, ANCHOR_RADIUS), 0.0)
    }

    /// Spawn a projectile travelling along `heading` (degrees)
    pub fn spawn_projectile(&mut self, pos: Vec2, heading: f32, hostile: bool) -> u32 {
        let body = KinematicBody::new(pos, PROJECTILE_RADIUS)
            .with_mass(PROJECTILE_MASS)
            .with_velocity(heading_to_vec(heading) * PROJECTILE_SPEED);
        let role = Role::Projectile {
            ttl: PROJECTILE_LIFETIME,
            hostile,
        };
        self.spawn(role, body, heading)
    }

    /// Fire from the front of an entity along its heading
    pub fn fire(&mut self, shooter: u32, hostile: bool) -> Option<u32> {
        let (pos, heading, reach) = {
            let e = self.entity(shooter)?;
            (e.body.pos, e.heading, e.body.radius())
        };
        let muzzle = pos + heading_to_vec(heading) * (reach + PROJECTILE_RADIUS);
        Some(self.spawn_projectile(muzzle, heading, hostile))
    }

    pub fn entity(&self, id: u32) -> Option<&Entity> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.entities[i])
    }

    pub fn entity_mut(&mut self, id: u32) -> Option<&mut Entity> {
        self.entities
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &mut self.entities[i])
    }

    /// The first live ship
    pub fn ship(&self) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.active && e.role == Role::Ship)
    }

    /// Ensure entities are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.entities.sort_by_key(|e| e.id);
    }

    /// Total kinetic energy of every movable entity
    pub fn kinetic_energy(&self) -> f32 {
        self.entities.iter().map(|e| e.body.kinetic_energy()).sum()
    }
}
