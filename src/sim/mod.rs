//! Deterministic simulation module
//!
//! All physics lives here. This module must be pure and deterministic:
//! - Variable `dt` multiplier, no wall-clock reads
//! - Stable iteration order (by entity ID, by wall ID)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod grid;
pub mod maze;
pub mod response;
pub mod state;
pub mod tick;
pub mod wall;

pub use body::KinematicBody;
pub use collision::{
    Contact, circles_overlap, closest_point_on_segment, disc_segment_contact, swept_disc_segment,
    swept_disc_segment_with_step, wall_normal,
};
pub use grid::SpatialIndex;
pub use maze::{Maze, WallSource};
pub use response::{
    CollisionOutcome, bounce_velocity, resolve_against_static, resolve_bodies, resolve_edge,
    resolve_wall,
};
pub use state::{Entity, PROJECTILE_MASS, Role, World};
pub use tick::{CollisionEvent, TickInput, tick};
pub use wall::{Obstacle, Segment, WallId, WallRef, WallSegment};
