//! Wall geometry: raw line segments and destructible maze walls
//!
//! A wall is an immutable segment plus mutable damage state. Once a wall
//! goes inactive it stays inactive.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::DEGENERATE_LENGTH_SQ;

/// Identifier of a maze wall (its index in the maze's wall list)
pub type WallId = u32;

/// A static line segment obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub start: Vec2,
    pub end: Vec2,
}

impl Segment {
    pub fn new(start: Vec2, end: Vec2) -> Self {
        Self { start, end }
    }

    /// Vector from start to end
    #[inline]
    pub fn direction(&self) -> Vec2 {
        self.end - self.start
    }

    #[inline]
    pub fn length_squared(&self) -> f32 {
        self.direction().length_squared()
    }

    /// True when the segment is too short to project onto
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.length_squared() < DEGENERATE_LENGTH_SQ
    }

    pub fn midpoint(&self) -> Vec2 {
        (self.start + self.end) * 0.5
    }

    /// Axis-aligned bounds as (min, max)
    pub fn bounds(&self) -> (Vec2, Vec2) {
        (self.start.min(self.end), self.start.max(self.end))
    }
}

/// A destructible wall segment owned by a maze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WallSegment {
    pub id: WallId,
    pub segment: Segment,
    /// Remaining hit points
    pub hit_points: u32,
    /// Inactive walls are excluded from every query
    active: bool,
}

impl WallSegment {
    pub fn new(id: WallId, start: Vec2, end: Vec2, hit_points: u32) -> Self {
        Self {
            id,
            segment: Segment::new(start, end),
            hit_points,
            active: true,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Take one hit. Returns true if this hit destroyed the wall.
    ///
    /// Damaging an already inactive wall does nothing and returns false.
    pub fn damage(&mut self) -> bool {
        if !self.active {
            return false;
        }
        self.hit_points = self.hit_points.saturating_sub(1);
        if self.hit_points == 0 {
            self.active = false;
            return true;
        }
        false
    }
}

/// Anything a body can collide with as a wall
///
/// Resolved once at the query boundary, so collision code never has to ask
/// whether a wall can take damage.
#[derive(Debug, Clone, Copy)]
pub enum Obstacle<'a> {
    /// Caller-supplied segment, addressed by its index in the caller's slice
    Raw { index: usize, segment: Segment },
    /// Maze wall that tracks damage
    Destructible(&'a WallSegment),
}

impl Obstacle<'_> {
    pub fn segment(&self) -> Segment {
        match self {
            Obstacle::Raw { segment, .. } => *segment,
            Obstacle::Destructible(wall) => wall.segment,
        }
    }

    /// Raw segments are always live; maze walls may have been destroyed
    pub fn is_active(&self) -> bool {
        match self {
            Obstacle::Raw { .. } => true,
            Obstacle::Destructible(wall) => wall.is_active(),
        }
    }

    pub fn wall_ref(&self) -> WallRef {
        match self {
            Obstacle::Raw { index, .. } => WallRef::Raw(*index),
            Obstacle::Destructible(wall) => WallRef::Maze(wall.id),
        }
    }
}

/// Which wall a body struck
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WallRef {
    /// Index into a raw segment slice
    Raw(usize),
    /// A maze wall that can be damaged
    Maze(WallId),
}

impl WallRef {
    /// The maze wall id, if the struck wall is destructible
    pub fn maze_id(&self) -> Option<WallId> {
        match self {
            WallRef::Maze(id) => Some(*id),
            WallRef::Raw(_) => None,
        }
    }
}
