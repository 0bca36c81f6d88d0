//! Maze walls and the spatial index over them
//!
//! The maze owns its walls and keeps the index in sync: destroying a wall
//! removes it from the index before `damage_wall` returns.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::SpatialIndex;
use super::wall::{Obstacle, Segment, WallId, WallSegment};
use crate::settings::PhysicsSettings;

/// Destructible walls of one arena
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Maze {
    /// All walls ever created; a wall's id is its index here
    walls: Vec<WallSegment>,
    /// Ids of walls still standing, ascending
    active: Vec<WallId>,
    size: Vec2,
    cell_size: f32,
    /// Not persisted; call `rebuild` after deserializing
    #[serde(skip)]
    index: SpatialIndex,
}

impl Maze {
    /// Build a maze from generator output: `(start, end, hit_points)` triples
    pub fn new(
        size: Vec2,
        cell_size: f32,
        walls: impl IntoIterator<Item = (Vec2, Vec2, u32)>,
    ) -> Self {
        let walls: Vec<WallSegment> = walls
            .into_iter()
            .enumerate()
            .map(|(i, (start, end, hp))| WallSegment::new(i as WallId, start, end, hp))
            .collect();

        let mut maze = Self {
            walls,
            active: Vec::new(),
            size,
            cell_size,
            index: SpatialIndex::default(),
        };
        maze.rebuild();
        maze
    }

    /// Build with arena size and cell size taken from settings
    pub fn from_settings(
        settings: &PhysicsSettings,
        walls: impl IntoIterator<Item = (Vec2, Vec2, u32)>,
    ) -> Self {
        Self::new(settings.arena_size(), settings.cell_size, walls)
    }

    /// Re-index every active wall and recompute the active list
    pub fn rebuild(&mut self) {
        self.index = SpatialIndex::new(self.size.x, self.size.y, self.cell_size);
        self.index.build(&self.walls);
        self.active = self
            .walls
            .iter()
            .filter(|w| w.is_active())
            .map(|w| w.id)
            .collect();
        log::debug!("Maze rebuilt: {}/{} walls active", self.active.len(), self.walls.len());
    }

    pub fn wall(&self, id: WallId) -> Option<&WallSegment> {
        self.walls.get(id as usize)
    }

    /// Every wall, including destroyed ones
    pub fn walls(&self) -> &[WallSegment] {
        &self.walls
    }

    pub fn active_ids(&self) -> &[WallId] {
        &self.active
    }

    pub fn active_walls(&self) -> impl Iterator<Item = &WallSegment> + '_ {
        self.active.iter().filter_map(|&id| self.wall(id))
    }

    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Active walls near a point
    pub fn walls_near(&self, position: Vec2, radius: f32) -> Vec<&WallSegment> {
        self.resolve(self.index.query_region(position, radius))
    }

    /// Active walls that may touch a path
    pub fn walls_along(&self, start: Vec2, end: Vec2, radius: f32) -> Vec<&WallSegment> {
        self.resolve(self.index.query_path(start, end, radius))
    }

    fn resolve(&self, ids: Vec<WallId>) -> Vec<&WallSegment> {
        ids.into_iter()
            .filter_map(|id| self.wall(id))
            .filter(|w| w.is_active())
            .collect()
    }

    /// Apply one hit to a wall
    ///
    /// Returns true if the wall was destroyed by this hit. A destroyed wall
    /// leaves the index and the active list immediately. Unknown or already
    /// destroyed walls are ignored.
    pub fn damage_wall(&mut self, id: WallId) -> bool {
        let Some(wall) = self.walls.get_mut(id as usize) else {
            log::warn!("Ignoring damage to unknown wall {id}");
            return false;
        };
        if !wall.damage() {
            return false;
        }

        self.index.update(wall);
        if let Ok(pos) = self.active.binary_search(&id) {
            self.active.remove(pos);
        }
        log::debug!("Wall {id} destroyed, {} remaining", self.active.len());
        true
    }
}

/// Walls a body is tested against
#[derive(Debug, Clone, Copy)]
pub enum WallSource<'a> {
    /// Plain segments, every one tested
    Segments(&'a [Segment]),
    /// Maze walls, narrowed by the spatial index
    Maze(&'a Maze),
}

impl<'a> WallSource<'a> {
    /// Obstacles that may touch the path, in ascending id order
    pub fn candidates(&self, start: Vec2, end: Vec2, radius: f32) -> Vec<Obstacle<'a>> {
        match *self {
            WallSource::Segments(segments) => segments
                .iter()
                .enumerate()
                .map(|(index, segment)| Obstacle::Raw {
                    index,
                    segment: *segment,
                })
                .collect(),
            WallSource::Maze(maze) => maze
                .walls_along(start, end, radius)
                .into_iter()
                .map(Obstacle::Destructible)
                .collect(),
        }
    }

    /// Arena size, when the source carries one
    pub fn bounds(&self) -> Option<Vec2> {
        match self {
            WallSource::Segments(_) => None,
            WallSource::Maze(maze) => Some(maze.size()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cross_maze() -> Maze {
        Maze::new(
            Vec2::new(600.0, 600.0),
            150.0,
            [
                (Vec2::new(300.0, 0.0), Vec2::new(300.0, 600.0), 2),
                (Vec2::new(0.0, 300.0), Vec2::new(600.0, 300.0), 1),
                (Vec2::new(50.0, 50.0), Vec2::new(100.0, 50.0), 1),
            ],
        )
    }

    #[test]
    fn test_new_assigns_ids_in_order() {
        let maze = cross_maze();
        assert_eq!(maze.walls().len(), 3);
        assert_eq!(maze.active_ids(), &[0, 1, 2]);
        assert_eq!(maze.index().len(), 3);
        assert_eq!(maze.wall(1).map(|w| w.id), Some(1));
        assert!(maze.wall(9).is_none());
    }

    #[test]
    fn test_walls_near() {
        let maze = cross_maze();
        let ids: Vec<WallId> = maze
            .walls_near(Vec2::new(60.0, 60.0), 10.0)
            .iter()
            .map(|w| w.id)
            .collect();
        assert!(ids.contains(&2));
        assert!(!ids.contains(&0));
    }

    #[test]
    fn test_destroyed_wall_disappears_immediately() {
        let mut maze = cross_maze();
        let along = |m: &Maze| -> Vec<WallId> {
            m.walls_along(Vec2::new(280.0, 300.0), Vec2::new(320.0, 300.0), 6.0)
                .iter()
                .map(|w| w.id)
                .collect()
        };
        assert_eq!(along(&maze), vec![0, 1]);

        assert!(!maze.damage_wall(0));
        assert_eq!(along(&maze), vec![0, 1]);

        assert!(maze.damage_wall(0));
        assert_eq!(along(&maze), vec![1]);
        assert_eq!(maze.active_ids(), &[1, 2]);
        assert!(maze.index().cells_for_wall(0).is_none());
        assert_eq!(maze.active_walls().count(), 2);
    }

    #[test]
    fn test_damage_unknown_or_dead_wall_is_noop() {
        let mut maze = cross_maze();
        assert!(!maze.damage_wall(42));
        assert!(maze.damage_wall(2));
        assert!(!maze.damage_wall(2));
        assert_eq!(maze.active_ids(), &[0, 1]);
    }

    #[test]
    fn test_rebuild_after_deserialize() {
        let mut maze = cross_maze();
        maze.damage_wall(1);
        let json = serde_json::to_string(&maze).expect("serialize");
        let mut restored: Maze = serde_json::from_str(&json).expect("deserialize");
        restored.rebuild();

        assert_eq!(restored.active_ids(), &[0, 2]);
        assert_eq!(restored.index().len(), 2);
        assert_eq!(restored.index().dimensions(), maze.index().dimensions());
    }

    #[test]
    fn test_segment_source_yields_every_segment() {
        let segments = [
            Segment::new(Vec2::ZERO, Vec2::X),
            Segment::new(Vec2::new(500.0, 500.0), Vec2::new(501.0, 500.0)),
        ];
        let source = WallSource::Segments(&segments);
        let candidates = source.candidates(Vec2::ZERO, Vec2::ONE, 1.0);
        assert_eq!(candidates.len(), 2);
        assert!(source.bounds().is_none());
    }
}
