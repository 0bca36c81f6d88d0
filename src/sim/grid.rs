//! Uniform-grid broad phase over wall segments
//!
//! Each wall is rasterized into every cell its segment crosses, so a query
//! only has to look at the cells its box overlaps. Results are sorted by
//! wall id, which keeps iteration order deterministic.

use glam::Vec2;

use super::wall::{Segment, WallId, WallSegment};
use crate::consts::{ARENA_HEIGHT, ARENA_WIDTH, MAX_GRID_DIM, SPATIAL_CELL_SIZE};

/// Tolerance for treating a traversal step as a corner crossing
const CORNER_EPSILON: f32 = 1e-4;

/// Grid of cells mapping to the walls that overlap them
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    cell_size: f32,
    cols: usize,
    rows: usize,
    /// Row-major cells, each holding sorted wall ids
    cells: Vec<Vec<WallId>>,
    /// Cells each wall occupies, indexed by wall id (for O(cells) removal).
    /// An empty entry means the wall is not indexed.
    occupied: Vec<Vec<usize>>,
    /// Number of non-empty entries in `occupied`
    indexed: usize,
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new(ARENA_WIDTH, ARENA_HEIGHT, SPATIAL_CELL_SIZE)
    }
}

impl SpatialIndex {
    /// Create an empty index covering `width` x `height`
    pub fn new(width: f32, height: f32, cell_size: f32) -> Self {
        let cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            log::warn!("Invalid cell size {cell_size}, using {SPATIAL_CELL_SIZE}");
            SPATIAL_CELL_SIZE
        };
        let extent = finite_extent(width).max(finite_extent(height));
        let min_cell = extent / MAX_GRID_DIM as f32;
        let cell_size = if cell_size < min_cell {
            log::warn!("Cell size {cell_size} too small for {width}x{height}, using {min_cell}");
            min_cell
        } else {
            cell_size
        };

        let cols = grid_dim(width, cell_size);
        let rows = grid_dim(height, cell_size);

        Self {
            cell_size,
            cols,
            rows,
            cells: vec![Vec::new(); cols * rows],
            occupied: Vec::new(),
            indexed: 0,
        }
    }

    #[inline]
    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions as (cols, rows)
    #[inline]
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Number of walls currently indexed
    pub fn len(&self) -> usize {
        self.indexed
    }

    pub fn is_empty(&self) -> bool {
        self.indexed == 0
    }

    /// Cell indices a wall currently occupies
    pub fn cells_for_wall(&self, id: WallId) -> Option<&[usize]> {
        self.occupied
            .get(id as usize)
            .filter(|cells| !cells.is_empty())
            .map(Vec::as_slice)
    }

    /// Remove every wall from every cell
    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            cell.clear();
        }
        self.occupied.clear();
        self.indexed = 0;
    }

    /// Rebuild from scratch; inactive walls are skipped
    pub fn build(&mut self, walls: &[WallSegment]) {
        self.clear();
        for wall in walls.iter().filter(|w| w.is_active()) {
            self.insert(wall.id, &wall.segment);
        }
        log::debug!(
            "Spatial index built: {} walls over {}x{} cells",
            self.len(),
            self.cols,
            self.rows
        );
    }

    /// Re-index one wall after a state change
    ///
    /// Removes the wall from the cells it occupies and re-inserts it only if
    /// it is still active.
    pub fn update(&mut self, wall: &WallSegment) {
        self.remove(wall.id);
        if wall.is_active() {
            self.insert(wall.id, &wall.segment);
        }
    }

    /// Drop a wall from every cell it occupies
    pub fn remove(&mut self, id: WallId) {
        let Some(slot) = self.occupied.get_mut(id as usize) else {
            return;
        };
        let cells = std::mem::take(slot);
        if cells.is_empty() {
            return;
        }
        self.indexed -= 1;
        for cell in cells {
            if let Ok(pos) = self.cells[cell].binary_search(&id) {
                self.cells[cell].remove(pos);
            }
        }
    }

    fn insert(&mut self, id: WallId, segment: &Segment) {
        self.remove(id);
        let cells = self.rasterize(segment);
        for &cell in &cells {
            let bucket = &mut self.cells[cell];
            if let Err(pos) = bucket.binary_search(&id) {
                bucket.insert(pos, id);
            }
        }
        let slot = id as usize;
        if slot >= self.occupied.len() {
            self.occupied.resize_with(slot + 1, Vec::new);
        }
        self.occupied[slot] = cells;
        self.indexed += 1;
    }

    /// Walls in cells overlapping the box of half-size `radius` around `position`
    pub fn query_region(&self, position: Vec2, radius: f32) -> Vec<WallId> {
        let r = Vec2::splat(radius.abs());
        self.query_box(position - r, position + r)
    }

    /// Walls in cells overlapping the whole path from `start` to `end`,
    /// expanded by `radius` on every side
    pub fn query_path(&self, start: Vec2, end: Vec2, radius: f32) -> Vec<WallId> {
        let r = Vec2::splat(radius.abs());
        self.query_box(start.min(end) - r, start.max(end) + r)
    }

    fn query_box(&self, min: Vec2, max: Vec2) -> Vec<WallId> {
        let (c0, c1) = ordered(self.coord(min.x, self.cols), self.coord(max.x, self.cols));
        let (r0, r1) = ordered(self.coord(min.y, self.rows), self.coord(max.y, self.rows));

        let mut ids = Vec::new();
        for row in r0..=r1 {
            for col in c0..=c1 {
                ids.extend_from_slice(&self.cells[row * self.cols + col]);
            }
        }
        ids.sort_unstable();
        ids.dedup();
        ids
    }

    /// Grid coordinate along one axis, clamped into [0, n)
    #[inline]
    fn coord(&self, v: f32, n: usize) -> usize {
        clamp_cell((v / self.cell_size).floor() as i64, n)
    }

    #[inline]
    fn cell_index(&self, col: i64, row: i64) -> usize {
        clamp_cell(row, self.rows) * self.cols + clamp_cell(col, self.cols)
    }

    /// Conservative rasterization: every cell the segment passes through
    ///
    /// Grid traversal over the span crossed. Where the segment passes
    /// through a cell corner both side cells are included. Cells outside
    /// the grid clamp onto the border.
    fn rasterize(&self, segment: &Segment) -> Vec<usize> {
        let a = segment.start / self.cell_size;
        let b = segment.end / self.cell_size;

        let mut col = a.x.floor() as i64;
        let mut row = a.y.floor() as i64;
        let end_col = b.x.floor() as i64;
        let end_row = b.y.floor() as i64;

        let span = end_col.abs_diff(col) + end_row.abs_diff(row);
        let max_span = (4 * (self.cols + self.rows) + 16) as u64;
        if span > max_span || !a.is_finite() || !b.is_finite() {
            return self.bounding_cells(segment);
        }

        let d = b - a;
        let step_col: i64 = if d.x > 0.0 { 1 } else if d.x < 0.0 { -1 } else { 0 };
        let step_row: i64 = if d.y > 0.0 { 1 } else if d.y < 0.0 { -1 } else { 0 };

        let delta_x = if step_col != 0 { 1.0 / d.x.abs() } else { f32::INFINITY };
        let delta_y = if step_row != 0 { 1.0 / d.y.abs() } else { f32::INFINITY };
        let mut t_max_x = match step_col {
            1 => ((col + 1) as f32 - a.x) / d.x,
            -1 => (col as f32 - a.x) / d.x,
            _ => f32::INFINITY,
        };
        let mut t_max_y = match step_row {
            1 => ((row + 1) as f32 - a.y) / d.y,
            -1 => (row as f32 - a.y) / d.y,
            _ => f32::INFINITY,
        };

        let mut cells = vec![self.cell_index(col, row)];
        // Each axis only steps until it reaches its end cell, so the walk
        // always lands on (end_col, end_row)
        while col != end_col || row != end_row {
            let can_x = col != end_col;
            let can_y = row != end_row;
            if can_x && can_y && (t_max_x - t_max_y).abs() < CORNER_EPSILON {
                cells.push(self.cell_index(col + step_col, row));
                cells.push(self.cell_index(col, row + step_row));
                col += step_col;
                row += step_row;
                t_max_x += delta_x;
                t_max_y += delta_y;
            } else if can_x && (!can_y || t_max_x < t_max_y) {
                col += step_col;
                t_max_x += delta_x;
            } else {
                row += step_row;
                t_max_y += delta_y;
            }
            cells.push(self.cell_index(col, row));
        }

        cells.sort_unstable();
        cells.dedup();
        cells
    }

    /// Fallback for absurd or non-finite geometry: every cell of the clamped bounds
    fn bounding_cells(&self, segment: &Segment) -> Vec<usize> {
        let (min, max) = segment.bounds();
        let (c0, c1) = ordered(self.coord(min.x, self.cols), self.coord(max.x, self.cols));
        let (r0, r1) = ordered(self.coord(min.y, self.rows), self.coord(max.y, self.rows));
        let mut cells = Vec::with_capacity((c1 - c0 + 1) * (r1 - r0 + 1));
        for row in r0..=r1 {
            for col in c0..=c1 {
                cells.push(row * self.cols + col);
            }
        }
        cells
    }
}

fn finite_extent(extent: f32) -> f32 {
    if extent.is_finite() { extent.max(0.0) } else { 0.0 }
}

fn grid_dim(extent: f32, cell_size: f32) -> usize {
    ((finite_extent(extent) / cell_size) as usize).min(MAX_GRID_DIM - 1) + 1
}

#[inline]
fn clamp_cell(c: i64, n: usize) -> usize {
    c.clamp(0, n as i64 - 1) as usize
}

#[inline]
fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a <= b { (a, b) } else { (b, a) }
}
