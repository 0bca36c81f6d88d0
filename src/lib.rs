//! Maze Physics - collision detection and response for a maze arena
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spatial index, narrow phase, response, bodies)
//! - `settings`: Data-driven physics tuning

pub mod settings;
pub mod sim;

pub use settings::PhysicsSettings;

use glam::Vec2;

/// Game configuration constants
///
/// Velocities are in pixels per logical frame; `dt = 1.0` is one frame.
pub mod consts {
    /// Logical update rate the `dt` multiplier is normalized to
    pub const LOGICAL_FPS: f32 = 60.0;
    /// Maximum substeps per rendered frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Arena dimensions
    pub const ARENA_WIDTH: f32 = 1200.0;
    pub const ARENA_HEIGHT: f32 = 800.0;

    /// Broad-phase grid cell size (pixels)
    pub const SPATIAL_CELL_SIZE: f32 = 150.0;
    /// Upper bound on grid columns/rows; smaller cells are widened to fit
    pub const MAX_GRID_DIM: usize = 1024;

    /// Surviving normal speed after a bounce
    pub const COLLISION_RESTITUTION: f32 = 0.85;
    /// Largest sub-step of a swept test, as a fraction of the disc radius
    pub const SWEEP_STEP_FRACTION: f32 = 0.5;
    /// Extra push-out after a wall contact, as a fraction of the disc radius
    pub const PUSH_MARGIN_FRACTION: f32 = 0.5;
    /// Path queries widen the disc radius by this factor
    pub const PATH_QUERY_SCALE: f32 = 2.0;

    /// Below this squared length a segment is treated as a point
    pub const DEGENERATE_LENGTH_SQ: f32 = 1e-10;
    /// Smallest radius a body may have
    pub const MIN_BODY_RADIUS: f32 = 0.01;

    /// Player ship
    pub const SHIP_RADIUS: f32 = 6.0;
    pub const SHIP_THRUST_FORCE: f32 = 0.15;
    pub const SHIP_ROTATION_SPEED: f32 = 4.0; // degrees per frame
    pub const SHIP_FRICTION: f32 = 0.998;
    pub const SHIP_MAX_SPEED: f32 = 8.0;

    /// Enemies
    pub const ENEMY_RADIUS: f32 = 12.0;
    pub const ENEMY_MAX_SPEED: f32 = 2.0;
    pub const ANCHOR_RADIUS: f32 = 15.0;

    /// Projectiles
    pub const PROJECTILE_RADIUS: f32 = 4.0;
    pub const PROJECTILE_SPEED: f32 = 10.0;
    pub const PROJECTILE_LIFETIME: u32 = 120; // frames
    /// Projectiles leaving the arena by more than this are dropped
    pub const PROJECTILE_BOUNDS_SLACK: f32 = 100.0;

    /// Hit points of a freshly generated wall segment
    pub const WALL_HIT_POINTS: u32 = 3;
}

/// Normalize angle in degrees to [0, 360)
#[inline]
pub fn normalize_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Unit vector for a heading in degrees (0 = right, 90 = down in screen space)
#[inline]
pub fn heading_to_vec(angle_deg: f32) -> Vec2 {
    let rad = angle_deg.to_radians();
    Vec2::new(rad.cos(), rad.sin())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_angle() {
        assert!((normalize_angle(370.0) - 10.0).abs() < 0.001);
        assert!((normalize_angle(-90.0) - 270.0).abs() < 0.001);
        assert_eq!(normalize_angle(0.0), 0.0);
        assert!(normalize_angle(-1e-9) < 360.0);
    }

    #[test]
    fn test_heading_to_vec() {
        let right = heading_to_vec(0.0);
        assert!((right - Vec2::X).length() < 0.0001);

        let down = heading_to_vec(90.0);
        assert!((down - Vec2::Y).length() < 0.0001);
    }
}
