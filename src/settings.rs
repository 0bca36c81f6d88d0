//! Physics tuning
//!
//! Loaded from a JSON file; missing fields take their defaults.

use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{
    ARENA_HEIGHT, ARENA_WIDTH, COLLISION_RESTITUTION, MAX_GRID_DIM, PATH_QUERY_SCALE,
    PUSH_MARGIN_FRACTION, SPATIAL_CELL_SIZE, SWEEP_STEP_FRACTION,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsSettings {
    /// Fraction of normal velocity kept after a bounce (0.0 - 1.0)
    pub restitution: f32,
    /// Swept-test sub-step as a fraction of the body radius
    pub sweep_step_fraction: f32,
    /// Extra push-out after a wall hit as a fraction of the body radius
    pub push_margin_fraction: f32,
    /// Broad-phase path query radius as a multiple of the body radius
    pub path_query_scale: f32,
    /// Wall contacts resolved per body per step
    pub contact_iterations: u32,

    // === Arena ===
    pub cell_size: f32,
    pub arena_width: f32,
    pub arena_height: f32,
}

impl Default for PhysicsSettings {
    fn default() -> Self {
        Self {
            restitution: COLLISION_RESTITUTION,
            sweep_step_fraction: SWEEP_STEP_FRACTION,
            push_margin_fraction: PUSH_MARGIN_FRACTION,
            path_query_scale: PATH_QUERY_SCALE,
            contact_iterations: 1,

            cell_size: SPATIAL_CELL_SIZE,
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
        }
    }
}

impl PhysicsSettings {
    pub fn arena_size(&self) -> Vec2 {
        Vec2::new(self.arena_width, self.arena_height)
    }

    /// Clamp every field into its usable range
    pub fn sanitized(mut self) -> Self {
        let defaults = Self::default();

        self.restitution = if self.restitution.is_finite() {
            self.restitution.clamp(0.0, 1.0)
        } else {
            defaults.restitution
        };
        self.push_margin_fraction = if self.push_margin_fraction.is_finite() {
            self.push_margin_fraction.max(0.0)
        } else {
            defaults.push_margin_fraction
        };
        positive_or(&mut self.sweep_step_fraction, defaults.sweep_step_fraction);
        positive_or(&mut self.path_query_scale, defaults.path_query_scale);
        positive_or(&mut self.cell_size, defaults.cell_size);
        positive_or(&mut self.arena_width, defaults.arena_width);
        positive_or(&mut self.arena_height, defaults.arena_height);
        let min_cell = self.arena_width.max(self.arena_height) / MAX_GRID_DIM as f32;
        self.cell_size = self.cell_size.max(min_cell);
        if self.contact_iterations == 0 {
            self.contact_iterations = defaults.contact_iterations;
        }
        self
    }

    /// Parse and sanitize
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::sanitized)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load from a file, falling back to defaults if it is missing or invalid
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded physics settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    log::warn!("Invalid settings in {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(e) => {
                log::info!("No settings at {} ({e}); using defaults", path.display());
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path.as_ref(), json)?;
        log::info!("Settings saved to {}", path.as_ref().display());
        Ok(())
    }
}

fn positive_or(value: &mut f32, fallback: f32) {
    if !(value.is_finite() && *value > 0.0) {
        *value = fallback;
    }
}
