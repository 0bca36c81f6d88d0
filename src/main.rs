//! Maze Physics demo
//!
//! Runs a seeded headless arena: a scattered grid maze, a ship flown by
//! random input, drifting enemies and anchors. Logs what collided.
//!
//! Usage: `maze-physics [seed] [settings.json]`

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Library-only on the web
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use glam::Vec2;
    use rand::{Rng, SeedableRng};
    use rand_pcg::Pcg32;

    use maze_physics::PhysicsSettings;
    use maze_physics::consts::*;
    use maze_physics::sim::{CollisionEvent, CollisionOutcome, Maze, TickInput, World, tick};

    /// Spacing of the grid the walls are scattered on
    const MAZE_CELL: f32 = 100.0;
    /// Chance that a grid edge becomes a wall
    const WALL_DENSITY: f64 = 0.3;
    /// Rendered frames to simulate
    const FRAMES: u32 = 600;

    #[derive(Debug, Default)]
    struct Tally {
        wall_hits: u32,
        walls_destroyed: u32,
        body_hits: u32,
        edge_hits: u32,
    }

    impl Tally {
        fn record(&mut self, event: &CollisionEvent) {
            match event.outcome {
                CollisionOutcome::Wall { .. } => self.wall_hits += 1,
                CollisionOutcome::Body { .. } => self.body_hits += 1,
                CollisionOutcome::Edge { .. } => self.edge_hits += 1,
            }
            if event.wall_destroyed {
                self.walls_destroyed += 1;
            }
        }
    }

    pub fn run() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

        let mut args = std::env::args().skip(1);
        let seed = match args.next().map(|s| s.parse::<u64>()) {
            Some(Ok(seed)) => seed,
            Some(Err(e)) => {
                log::warn!("Invalid seed ({e}), using 0");
                0
            }
            None => 0,
        };
        let settings = args.next().map(PhysicsSettings::load).unwrap_or_default();

        log::info!("Maze Physics demo starting (seed {seed})");
        let mut rng = Pcg32::seed_from_u64(seed);

        let maze = Maze::from_settings(&settings, scatter_walls(&mut rng, settings.arena_size()));
        log::info!("Generated {} walls", maze.walls().len());

        let mut world = World::new(maze, settings);
        let size = world.settings.arena_size();
        world.spawn_ship(size * 0.5);
        for _ in 0..4 {
            let pos = random_point(&mut rng, size);
            let vel = Vec2::new(
                rng.random_range(-ENEMY_MAX_SPEED..=ENEMY_MAX_SPEED),
                rng.random_range(-ENEMY_MAX_SPEED..=ENEMY_MAX_SPEED),
            );
            world.spawn_enemy(pos, vel);
        }
        for _ in 0..2 {
            let pos = random_point(&mut rng, size);
            world.spawn_anchor(pos);
        }

        let mut tally = Tally::default();
        for frame in 0..FRAMES {
            let input = TickInput {
                rotate: rng.random_range(-1.0..=1.0),
                thrust: rng.random_bool(0.7),
                fire: rng.random_bool(0.1),
            };

            // Jittered frame time in logical frames, split into substeps of at most one
            let frame_secs: f32 = rng.random_range(0.8..1.6) / LOGICAL_FPS;
            let mut remaining = frame_secs * LOGICAL_FPS;
            let mut substeps = 0;
            while remaining > 0.0 && substeps < MAX_SUBSTEPS {
                let dt = remaining.min(1.0);
                // Input applies once per rendered frame
                let step_input = if substeps == 0 {
                    input.clone()
                } else {
                    TickInput {
                        fire: false,
                        ..input.clone()
                    }
                };
                for event in tick(&mut world, &step_input, dt) {
                    tally.record(&event);
                }
                remaining -= dt;
                substeps += 1;
            }

            if frame % 120 == 0 {
                if let Some(ship) = world.ship() {
                    log::debug!(
                        "Frame {frame}: ship at ({:.1}, {:.1}) speed {:.2}",
                        ship.body.pos.x,
                        ship.body.pos.y,
                        ship.body.speed()
                    );
                }
            }
        }

        log::info!(
            "Ran {} ticks: {} wall hits ({} walls destroyed), {} body hits, {} edge hits",
            world.time_ticks,
            tally.wall_hits,
            tally.walls_destroyed,
            tally.body_hits,
            tally.edge_hits
        );
        log::info!(
            "{} of {} walls standing, {} entities live, kinetic energy {:.2}",
            world.maze.active_ids().len(),
            world.maze.walls().len(),
            world.entities.len(),
            world.kinetic_energy()
        );
    }

    /// Grid-aligned wall segments, as a maze generator would hand them over
    fn scatter_walls(rng: &mut Pcg32, size: Vec2) -> Vec<(Vec2, Vec2, u32)> {
        let cols = (size.x / MAZE_CELL) as u32;
        let rows = (size.y / MAZE_CELL) as u32;
        let mut walls = Vec::new();

        for row in 1..rows {
            for col in 0..cols {
                if rng.random_bool(WALL_DENSITY) {
                    let y = row as f32 * MAZE_CELL;
                    let start = Vec2::new(col as f32 * MAZE_CELL, y);
                    walls.push((start, start + Vec2::new(MAZE_CELL, 0.0), WALL_HIT_POINTS));
                }
            }
        }
        for col in 1..cols {
            for row in 0..rows {
                if rng.random_bool(WALL_DENSITY) {
                    let x = col as f32 * MAZE_CELL;
                    let start = Vec2::new(x, row as f32 * MAZE_CELL);
                    walls.push((start, start + Vec2::new(0.0, MAZE_CELL), WALL_HIT_POINTS));
                }
            }
        }
        walls
    }

    /// A point at the centre of a random maze cell
    fn random_point(rng: &mut Pcg32, size: Vec2) -> Vec2 {
        let cols = ((size.x / MAZE_CELL) as u32).max(1);
        let rows = ((size.y / MAZE_CELL) as u32).max(1);
        let col = rng.random_range(0..cols);
        let row = rng.random_range(0..rows);
        Vec2::new(
            (col as f32 + 0.5) * MAZE_CELL,
            (row as f32 + 0.5) * MAZE_CELL,
        )
    }
}
