//! World - owns the grid and runs the simulation clock

use std::sync::Arc;

use glam::Vec2;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use super::ca_update::CellularAutomataUpdater;
use super::chemistry_system::ChemistrySystem;
use super::persistence::{self, LoadError};
use super::{Grid, SimStats, TickStats, WorldRng};
use crate::config::SimConfig;
use crate::particles::{ParticleHandle, ParticleSystem};
use crate::simulation::{Cell, InteractionRules, MaterialDef, Materials};

/// The simulation world: one grid, one particle track, one clock
pub struct World {
    grid: Grid,
    materials: Arc<Materials>,
    rules: InteractionRules,
    particles: ParticleSystem,
    config: SimConfig,
    rng: Xoshiro256StarStar,
    stats: TickStats,

    /// Simulation time accumulator
    time_accumulator: f32,
}

impl World {
    pub fn new(config: SimConfig, materials: Arc<Materials>) -> Self {
        let seed = config.world.seed.unwrap_or_else(rand::random);
        let grid = Grid::new(config.world.width, config.world.height);
        let particles = ParticleSystem::new(&config.particles, grid.width(), grid.height());
        let rules = InteractionRules::standard(&config.interactions);

        log::info!(
            "Created {}x{} world with {} materials (seed {})",
            grid.width(),
            grid.height(),
            materials.len(),
            seed
        );

        Self {
            grid,
            materials,
            rules,
            particles,
            config,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            stats: TickStats::new(),
            time_accumulator: 0.0,
        }
    }

    /// World with the built-in material catalog
    pub fn with_default_materials(config: SimConfig) -> Self {
        Self::new(config, Arc::new(Materials::new()))
    }

    /// Replace the interaction rule table
    pub fn set_rules(&mut self, rules: InteractionRules) {
        self.rules = rules;
    }

    /// Restart the world's random sequence
    pub fn reseed(&mut self, seed: u64) {
        self.rng = Xoshiro256StarStar::seed_from_u64(seed);
    }

    /// Advance the clock by `dt` seconds, running whole fixed-rate ticks
    ///
    /// Returns the number of ticks run. At most `max_steps_per_update` ticks
    /// run per call, so a slow frame slows the simulation down instead of
    /// snowballing.
    pub fn update(&mut self, dt: f32) -> u32 {
        let timestep = self.timestep();
        let max_steps = self.config.world.max_steps_per_update;

        self.time_accumulator += dt;
        let mut steps = 0;
        while self.time_accumulator >= timestep && steps < max_steps {
            self.tick();
            self.time_accumulator -= timestep;
            steps += 1;
        }

        // Clamp accumulator to prevent runaway
        if self.time_accumulator > timestep * 2.0 {
            self.time_accumulator = timestep;
        }
        steps
    }

    /// Run one tick with the world's own generator
    pub fn tick(&mut self) {
        // Moved out for the tick so `tick_with` can borrow the rest of `self`
        let mut rng = std::mem::replace(&mut self.rng, Xoshiro256StarStar::seed_from_u64(0));
        self.tick_with(&mut rng);
        self.rng = rng;
    }

    /// Run one tick drawing randomness from `rng`
    ///
    /// Clears the updated flags, sweeps the grid bottom to top (row direction
    /// picked by a coin flip per row), then steps the particles.
    pub fn tick_with<R: WorldRng>(&mut self, rng: &mut R) {
        let dt = self.timestep();
        self.grid.clear_updated_flags();

        let width = self.grid.width();
        for y in (0..self.grid.height()).rev() {
            let x_iter: Box<dyn Iterator<Item = i32>> = if rng.gen_bool() {
                Box::new(0..width)
            } else {
                Box::new((0..width).rev())
            };

            for x in x_iter {
                self.update_cell(x, y, rng);
            }
        }

        self.particles.update(
            dt,
            &mut self.grid,
            &self.materials,
            &self.rules,
            &mut self.stats,
            rng,
        );

        self.stats.end_tick();
        log::debug!(
            "tick {}: {} moved, {} interactions, {} expired, {} particles",
            self.stats.ticks,
            self.stats.last_tick.cells_moved,
            self.stats.last_tick.interactions,
            self.stats.last_tick.expired,
            self.particles.len()
        );
    }

    fn update_cell<R: WorldRng>(&mut self, x: i32, y: i32, rng: &mut R) {
        let Some(cell) = self.grid.get(x, y) else {
            return;
        };
        if cell.is_empty() || cell.is_updated() {
            return;
        }

        if self.grid.tick_lifetime(x, y) {
            self.stats.record_expired();
            return;
        }

        let outcome = CellularAutomataUpdater::update(
            &mut self.grid,
            x,
            y,
            &self.materials,
            &mut self.stats,
            rng,
        );

        let pos = outcome.position(x, y);
        if self.grid.get(pos.x, pos.y).is_some_and(|c| !c.is_empty()) {
            ChemistrySystem::scan_neighbors(
                &mut self.grid,
                pos.x,
                pos.y,
                &self.materials,
                &self.rules,
                &mut self.stats,
                rng,
            );
        }
    }

    fn timestep(&self) -> f32 {
        1.0 / self.config.world.tick_rate.max(1.0)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&Cell> {
        self.grid.get(x, y)
    }

    /// Look up the definition of the material at (x, y)
    pub fn material_at(&self, x: i32, y: i32) -> Option<&MaterialDef> {
        self.grid
            .material_at(x, y)
            .and_then(|id| self.materials.get(id))
    }

    /// Set a cell by material id; unknown ids and out-of-bounds writes are no-ops
    pub fn set(&mut self, x: i32, y: i32, material_id: u16) -> bool {
        self.grid.in_bounds(x, y) && self.grid.set_id(&self.materials, x, y, material_id)
    }

    /// Set a cell by material name
    pub fn set_by_name(&mut self, x: i32, y: i32, name: &str) -> bool {
        match self.materials.id_of(name) {
            Some(id) => self.set(x, y, id),
            None => {
                log::warn!("Unknown material '{}'", name);
                false
            }
        }
    }

    /// Paint a filled circle of material
    pub fn paint(&mut self, cx: i32, cy: i32, radius: i32, material_id: u16) -> bool {
        let Some(def) = self.materials.get(material_id) else {
            log::warn!("paint: unknown material {}", material_id);
            return false;
        };
        self.grid.paint_circle(cx, cy, radius, def);
        true
    }

    /// Fill a rectangle of material
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, material_id: u16) -> bool {
        let Some(def) = self.materials.get(material_id) else {
            log::warn!("fill_rect: unknown material {}", material_id);
            return false;
        };
        self.grid.fill_rect(x, y, w, h, def);
        true
    }

    /// Spawn a particle on the continuous-physics track
    pub fn spawn_particle(&mut self, x: f32, y: f32, material_id: u16) -> Option<ParticleHandle> {
        self.spawn_particle_with_velocity(Vec2::new(x, y), Vec2::ZERO, material_id)
    }

    pub fn spawn_particle_with_velocity(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        material_id: u16,
    ) -> Option<ParticleHandle> {
        let def = self.materials.get(material_id)?;
        self.particles
            .spawn_with_velocity(position, velocity, def, &mut self.stats)
    }

    pub fn remove_particle(&mut self, handle: ParticleHandle) -> bool {
        self.particles.remove(handle)
    }

    /// Save the grid as `width,height|id0,id1,...`
    pub fn save(&self) -> String {
        persistence::serialize(&self.grid)
    }

    /// Load a save of the same size; on error the world is unchanged
    pub fn load(&mut self, text: &str) -> Result<(), LoadError> {
        persistence::deserialize_into(&mut self.grid, &self.materials, text).inspect_err(|e| {
            log::warn!("World load rejected: {}", e);
        })?;
        self.particles.clear();
        Ok(())
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn materials(&self) -> &Arc<Materials> {
        &self.materials
    }

    pub fn rules(&self) -> &InteractionRules {
        &self.rules
    }

    pub fn stats(&self) -> &TickStats {
        &self.stats
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn width(&self) -> i32 {
        self.grid.width()
    }

    pub fn height(&self) -> i32 {
        self.grid.height()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::simulation::MaterialId;

    fn small_world(width: u32, height: u32) -> World {
        World::with_default_materials(SimConfig {
            world: WorldConfig {
                width,
                height,
                seed: Some(1234),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[test]
    fn test_set_by_name_and_unknown_name() {
        let mut world = small_world(8, 8);

        assert!(world.set_by_name(1, 1, "sand"));
        assert_eq!(world.grid().material_at(1, 1), Some(MaterialId::SAND));
        assert!(!world.set_by_name(1, 1, "unobtainium"));
        assert_eq!(world.grid().material_at(1, 1), Some(MaterialId::SAND));
        assert!(!world.set(100, 100, MaterialId::SAND));
    }

    #[test]
    fn test_sand_falls_one_row_per_tick() {
        let mut world = small_world(3, 5);
        world.set(1, 0, MaterialId::SAND);

        world.tick();
        assert_eq!(world.grid().material_at(1, 1), Some(MaterialId::SAND));
        world.tick();
        assert_eq!(world.grid().material_at(1, 2), Some(MaterialId::SAND));
    }

    #[test]
    fn test_lifetime_expires_centrally() {
        let mut world = small_world(3, 3);
        world.fill_rect(0, 0, 3, 3, MaterialId::STONE);
        world.set(1, 1, MaterialId::SMOKE);
        let lifetime = world.materials().get(MaterialId::SMOKE).unwrap().lifetime;

        for _ in 0..lifetime {
            world.tick();
        }

        assert_eq!(world.grid().material_at(1, 1), Some(MaterialId::EMPTY));
        assert_eq!(world.stats().expired, 1);
    }

    #[test]
    fn test_update_runs_fixed_steps() {
        let mut world = small_world(4, 4);

        assert_eq!(world.update(0.5 / 60.0), 0);
        assert_eq!(world.update(0.6 / 60.0), 1);
        // Capped at two steps per call
        assert_eq!(world.update(1.0), 2);
        assert_eq!(world.stats().ticks, 3);
    }

    #[test]
    fn test_load_mismatch_keeps_world() {
        let mut world = small_world(4, 4);
        world.set(0, 0, MaterialId::STONE);
        let saved = world.save();

        assert!(world.load("2,2|0,0,0,0").is_err());
        assert_eq!(world.save(), saved);
        assert!(world.load(&saved).is_ok());
    }

    #[test]
    fn test_spawn_particle_unknown_material() {
        let mut world = small_world(8, 8);
        assert!(world.spawn_particle(1.0, 1.0, 4242).is_none());
        assert!(world.spawn_particle(1.0, 1.0, MaterialId::WATER).is_some());
        assert_eq!(world.particles().len(), 1);
    }

    #[test]
    fn test_tick_continues_the_world_sequence() {
        let mut own = small_world(16, 16);
        let mut external = small_world(16, 16);
        for world in [&mut own, &mut external] {
            world.paint(8, 4, 3, MaterialId::SAND);
            world.paint(4, 10, 2, MaterialId::WATER);
        }

        // Same seed as `small_world`, drawn from outside the world
        let mut rng = Xoshiro256StarStar::seed_from_u64(1234);
        for _ in 0..30 {
            own.tick();
            external.tick_with(&mut rng);
        }

        assert_eq!(own.save(), external.save());
    }

    #[test]
    fn test_same_seed_same_world() {
        let run = || {
            let mut world = small_world(16, 16);
            world.paint(8, 4, 3, MaterialId::SAND);
            world.paint(4, 10, 2, MaterialId::WATER);
            world.set(8, 12, MaterialId::FIRE);
            for _ in 0..50 {
                world.tick();
            }
            world.save()
        };
        assert_eq!(run(), run());
    }
}
