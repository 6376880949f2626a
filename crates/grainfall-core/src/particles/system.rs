//! Continuous-physics particle track
//!
//! Particles live in cell units: the particle at `(3.7, 5.2)` overlaps grid
//! cell `(3, 5)`. They collide with the grid, react with neighbouring cells
//! through the shared interaction rules, and turn back into grid cells once
//! they come to rest.

use glam::{IVec2, Vec2};

use super::pool::{Particle, ParticleHandle, ParticlePool};
use super::spatial_hash::SpatialHash;
use crate::config::ParticleConfig;
use crate::simulation::{InteractionRules, MaterialDef, MaterialId, Materials, Operand, Phase};
use crate::world::{ChemistrySystem, Grid, SimStats, WorldRng};

/// Keeps clamped positions strictly inside `[0, size)`
const EDGE_EPSILON: f32 = 1e-3;

const CARDINAL: [IVec2; 4] = [IVec2::NEG_Y, IVec2::Y, IVec2::NEG_X, IVec2::X];

/// Where a buried particle looks for open space, nearest first
const ESCAPE: [IVec2; 6] = [
    IVec2::NEG_Y,
    IVec2::NEG_X,
    IVec2::X,
    IVec2::new(0, -2),
    IVec2::new(0, -3),
    IVec2::new(0, -4),
];

/// What happened to a particle during one step
enum StepResult {
    Alive(Particle),
    /// Fell out of the bottom of the world, or was buried with no way out
    Lost,
    /// Written back into the grid
    Settled,
    /// Consumed by an interaction
    Consumed,
}

pub struct ParticleSystem {
    pool: ParticlePool,
    hash: SpatialHash,
    config: ParticleConfig,
    width: f32,
    height: f32,
    /// Scratch buffer for neighbour queries
    neighbors: Vec<usize>,
    warned_exhausted: bool,
}

impl ParticleSystem {
    pub fn new(config: &ParticleConfig, width: i32, height: i32) -> Self {
        let width = width.max(0) as f32;
        let height = height.max(0) as f32;
        Self {
            pool: ParticlePool::new(config.capacity),
            hash: SpatialHash::new(width, height, config.hash_cell_size, config.capacity),
            config: config.clone(),
            width,
            height,
            neighbors: Vec::with_capacity(32),
            warned_exhausted: false,
        }
    }

    /// Spawn a particle at rest
    pub fn spawn(
        &mut self,
        x: f32,
        y: f32,
        material: &MaterialDef,
        stats: &mut dyn SimStats,
    ) -> Option<ParticleHandle> {
        self.spawn_with_velocity(Vec2::new(x, y), Vec2::ZERO, material, stats)
    }

    /// Spawn a particle; `None` outside the world, for the empty material, or
    /// when the pool is exhausted
    pub fn spawn_with_velocity(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        material: &MaterialDef,
        stats: &mut dyn SimStats,
    ) -> Option<ParticleHandle> {
        if material.is_empty() || !self.contains(position) {
            return None;
        }
        let Some(handle) = self.pool.acquire(position, velocity, material) else {
            if !self.warned_exhausted {
                log::warn!(
                    "Particle pool exhausted ({} particles), refusing spawns",
                    self.pool.capacity()
                );
                self.warned_exhausted = true;
            }
            return None;
        };
        self.hash.insert(handle.index(), position);
        stats.record_particle_spawned();
        Some(handle)
    }

    /// Remove a particle; stale handles are ignored
    pub fn remove(&mut self, handle: ParticleHandle) -> bool {
        if !self.pool.release(handle) {
            return false;
        }
        self.hash.remove(handle.index());
        true
    }

    /// Remove every particle
    pub fn clear(&mut self) {
        let handles: Vec<ParticleHandle> = self.pool.iter().map(Particle::handle).collect();
        for handle in handles {
            self.remove(handle);
        }
    }

    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.pool.get(handle)
    }

    /// Active particles
    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.pool.iter()
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    fn contains(&self, pos: Vec2) -> bool {
        pos.x >= 0.0 && pos.y >= 0.0 && pos.x < self.width && pos.y < self.height
    }

    /// Advance every active particle by one step
    #[allow(clippy::too_many_arguments)]
    pub fn update<R: WorldRng>(
        &mut self,
        dt: f32,
        grid: &mut Grid,
        materials: &Materials,
        rules: &InteractionRules,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) {
        self.warned_exhausted = false;

        for index in self.pool.active_indices() {
            // Removed earlier in this step by another particle's interaction
            let Some(particle) = self.pool.slot(index).copied() else {
                continue;
            };

            let handle = particle.handle();
            match self.step_particle(particle, dt, grid, materials, rules, stats, rng) {
                StepResult::Alive(next) => {
                    self.hash.update(index, next.position);
                    if let Some(slot) = self.pool.slot_mut(index) {
                        *slot = next;
                    }
                }
                StepResult::Lost => {
                    self.remove(handle);
                    stats.record_particle_lost();
                }
                StepResult::Settled => {
                    self.remove(handle);
                    stats.record_particle_settled();
                }
                StepResult::Consumed => {
                    self.remove(handle);
                }
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn step_particle<R: WorldRng>(
        &mut self,
        mut p: Particle,
        dt: f32,
        grid: &mut Grid,
        materials: &Materials,
        rules: &InteractionRules,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> StepResult {
        let Some(material) = materials.get(p.material) else {
            log::warn!("particle {} has unknown material {}", p.index, p.material);
            return StepResult::Consumed;
        };
        let config = &self.config;

        // Buried by a settling neighbour or a brush stroke
        if blocks(grid, materials, p.position) {
            let cell = cell_of(p.position);
            let Some(open) = escape_cell(grid, materials, cell) else {
                return StepResult::Lost;
            };
            p.position += (open - cell).as_vec2();
            p.velocity = Vec2::ZERO;
            p.rest_frames = 0;
        }

        // Gravity; gases rise
        let gravity = match p.phase {
            Phase::Gas => -config.gravity * config.gas_gravity_scale,
            _ => config.gravity,
        };
        p.velocity.y += gravity * dt;

        // Phase drag
        let drag = match p.phase {
            Phase::Powder => config.powder_drag,
            Phase::Liquid => config.liquid_drag,
            Phase::Gas => config.gas_drag,
            Phase::Solid => 0.0,
        };
        p.velocity *= 1.0 - drag.clamp(0.0, 1.0);

        // Neighbours within radius
        self.hash
            .query(p.position, config.neighbor_radius, &mut self.neighbors);
        let mut neighbor_count = 0usize;
        let mut neighbor_offset = 0.0f32;
        let min_distance = config.particle_radius * 2.0;
        for &j in &self.neighbors {
            if j == p.index {
                continue;
            }
            let Some(other) = self.pool.slot(j) else {
                continue;
            };
            let delta = p.position - other.position;
            let distance = delta.length();
            if distance >= config.neighbor_radius {
                continue;
            }
            neighbor_count += 1;
            neighbor_offset += other.position.x - p.position.x;

            // Overlap repulsion
            if distance < min_distance {
                let direction = if distance > f32::EPSILON {
                    delta / distance
                } else {
                    Vec2::new(rng.gen_sign() as f32, 0.0)
                };
                p.velocity += direction * (min_distance - distance) * config.repulsion * dt;
            }
        }

        match p.phase {
            Phase::Liquid => {
                // Crowded liquid pushes away from the crowd
                if neighbor_count > config.pressure_threshold {
                    let away = if neighbor_offset.abs() > f32::EPSILON {
                        -neighbor_offset.signum()
                    } else {
                        rng.gen_sign() as f32
                    };
                    p.velocity.x += away * config.pressure_spread * dt;
                }
                p.velocity.x += (rng.gen_f32() * 2.0 - 1.0) * config.dispersion_jitter * dt;
            }
            Phase::Powder if neighbor_count > 0 => {
                let friction = (p.friction * config.powder_friction_scale * dt).clamp(0.0, 1.0);
                p.velocity.x *= 1.0 - friction;
                if neighbor_count >= 2 && p.velocity.length() < config.settle_speed {
                    p.velocity = Vec2::ZERO;
                }
            }
            _ => {}
        }

        // Semi-implicit Euler: velocity is already updated, clamp it, then move
        p.velocity = p.velocity.clamp_length_max(config.max_speed);
        let old = p.position;
        let target = old + p.velocity * dt;

        // Grid collision, one axis at a time
        let mut pos = Vec2::new(target.x, old.y);
        if blocks(grid, materials, pos) {
            pos.x = old.x;
            p.velocity.x = -p.velocity.x * p.restitution;
        }
        pos.y = target.y;
        if blocks(grid, materials, pos) {
            // Come to rest against the surface of the blocking cell
            let row = pos.y.floor();
            pos.y = if p.velocity.y > 0.0 {
                (row - EDGE_EPSILON).max(old.y)
            } else {
                (row + 1.0).min(old.y)
            };
            p.velocity.y = -p.velocity.y * p.restitution;
        }

        // World bounds; the bottom edge is open
        if pos.y >= self.height {
            return StepResult::Lost;
        }
        if pos.x < 0.0 {
            pos.x = 0.0;
            p.velocity.x = -p.velocity.x * p.restitution;
        } else if pos.x >= self.width {
            pos.x = self.width - EDGE_EPSILON;
            p.velocity.x = -p.velocity.x * p.restitution;
        }
        if pos.y < 0.0 {
            pos.y = 0.0;
            p.velocity.y = -p.velocity.y * p.restitution;
        }
        p.position = pos;

        let cell = cell_of(pos);

        // Reactions with touching cells; the particle is the first operand
        for offset in CARDINAL {
            let at = cell + offset;
            let Some(id) = grid.material_at(at.x, at.y) else {
                continue;
            };
            if id == MaterialId::EMPTY {
                continue;
            }
            let Some(other) = materials.get(id) else {
                continue;
            };
            let Some(effect) = rules.resolve(material, other, rng) else {
                continue;
            };

            stats.record_interaction();
            if let Some(id) = effect.second {
                if grid.set_id(materials, at.x, at.y, id) {
                    grid.mark_updated(at.x, at.y);
                }
            }
            if let Some(operand) = effect.blast {
                let center = if operand == Operand::First { cell } else { at };
                ChemistrySystem::blast(grid, materials, center, rules.blast_radius);
            }
            match effect.first.and_then(|id| materials.get(id)) {
                Some(next) if next.is_empty() => return StepResult::Consumed,
                Some(next) => p.assign_material(next),
                None => {}
            }
            break;
        }

        // Resting particles turn back into cells
        let supported = blocks(grid, materials, pos + Vec2::Y) || pos.y + 1.0 >= self.height;
        if supported && p.velocity.length() < config.settle_speed {
            p.rest_frames += 1;
        } else {
            p.rest_frames = 0;
        }
        if p.rest_frames >= config.settle_frames {
            let spot = [cell, cell + IVec2::NEG_Y]
                .into_iter()
                .find(|c| grid.is_empty_at(c.x, c.y));
            if let (Some(spot), Some(def)) = (spot, materials.get(p.material)) {
                grid.set(spot.x, spot.y, def);
                grid.mark_updated(spot.x, spot.y);
                return StepResult::Settled;
            }
        }

        StepResult::Alive(p)
    }
}

#[inline]
fn cell_of(pos: Vec2) -> IVec2 {
    pos.floor().as_ivec2()
}

/// Whether the grid cell under `pos` stops particles
///
/// Empty cells, gases and cells outside the grid let particles through.
fn blocks(grid: &Grid, materials: &Materials, pos: Vec2) -> bool {
    blocks_cell(grid, materials, cell_of(pos))
}

fn blocks_cell(grid: &Grid, materials: &Materials, cell: IVec2) -> bool {
    match grid.material_at(cell.x, cell.y) {
        None | Some(MaterialId::EMPTY) => false,
        Some(id) => materials.get(id).map_or(true, |m| m.phase != Phase::Gas),
    }
}

/// Nearest in-grid cell a particle buried in `cell` can move into
fn escape_cell(grid: &Grid, materials: &Materials, cell: IVec2) -> Option<IVec2> {
    ESCAPE
        .iter()
        .map(|&offset| cell + offset)
        .find(|c| grid.in_bounds(c.x, c.y) && !blocks_cell(grid, materials, *c))
}
