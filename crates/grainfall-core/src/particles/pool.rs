//! Fixed-capacity particle pool with an O(1) free list

use glam::Vec2;

use crate::simulation::{MaterialDef, Phase};

/// Reference to a pooled particle
///
/// The generation makes handles to released (and possibly reused) slots stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ParticleHandle {
    index: usize,
    generation: u32,
}

impl ParticleHandle {
    pub fn index(&self) -> usize {
        self.index
    }
}

/// A continuous-position particle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub material: u16,
    pub phase: Phase,
    pub friction: f32,
    pub restitution: f32,
    /// Slot in the pool
    pub index: usize,
    pub active: bool,
    /// Consecutive steps spent resting
    pub rest_frames: u32,
    generation: u32,
}

impl Particle {
    fn inactive(index: usize) -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            material: 0,
            phase: Phase::Powder,
            friction: 0.0,
            restitution: 0.0,
            index,
            active: false,
            rest_frames: 0,
            generation: 0,
        }
    }

    /// Take on a material's physical properties
    pub fn assign_material(&mut self, material: &MaterialDef) {
        self.material = material.id;
        self.phase = material.phase;
        self.friction = material.friction;
        self.restitution = material.restitution;
    }

    pub fn handle(&self) -> ParticleHandle {
        ParticleHandle {
            index: self.index,
            generation: self.generation,
        }
    }
}

/// Pool of particles allocated once at startup
pub struct ParticlePool {
    particles: Vec<Particle>,
    free: Vec<usize>,
}

impl ParticlePool {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: (0..capacity).map(Particle::inactive).collect(),
            // Reversed so slot 0 is handed out first
            free: (0..capacity).rev().collect(),
        }
    }

    /// Take a free slot; `None` when the pool is full
    pub fn acquire(
        &mut self,
        position: Vec2,
        velocity: Vec2,
        material: &MaterialDef,
    ) -> Option<ParticleHandle> {
        let index = self.free.pop()?;
        let particle = &mut self.particles[index];
        particle.position = position;
        particle.velocity = velocity;
        particle.assign_material(material);
        particle.active = true;
        particle.rest_frames = 0;
        Some(particle.handle())
    }

    /// Return a slot to the free list. Stale handles are ignored.
    pub fn release(&mut self, handle: ParticleHandle) -> bool {
        let Some(particle) = self.particles.get_mut(handle.index) else {
            return false;
        };
        if !particle.active || particle.generation != handle.generation {
            return false;
        }
        particle.active = false;
        particle.generation = particle.generation.wrapping_add(1);
        self.free.push(handle.index);
        true
    }

    pub fn get(&self, handle: ParticleHandle) -> Option<&Particle> {
        self.particles
            .get(handle.index)
            .filter(|p| p.active && p.generation == handle.generation)
    }

    pub fn get_mut(&mut self, handle: ParticleHandle) -> Option<&mut Particle> {
        self.particles
            .get_mut(handle.index)
            .filter(|p| p.active && p.generation == handle.generation)
    }

    /// Slot access regardless of handle generation
    pub(crate) fn slot(&self, index: usize) -> Option<&Particle> {
        self.particles.get(index).filter(|p| p.active)
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Particle> {
        self.particles.get_mut(index).filter(|p| p.active)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter().filter(|p| p.active)
    }

    /// Indices of active slots
    pub fn active_indices(&self) -> Vec<usize> {
        self.iter().map(|p| p.index).collect()
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// Number of active particles
    pub fn len(&self) -> usize {
        self.particles.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }
}
