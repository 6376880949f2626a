//! Particle subsystem - pooled continuous-position particles with a spatial hash

mod pool;
mod spatial_hash;
mod system;

pub use pool::{Particle, ParticleHandle, ParticlePool};
pub use spatial_hash::SpatialHash;
pub use system::ParticleSystem;
