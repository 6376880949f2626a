//! Grainfall simulation engine
//!
//! - [`world`]: cell grid, behavior dispatch, interactions, frame orchestration
//! - [`particles`]: continuous-physics particle track with spatial hashing
//! - [`simulation`]: material data (re-exported) and the interaction rule table
//! - [`config`]: serde-backed engine configuration

pub mod config;
pub mod particles;
pub mod simulation;
pub mod world;

pub use config::{InteractionConfig, ParticleConfig, SimConfig, WorldConfig};
pub use world::World;
