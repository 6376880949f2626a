//! World management - cell grid, per-cell update, interactions, persistence

mod ca_update;
mod chemistry_system;
mod grid;
mod organisms;
pub mod persistence;
pub mod rng_trait;
pub mod stats;
#[allow(clippy::module_inception)]
mod world;

pub use ca_update::{CellularAutomataUpdater, Outcome};
pub use chemistry_system::ChemistrySystem;
pub use grid::Grid;
pub use persistence::LoadError;
pub use rng_trait::WorldRng;
pub use stats::{NoopStats, SimStats, TickCounters, TickStats};
pub use world::World;
