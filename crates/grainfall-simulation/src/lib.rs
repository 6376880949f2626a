//! Material data and cell types for Grainfall
//!
//! This crate provides the foundational data types for the simulation:
//! - Material definitions (MaterialId, MaterialDef, Materials)
//! - Phases, capability tags and behavior kinds (Phase, MaterialTags, Behavior)
//! - Cell types (Cell, CellData, cell_flags)

mod cell;
mod materials;

pub use cell::{
    BirdPhase, BirdState, BuildPhase, BuilderState, Cell, CellData, FishState, cell_flags,
};
pub use materials::{
    Behavior, CustomInteraction, MaterialDef, MaterialId, MaterialTags, Materials, Phase,
};
