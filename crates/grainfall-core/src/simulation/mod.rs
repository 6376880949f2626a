//! Simulation data - materials, cells, interaction rules

pub mod interactions;

// Re-export from grainfall-simulation so callers need a single dependency
pub use grainfall_simulation::{
    Behavior, BirdPhase, BirdState, BuildPhase, BuilderState, Cell, CellData, CustomInteraction,
    FishState, MaterialDef, MaterialId, MaterialTags, Materials, Phase, cell_flags,
};

pub use interactions::{Effect, InteractionRule, InteractionRules, Operand};
