//! Cell types
//!
//! One cell per grid position. Cells reference their material by id and carry
//! the mutable per-cell state the material's behavior needs.

use crate::{MaterialDef, MaterialId};
use serde::{Deserialize, Serialize};

/// Flag bits for cell state
pub mod cell_flags {
    pub const UPDATED: u16 = 1 << 0; // Already updated this frame
}

/// Phase of a bird's life cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BirdPhase {
    #[default]
    Flying,
    /// Hungry: heading for the nearest organic cell
    Seeking,
    /// Resting on a solid surface
    Perched,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BirdState {
    pub phase: BirdPhase,
    pub hunger: u16,
    /// Frames left in the current phase
    pub timer: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FishState {
    /// Frames spent out of water
    pub suffocation: u16,
    pub hunger: u16,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildPhase {
    #[default]
    Walking,
    Building,
    /// Out of bricks, stays put
    Done,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderState {
    pub phase: BuildPhase,
    /// -1 = left, 1 = right
    pub dir: i8,
    /// Steps walked since the last brick
    pub steps: u16,
    pub bricks_laid: u16,
}

impl Default for BuilderState {
    fn default() -> Self {
        Self {
            phase: BuildPhase::Walking,
            dir: 1,
            steps: 0,
            bricks_laid: 0,
        }
    }
}

/// Behavior-specific auxiliary state, one variant per material family
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellData {
    #[default]
    None,
    /// Plants and seeds
    Growth { stage: u8, moisture: u8 },
    Bird(BirdState),
    Fish(FishState),
    Builder(BuilderState),
}

/// A single cell in the grid
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Material id (0 = empty)
    pub material: u16,
    /// Frames left before the cell turns empty (-1 = infinite)
    pub lifetime: i32,
    /// State flags (see [`cell_flags`])
    pub flags: u16,
    pub data: CellData,
}

impl Cell {
    pub const EMPTY: Cell = Cell {
        material: MaterialId::EMPTY,
        lifetime: -1,
        flags: 0,
        data: CellData::None,
    };

    /// Fresh cell of the given material: default lifetime, no flags, no aux data
    pub fn new(material: &MaterialDef) -> Self {
        Self {
            material: material.id,
            lifetime: material.lifetime,
            flags: 0,
            data: CellData::None,
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.material == MaterialId::EMPTY
    }

    #[inline]
    pub fn is_updated(&self) -> bool {
        self.flags & cell_flags::UPDATED != 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::EMPTY
    }
}
