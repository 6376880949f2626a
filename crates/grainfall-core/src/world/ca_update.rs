//! Cellular automata update logic - material movement physics

use glam::IVec2;

use super::Grid;
use super::organisms::OrganismSystem;
use crate::simulation::{Behavior, CellData, MaterialId, Materials};
use crate::world::{SimStats, WorldRng};

/// Chance per tick that a fire cell turns into smoke early
const FIRE_TO_SMOKE_CHANCE: f32 = 0.02;
/// Chance per tick that a watered plant grows
const PLANT_GROWTH_CHANCE: f32 = 0.05;
/// Plants stop growing at this stage
const PLANT_MAX_STAGE: u8 = 12;
/// Ticks a seed must rest on soil before sprouting
const SEED_GERMINATION_TICKS: u8 = 30;
/// Moisture a fresh sprout starts with
const SPROUT_MOISTURE: u8 = 8;

/// What a cell update did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    /// Changed in place (state or material)
    Changed,
    /// The cell now lives at this position
    Moved(IVec2),
}

impl Outcome {
    pub fn changed(self) -> bool {
        !matches!(self, Outcome::Unchanged)
    }

    /// Where the updated cell ended up
    pub fn position(self, x: i32, y: i32) -> IVec2 {
        match self {
            Outcome::Moved(pos) => pos,
            _ => IVec2::new(x, y),
        }
    }
}

/// Cellular automata updater - handles material movement physics
pub struct CellularAutomataUpdater;

impl CellularAutomataUpdater {
    /// Run the behavior of the cell at (x, y)
    ///
    /// Empty cells and unknown materials are left alone.
    pub fn update<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> Outcome {
        let Some(cell) = grid.get(x, y) else {
            return Outcome::Unchanged;
        };
        let Some(material) = materials.get(cell.material) else {
            log::trace!("update: unknown material {} at ({}, {})", cell.material, x, y);
            return Outcome::Unchanged;
        };

        match material.behavior {
            Behavior::Static => Outcome::Unchanged,
            Behavior::Powder => Self::update_powder(grid, x, y, materials, stats, rng),
            Behavior::Liquid => {
                let dispersion = material.dispersion.max(1) as i32;
                Self::update_liquid(grid, x, y, dispersion, materials, stats, rng)
            }
            Behavior::Gas => Self::update_gas(grid, x, y, materials, stats, rng),
            Behavior::Fire => Self::update_fire(grid, x, y, materials, stats, rng),
            Behavior::Plant => Self::update_plant(grid, x, y, materials, rng),
            Behavior::Seed => Self::update_seed(grid, x, y, materials, stats, rng),
            Behavior::Bird => OrganismSystem::update_bird(grid, x, y, materials, stats, rng),
            Behavior::Fish => OrganismSystem::update_fish(grid, x, y, materials, stats, rng),
            Behavior::Builder => {
                OrganismSystem::update_builder(grid, x, y, materials, stats, rng)
            }
        }
    }

    /// Update powder material (falls down, slides diagonally)
    ///
    /// A diagonal slide needs the cell beside the mover to be passable too,
    /// so powder can't squeeze between two diagonal neighbours and piles
    /// keep a 45 degree slope.
    pub fn update_powder<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> Outcome {
        // Try to move down
        if Self::try_move(grid, x, y, x, y + 1, materials, stats) {
            return Outcome::Moved(IVec2::new(x, y + 1));
        }

        // Try diagonal slide (random direction first)
        let dx = rng.gen_sign();
        for dir in [dx, -dx] {
            let from = IVec2::new(x, y);
            if !grid.can_move_to(materials, from, IVec2::new(x + dir, y)) {
                continue;
            }
            if Self::try_move(grid, x, y, x + dir, y + 1, materials, stats) {
                return Outcome::Moved(IVec2::new(x + dir, y + 1));
            }
        }

        Outcome::Unchanged
    }

    /// Update liquid material (falls, then flows sideways up to `dispersion` cells)
    pub fn update_liquid<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        dispersion: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> Outcome {
        // Try to move down first
        if Self::try_move(grid, x, y, x, y + 1, materials, stats) {
            return Outcome::Moved(IVec2::new(x, y + 1));
        }

        // Diagonal down (for flowing over edges)
        let dx = rng.gen_sign();
        for dir in [dx, -dx] {
            if Self::try_move(grid, x, y, x + dir, y + 1, materials, stats) {
                return Outcome::Moved(IVec2::new(x + dir, y + 1));
            }
        }

        // Lateral flow: travel as far as the way is clear, stopping over a drop
        let from = IVec2::new(x, y);
        for dir in [dx, -dx] {
            let mut target = None;
            for step in 1..=dispersion {
                let to = IVec2::new(x + dir * step, y);
                if !grid.can_move_to(materials, from, to) {
                    break;
                }
                target = Some(to);
                if grid.can_move_to(materials, from, to + IVec2::Y) {
                    break;
                }
            }
            if let Some(to) = target {
                if Self::try_move(grid, x, y, to.x, to.y, materials, stats) {
                    return Outcome::Moved(to);
                }
            }
        }

        Outcome::Unchanged
    }

    /// Update gas material (rises up, disperses)
    pub fn update_gas<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> Outcome {
        // Try to move up
        if Self::try_move(grid, x, y, x, y - 1, materials, stats) {
            return Outcome::Moved(IVec2::new(x, y - 1));
        }

        // Try diagonal up, then sideways (random direction first)
        let dx = rng.gen_sign();
        for (dir_x, dir_y) in [(dx, -1), (-dx, -1), (dx, 0), (-dx, 0)] {
            if Self::try_move(grid, x, y, x + dir_x, y + dir_y, materials, stats) {
                return Outcome::Moved(IVec2::new(x + dir_x, y + dir_y));
            }
        }

        Outcome::Unchanged
    }

    /// Update fire (flickers upward, sometimes turns to smoke before burning out)
    pub fn update_fire<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> Outcome {
        if rng.check_probability(FIRE_TO_SMOKE_CHANCE) {
            if let Some(smoke) = materials.get(MaterialId::SMOKE) {
                grid.set(x, y, smoke);
                return Outcome::Changed;
            }
        }

        // Flames only rise every other tick on average
        if rng.gen_bool() {
            return Outcome::Unchanged;
        }
        let dx = rng.gen_range_i32(-1, 2);
        if Self::try_move(grid, x, y, x + dx, y - 1, materials, stats) {
            return Outcome::Moved(IVec2::new(x + dx, y - 1));
        }
        Outcome::Unchanged
    }

    /// Update plant (grows into empty cells above while it has moisture)
    pub fn update_plant<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        rng: &mut R,
    ) -> Outcome {
        let (stage, moisture) = match grid.get(x, y).map(|c| c.data) {
            Some(CellData::Growth { stage, moisture }) => (stage, moisture),
            _ => (0, 0),
        };
        if moisture == 0 || stage >= PLANT_MAX_STAGE {
            return Outcome::Unchanged;
        }
        if !rng.check_probability(PLANT_GROWTH_CHANCE) {
            return Outcome::Unchanged;
        }
        let Some(plant) = materials.get(MaterialId::PLANT) else {
            return Outcome::Unchanged;
        };

        let dx = rng.gen_range_i32(-1, 2);
        let (gx, gy) = (x + dx, y - 1);
        if !grid.is_empty_at(gx, gy) {
            return Outcome::Unchanged;
        }

        // Split the remaining moisture between the stem and the new tip
        let remaining = moisture - 1;
        let tip = remaining / 2;
        grid.set_with_data(
            gx,
            gy,
            plant,
            CellData::Growth {
                stage: stage + 1,
                moisture: tip,
            },
        );
        grid.mark_updated(gx, gy);
        if let Some(data) = grid.data_mut(x, y) {
            *data = CellData::Growth {
                stage,
                moisture: remaining - tip,
            };
        }
        log::trace!("plant at ({}, {}) grew to ({}, {})", x, y, gx, gy);
        Outcome::Changed
    }

    /// Update seed (falls like powder, sprouts after resting on soil)
    pub fn update_seed<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> Outcome {
        let moved = Self::update_powder(grid, x, y, materials, stats, rng);
        if moved.changed() {
            return moved;
        }

        let on_soil = matches!(
            grid.material_at(x, y + 1),
            Some(MaterialId::DIRT) | Some(MaterialId::WET_SAND)
        );
        let timer = match grid.get(x, y).map(|c| c.data) {
            Some(CellData::Growth { stage, .. }) => stage,
            _ => 0,
        };

        if !on_soil {
            if timer > 0 {
                if let Some(data) = grid.data_mut(x, y) {
                    *data = CellData::None;
                }
                return Outcome::Changed;
            }
            return Outcome::Unchanged;
        }

        if timer + 1 >= SEED_GERMINATION_TICKS {
            if let Some(plant) = materials.get(MaterialId::PLANT) {
                grid.set_with_data(
                    x,
                    y,
                    plant,
                    CellData::Growth {
                        stage: 0,
                        moisture: SPROUT_MOISTURE,
                    },
                );
                log::trace!("seed sprouted at ({}, {})", x, y);
                return Outcome::Changed;
            }
            return Outcome::Unchanged;
        }

        if let Some(data) = grid.data_mut(x, y) {
            *data = CellData::Growth {
                stage: timer + 1,
                moisture: 0,
            };
        }
        Outcome::Changed
    }

    /// Try to move a cell from one position to another
    /// Returns true if the move succeeded
    pub(super) fn try_move(
        grid: &mut Grid,
        from_x: i32,
        from_y: i32,
        to_x: i32,
        to_y: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
    ) -> bool {
        let from = IVec2::new(from_x, from_y);
        let to = IVec2::new(to_x, to_y);
        if !grid.can_move_to(materials, from, to) {
            return false;
        }
        if grid.swap(from_x, from_y, to_x, to_y) {
            stats.record_cell_moved();
            return true;
        }
        false
    }
}
