//! Organism behaviors - birds, fish and builders
//!
//! Organisms keep their phase and timers in the cell's [`CellData`] and move
//! with the same primitives as plain materials, so a swap carries the state
//! along with the creature.

use glam::IVec2;

use super::Grid;
use super::ca_update::{CellularAutomataUpdater, Outcome};
use crate::simulation::{
    BirdPhase, BirdState, BuildPhase, BuilderState, CellData, FishState, MaterialId,
    MaterialTags, Materials,
};
use crate::world::{SimStats, WorldRng};

// Birds
const BIRD_SEEK_HUNGER: u16 = 200;
const BIRD_STARVE_HUNGER: u16 = 600;
const BIRD_SEEK_RADIUS: i32 = 4;
const BIRD_PERCH_CHANCE: f32 = 0.02;
const BIRD_PERCH_TICKS: u16 = 60;
/// Birds only breed while well fed
const BIRD_BREED_HUNGER: u16 = 100;
const BIRD_BREED_CHANCE: f32 = 0.1;
const BIRD_BREED_COST: u16 = 50;

// Fish
const FISH_SUFFOCATION_TICKS: u16 = 120;
const FISH_STARVE_HUNGER: u16 = 1200;
const FISH_SWIM_CHANCE: f32 = 0.5;

// Builders
const BUILDER_BRICK_INTERVAL: u16 = 12;
const BUILDER_MAX_BRICKS: u16 = 8;

const NEIGHBORS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Handles the organism state machines
pub struct OrganismSystem;

impl OrganismSystem {
    /// Update a bird: fly around, look for food when hungry, perch and breed
    pub fn update_bird<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> Outcome {
        let mut state = match grid.get(x, y).map(|c| c.data) {
            Some(CellData::Bird(state)) => state,
            _ => BirdState::default(),
        };

        state.hunger = state.hunger.saturating_add(1);
        if state.hunger >= BIRD_STARVE_HUNGER {
            log::debug!("bird starved at ({}, {})", x, y);
            grid.clear(x, y);
            return Outcome::Changed;
        }

        let mut pos = IVec2::new(x, y);
        match state.phase {
            BirdPhase::Flying => {
                if state.hunger >= BIRD_SEEK_HUNGER {
                    state.phase = BirdPhase::Seeking;
                } else if !grid.is_empty_at(x, y + 1)
                    && grid.in_bounds(x, y + 1)
                    && rng.check_probability(BIRD_PERCH_CHANCE)
                {
                    state.phase = BirdPhase::Perched;
                    state.timer = BIRD_PERCH_TICKS;
                } else {
                    pos = Self::fly_randomly(grid, pos, stats, rng);
                }
            }
            BirdPhase::Seeking => match Self::find_food(grid, pos, materials) {
                Some(food) if (food - pos).abs().max_element() <= 1 => {
                    grid.clear(food.x, food.y);
                    log::trace!("bird at ({}, {}) ate at {:?}", x, y, food);
                    state.hunger = 0;
                    state.phase = BirdPhase::Flying;
                }
                Some(food) => {
                    let step = (food - pos).signum();
                    pos = Self::fly_to(grid, pos, pos + step, stats).unwrap_or(pos);
                }
                None => pos = Self::fly_randomly(grid, pos, stats, rng),
            },
            BirdPhase::Perched => {
                state.timer = state.timer.saturating_sub(1);
                if state.timer == 0 {
                    state.phase = BirdPhase::Flying;
                    if state.hunger < BIRD_BREED_HUNGER && rng.check_probability(BIRD_BREED_CHANCE)
                    {
                        if Self::breed(grid, pos, materials, rng) {
                            state.hunger = state.hunger.saturating_add(BIRD_BREED_COST);
                        }
                    }
                }
            }
        }

        if let Some(data) = grid.data_mut(pos.x, pos.y) {
            *data = CellData::Bird(state);
        }
        if pos != IVec2::new(x, y) {
            Outcome::Moved(pos)
        } else {
            Outcome::Changed
        }
    }

    /// Nearest organic cell (other than birds) within the seek radius
    fn find_food(grid: &Grid, pos: IVec2, materials: &Materials) -> Option<IVec2> {
        let mut best: Option<(i32, IVec2)> = None;
        for dy in -BIRD_SEEK_RADIUS..=BIRD_SEEK_RADIUS {
            for dx in -BIRD_SEEK_RADIUS..=BIRD_SEEK_RADIUS {
                if dx == 0 && dy == 0 {
                    continue;
                }
                let at = pos + IVec2::new(dx, dy);
                let Some(id) = grid.material_at(at.x, at.y) else {
                    continue;
                };
                if id == MaterialId::BIRD {
                    continue;
                }
                let edible = materials
                    .get(id)
                    .is_some_and(|m| m.has(MaterialTags::ORGANIC));
                let dist = dx * dx + dy * dy;
                if edible && best.map_or(true, |(d, _)| dist < d) {
                    best = Some((dist, at));
                }
            }
        }
        best.map(|(_, at)| at)
    }

    fn fly_randomly<R: WorldRng>(
        grid: &mut Grid,
        pos: IVec2,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> IVec2 {
        let step = IVec2::new(rng.gen_range_i32(-1, 2), rng.gen_range_i32(-1, 2));
        if step == IVec2::ZERO {
            return pos;
        }
        Self::fly_to(grid, pos, pos + step, stats).unwrap_or(pos)
    }

    /// Birds only fly through empty cells
    fn fly_to(grid: &mut Grid, from: IVec2, to: IVec2, stats: &mut dyn SimStats) -> Option<IVec2> {
        if !grid.is_empty_at(to.x, to.y) || !grid.swap(from.x, from.y, to.x, to.y) {
            return None;
        }
        stats.record_cell_moved();
        Some(to)
    }

    fn breed<R: WorldRng>(grid: &mut Grid, pos: IVec2, materials: &Materials, rng: &mut R) -> bool {
        let Some(bird) = materials.get(MaterialId::BIRD) else {
            return false;
        };
        let start = rng.gen_range_i32(0, NEIGHBORS_8.len() as i32) as usize;
        for i in 0..NEIGHBORS_8.len() {
            let (dx, dy) = NEIGHBORS_8[(start + i) % NEIGHBORS_8.len()];
            let (cx, cy) = (pos.x + dx, pos.y + dy);
            if grid.is_empty_at(cx, cy) {
                grid.set_with_data(cx, cy, bird, CellData::Bird(BirdState::default()));
                grid.mark_updated(cx, cy);
                log::debug!("bird hatched at ({}, {})", cx, cy);
                return true;
            }
        }
        false
    }

    /// Update a fish: swim through water, suffocate and fall on land
    pub fn update_fish<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> Outcome {
        let mut state = match grid.get(x, y).map(|c| c.data) {
            Some(CellData::Fish(state)) => state,
            _ => FishState::default(),
        };

        let in_water = [(0, -1), (0, 1), (-1, 0), (1, 0)]
            .iter()
            .any(|&(dx, dy)| grid.material_at(x + dx, y + dy) == Some(MaterialId::WATER));

        let mut pos = IVec2::new(x, y);
        if in_water {
            state.suffocation = 0;
            state.hunger = state.hunger.saturating_add(1);
            if state.hunger >= FISH_STARVE_HUNGER {
                log::debug!("fish starved at ({}, {})", x, y);
                grid.clear(x, y);
                return Outcome::Changed;
            }
            if rng.check_probability(FISH_SWIM_CHANCE) {
                let step = IVec2::new(rng.gen_range_i32(-1, 2), rng.gen_range_i32(-1, 2));
                let to = pos + step;
                if step != IVec2::ZERO
                    && grid.material_at(to.x, to.y) == Some(MaterialId::WATER)
                    && grid.swap(x, y, to.x, to.y)
                {
                    stats.record_cell_moved();
                    pos = to;
                }
            }
        } else {
            state.suffocation = state.suffocation.saturating_add(1);
            if state.suffocation >= FISH_SUFFOCATION_TICKS {
                log::debug!("fish suffocated at ({}, {})", x, y);
                grid.clear(x, y);
                return Outcome::Changed;
            }
            if CellularAutomataUpdater::try_move(grid, x, y, x, y + 1, materials, stats) {
                pos = IVec2::new(x, y + 1);
            }
        }

        if let Some(data) = grid.data_mut(pos.x, pos.y) {
            *data = CellData::Fish(state);
        }
        if pos != IVec2::new(x, y) {
            Outcome::Moved(pos)
        } else {
            Outcome::Changed
        }
    }

    /// Update a builder: walk along the ground, lay a brick every few steps
    pub fn update_builder<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        stats: &mut dyn SimStats,
        _rng: &mut R,
    ) -> Outcome {
        let mut state = match grid.get(x, y).map(|c| c.data) {
            Some(CellData::Builder(state)) => state,
            _ => BuilderState::default(),
        };

        // Unsupported builders fall regardless of phase
        if grid.is_empty_at(x, y + 1) && grid.swap(x, y, x, y + 1) {
            stats.record_cell_moved();
            if let Some(data) = grid.data_mut(x, y + 1) {
                *data = CellData::Builder(state);
            }
            return Outcome::Moved(IVec2::new(x, y + 1));
        }

        let mut pos = IVec2::new(x, y);
        match state.phase {
            BuildPhase::Done => return Outcome::Unchanged,
            BuildPhase::Walking => {
                let dir = state.dir as i32;
                let ahead = IVec2::new(x + dir, y);
                let climb = IVec2::new(x + dir, y - 1);
                let target = if grid.is_empty_at(ahead.x, ahead.y) {
                    Some(ahead)
                } else if grid.is_empty_at(climb.x, climb.y) && grid.is_empty_at(x, y - 1) {
                    Some(climb)
                } else {
                    None
                };

                match target {
                    Some(to) if grid.swap(x, y, to.x, to.y) => {
                        stats.record_cell_moved();
                        pos = to;
                        state.steps += 1;
                        if state.steps >= BUILDER_BRICK_INTERVAL {
                            state.phase = BuildPhase::Building;
                        }
                    }
                    _ => state.dir = -state.dir,
                }
            }
            BuildPhase::Building => {
                let behind = x - state.dir as i32;
                if grid.is_empty_at(behind, y) {
                    if let Some(brick) = materials.get(MaterialId::BRICK) {
                        grid.set(behind, y, brick);
                        state.bricks_laid += 1;
                        log::trace!("builder laid brick {} at ({}, {})", state.bricks_laid, behind, y);
                    }
                }
                state.steps = 0;
                state.phase = if state.bricks_laid >= BUILDER_MAX_BRICKS {
                    BuildPhase::Done
                } else {
                    BuildPhase::Walking
                };
            }
        }

        if let Some(data) = grid.data_mut(pos.x, pos.y) {
            *data = CellData::Builder(state);
        }
        if pos != IVec2::new(x, y) {
            Outcome::Moved(pos)
        } else {
            Outcome::Changed
        }
    }
}
