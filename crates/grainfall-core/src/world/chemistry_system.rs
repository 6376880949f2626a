//! Chemistry system - pairwise reactions between neighbouring cells

use glam::IVec2;

use super::Grid;
use crate::simulation::{
    CellData, CustomInteraction, Effect, FishState, InteractionRules, MaterialDef, MaterialId,
    MaterialTags, Materials, Operand, Phase,
};
use crate::world::{SimStats, WorldRng};

const CORRODE_CHANCE: f32 = 0.05;
/// Chance the acid is used up when it dissolves something
const CORRODE_CONSUME_CHANCE: f32 = 0.3;
const QUENCH_CHANCE: f32 = 0.2;
const ABSORB_CHANCE: f32 = 0.1;
const ABSORB_MOISTURE: u8 = 4;
const MAX_MOISTURE: u8 = 32;
const GRAZE_CHANCE: f32 = 0.02;

/// Up, down, left, right
const CARDINAL: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

/// Handles chemistry simulation: material-specific reactions first, then the rule table
pub struct ChemistrySystem;

impl ChemistrySystem {
    /// Check the four cardinal neighbours of (x, y), stopping at the first reaction
    pub fn scan_neighbors<R: WorldRng>(
        grid: &mut Grid,
        x: i32,
        y: i32,
        materials: &Materials,
        rules: &InteractionRules,
        stats: &mut dyn SimStats,
        rng: &mut R,
    ) -> bool {
        for (dx, dy) in CARDINAL {
            if Self::check_interaction(grid, materials, rules, x, y, x + dx, y + dy, rng) {
                stats.record_interaction();
                return true;
            }
        }
        false
    }

    /// Try every reaction between the cells at A and B
    ///
    /// Custom material logic runs first and either side may claim the pair;
    /// otherwise the first rule in the table that fires wins.
    #[allow(clippy::too_many_arguments)]
    pub fn check_interaction<R: WorldRng>(
        grid: &mut Grid,
        materials: &Materials,
        rules: &InteractionRules,
        xa: i32,
        ya: i32,
        xb: i32,
        yb: i32,
        rng: &mut R,
    ) -> bool {
        let (Some(id_a), Some(id_b)) = (grid.material_at(xa, ya), grid.material_at(xb, yb)) else {
            return false;
        };
        if id_a == MaterialId::EMPTY || id_b == MaterialId::EMPTY {
            return false;
        }
        let (Some(a), Some(b)) = (materials.get(id_a), materials.get(id_b)) else {
            return false;
        };

        let pos_a = IVec2::new(xa, ya);
        let pos_b = IVec2::new(xb, yb);
        if Self::custom_interaction(grid, materials, a, pos_a, b, pos_b, rng)
            || Self::custom_interaction(grid, materials, b, pos_b, a, pos_a, rng)
        {
            return true;
        }

        match rules.resolve(a, b, rng) {
            Some(effect) => {
                log::trace!(
                    "{} at {:?} + {} at {:?} -> {:?}",
                    a.name,
                    pos_a,
                    b.name,
                    pos_b,
                    effect
                );
                Self::apply_effect(grid, materials, &effect, pos_a, pos_b, rules.blast_radius);
                true
            }
            None => false,
        }
    }

    /// Write an effect's results into the grid
    ///
    /// Changed cells are marked updated so a reaction product doesn't act again
    /// in the same tick.
    pub fn apply_effect(
        grid: &mut Grid,
        materials: &Materials,
        effect: &Effect,
        first: IVec2,
        second: IVec2,
        blast_radius: i32,
    ) {
        for (operand, pos) in [(Operand::First, first), (Operand::Second, second)] {
            if let Some(id) = effect.get(operand) {
                if grid.set_id(materials, pos.x, pos.y, id) {
                    grid.mark_updated(pos.x, pos.y);
                }
            }
        }

        if let Some(operand) = effect.blast {
            let center = match operand {
                Operand::First => first,
                Operand::Second => second,
            };
            Self::blast(grid, materials, center, blast_radius);
        }
    }

    /// Fill a disc with fire, sparing non-movable solids
    pub fn blast(grid: &mut Grid, materials: &Materials, center: IVec2, radius: i32) {
        let Some(fire) = materials.get(MaterialId::FIRE) else {
            return;
        };
        log::debug!("blast at {:?} radius {}", center, radius);

        let r2 = radius * radius;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > r2 {
                    continue;
                }
                let (x, y) = (center.x + dx, center.y + dy);
                let Some(id) = grid.material_at(x, y) else {
                    continue;
                };
                let sturdy = materials
                    .get(id)
                    .is_some_and(|m| m.phase == Phase::Solid && !m.movable && !m.is_empty());
                if !sturdy {
                    grid.set(x, y, fire);
                    grid.mark_updated(x, y);
                }
            }
        }
    }

    /// Material-specific reaction of `actor` against `other`
    #[allow(clippy::too_many_arguments)]
    fn custom_interaction<R: WorldRng>(
        grid: &mut Grid,
        materials: &Materials,
        actor: &MaterialDef,
        actor_pos: IVec2,
        other: &MaterialDef,
        other_pos: IVec2,
        rng: &mut R,
    ) -> bool {
        match actor.custom {
            CustomInteraction::None => false,
            CustomInteraction::Corrode => {
                if other.has(MaterialTags::CORROSIVE) || !rng.check_probability(CORRODE_CHANCE) {
                    return false;
                }
                grid.clear(other_pos.x, other_pos.y);
                if rng.check_probability(CORRODE_CONSUME_CHANCE) {
                    grid.clear(actor_pos.x, actor_pos.y);
                }
                true
            }
            CustomInteraction::Quench => {
                let Some(vapour) = other.evaporates_into else {
                    return false;
                };
                if other.phase != Phase::Liquid
                    || !other.has(MaterialTags::EVAPORATES)
                    || !rng.check_probability(QUENCH_CHANCE)
                {
                    return false;
                }
                grid.set_id(materials, other_pos.x, other_pos.y, vapour);
                grid.set_id(materials, actor_pos.x, actor_pos.y, MaterialId::STONE);
                grid.mark_updated(other_pos.x, other_pos.y);
                grid.mark_updated(actor_pos.x, actor_pos.y);
                true
            }
            CustomInteraction::Absorb => {
                if other.id != MaterialId::WATER || !rng.check_probability(ABSORB_CHANCE) {
                    return false;
                }
                grid.clear(other_pos.x, other_pos.y);
                if let Some(data) = grid.data_mut(actor_pos.x, actor_pos.y) {
                    *data = match *data {
                        CellData::Growth { stage, moisture } => CellData::Growth {
                            stage,
                            moisture: moisture.saturating_add(ABSORB_MOISTURE).min(MAX_MOISTURE),
                        },
                        _ => CellData::Growth {
                            stage: 0,
                            moisture: ABSORB_MOISTURE,
                        },
                    };
                }
                true
            }
            CustomInteraction::Graze => {
                if other.id != MaterialId::PLANT || !rng.check_probability(GRAZE_CHANCE) {
                    return false;
                }
                grid.clear(other_pos.x, other_pos.y);
                if let Some(data) = grid.data_mut(actor_pos.x, actor_pos.y) {
                    let suffocation = match *data {
                        CellData::Fish(state) => state.suffocation,
                        _ => 0,
                    };
                    *data = CellData::Fish(FishState {
                        suffocation,
                        hunger: 0,
                    });
                }
                true
            }
        }
    }
}
