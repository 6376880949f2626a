//! Integration tests for whole-engine properties
//!
//! These drive the public API only: a `World` (or a bare `Grid`) plus the
//! built-in material catalog, with seeded generators for reproducibility.

use std::sync::Arc;

use glam::IVec2;
use grainfall_core::simulation::{
    Behavior, InteractionRules, MaterialDef, MaterialId, MaterialTags, Materials, Phase,
};
use grainfall_core::world::{ChemistrySystem, Grid};
use grainfall_core::{InteractionConfig, SimConfig, World, WorldConfig};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

fn world_config(width: u32, height: u32, seed: u64) -> SimConfig {
    SimConfig {
        world: WorldConfig {
            width,
            height,
            seed: Some(seed),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn world(width: u32, height: u32, seed: u64) -> World {
    World::with_default_materials(world_config(width, height, seed))
}

// ============================================================================
// Cell store
// ============================================================================

#[test]
fn test_stable_pile_rule_for_every_pair() {
    let materials = Materials::new();
    let defs: Vec<&MaterialDef> = materials.iter().filter(|m| !m.is_empty()).collect();

    for src in &defs {
        for dst in &defs {
            let mut grid = Grid::new(2, 1);
            grid.set(0, 0, src);
            grid.set(1, 0, dst);
            let can_move = grid.can_move_to(&materials, IVec2::new(0, 0), IVec2::new(1, 0));

            let both_powder = src.phase == Phase::Powder && dst.phase == Phase::Powder;
            let expected = !both_powder && dst.movable && src.density > dst.density;
            assert_eq!(
                can_move, expected,
                "{} -> {}: expected {}",
                src.name, dst.name, expected
            );
            if both_powder {
                assert!(!can_move, "powder {} displaced powder {}", src.name, dst.name);
            }
        }
    }
}

#[test]
fn test_set_twice_is_idempotent_for_every_material() {
    let materials = Materials::new();
    for def in materials.iter() {
        let mut grid = Grid::new(3, 3);
        grid.set(1, 1, def);
        let first = *grid.get(1, 1).unwrap();
        grid.set(1, 1, def);
        let second = *grid.get(1, 1).unwrap();

        assert_eq!(first, second, "{}", def.name);
        assert_eq!(second.lifetime, def.lifetime);
    }
}

#[test]
fn test_non_empty_counter_survives_random_edits() {
    let materials = Materials::new();
    let ids: Vec<u16> = materials.iter().map(|m| m.id).collect();
    let mut grid = Grid::new(16, 12);
    let mut rng = Xoshiro256StarStar::seed_from_u64(99);

    for _ in 0..5_000 {
        // Coordinates deliberately reach outside the grid
        let x = rng.gen_range(-2..18);
        let y = rng.gen_range(-2..14);
        match rng.gen_range(0..3) {
            0 => {
                let id = ids[rng.gen_range(0..ids.len())];
                grid.set_id(&materials, x, y, id);
            }
            1 => {
                grid.swap(x, y, rng.gen_range(-2..18), rng.gen_range(-2..14));
            }
            _ => grid.clear(x, y),
        }
        assert_eq!(grid.count_non_empty(), grid.recount_non_empty());
    }
}

#[test]
fn test_non_empty_counter_survives_simulation() {
    let mut world = world(48, 48, 5);
    world.fill_rect(0, 44, 48, 4, MaterialId::STONE);
    world.paint(10, 10, 4, MaterialId::SAND);
    world.paint(24, 12, 5, MaterialId::WATER);
    world.paint(36, 30, 3, MaterialId::WOOD);
    world.set(36, 26, MaterialId::FIRE);
    world.paint(30, 20, 2, MaterialId::LAVA);
    world.paint(16, 30, 2, MaterialId::ACID);
    world.set(5, 5, MaterialId::BIRD);
    world.set(24, 40, MaterialId::FISH);
    world.set(40, 43, MaterialId::BUILDER);

    for _ in 0..300 {
        world.tick();
        let grid = world.grid();
        assert_eq!(grid.count_non_empty(), grid.recount_non_empty());
    }
}

// ============================================================================
// Persistence
// ============================================================================

#[test]
fn test_round_trip_after_simulation() {
    let mut source = world(32, 24, 11);
    source.paint(16, 4, 4, MaterialId::SAND);
    source.paint(8, 10, 3, MaterialId::WATER);
    source.fill_rect(0, 20, 32, 4, MaterialId::STONE);
    for _ in 0..40 {
        source.tick();
    }
    let saved = source.save();

    let mut target = world(32, 24, 12);
    target.load(&saved).expect("same-size load");

    let a = source.grid();
    let b = target.grid();
    for y in 0..24 {
        for x in 0..32 {
            assert_eq!(a.material_at(x, y), b.material_at(x, y), "({}, {})", x, y);
        }
    }
}

#[test]
fn test_size_mismatch_rejects_without_mutation() {
    let source = {
        let mut w = world(10, 10, 1);
        w.paint(5, 5, 2, MaterialId::SAND);
        w.save()
    };

    let mut target = world(12, 10, 2);
    target.paint(3, 3, 2, MaterialId::STONE);
    let before = target.save();

    assert!(target.load(&source).is_err());
    assert_eq!(target.save(), before);
}

// ============================================================================
// Movement
// ============================================================================

#[test]
fn test_powder_column_settles_at_bottom_without_oscillating() {
    const HEIGHT: i32 = 20;
    const COLUMN: i32 = 5;

    for seed in 0..10 {
        let mut world = world(1, HEIGHT as u32, seed);
        world.fill_rect(0, 0, 1, COLUMN, MaterialId::SAND);

        let mut settled_after = None;
        for tick in 0..HEIGHT * 2 {
            world.tick();
            if world.stats().last_tick.cells_moved == 0 {
                settled_after = Some(tick);
                break;
            }
        }
        assert!(settled_after.is_some(), "seed {} never settled", seed);

        for y in 0..HEIGHT {
            let expected = if y >= HEIGHT - COLUMN {
                MaterialId::SAND
            } else {
                MaterialId::EMPTY
            };
            assert_eq!(world.grid().material_at(0, y), Some(expected), "row {}", y);
        }

        // Nothing moves once settled
        let snapshot = world.save();
        for _ in 0..50 {
            world.tick();
            assert_eq!(world.stats().last_tick.cells_moved, 0);
        }
        assert_eq!(world.save(), snapshot);
    }
}

#[test]
fn test_water_levels_out() {
    let mut world = world(20, 10, 3);
    world.fill_rect(0, 9, 20, 1, MaterialId::STONE);
    world.fill_rect(0, 0, 4, 9, MaterialId::WATER);

    for _ in 0..400 {
        world.tick();
    }

    // 36 water cells over a 20-wide floor: no column should stay much taller
    let heights: Vec<i32> = (0..20)
        .map(|x| {
            (0..9)
                .filter(|&y| world.grid().material_at(x, y) == Some(MaterialId::WATER))
                .count() as i32
        })
        .collect();
    let max = *heights.iter().max().unwrap();
    let min = *heights.iter().min().unwrap();
    assert!(max - min <= 2, "uneven water: {:?}", heights);
}

// ============================================================================
// Interactions
// ============================================================================

fn register_fuel(materials: &mut Materials, resistance: f32) -> u16 {
    let id = 200;
    materials.register(MaterialDef {
        id,
        name: "test_fuel".to_string(),
        phase: Phase::Solid,
        ignition_resistance: resistance,
        tags: MaterialTags::COMBUSTIBLE,
        behavior: Behavior::Static,
        ..Default::default()
    });
    id
}

fn register_heater(materials: &mut Materials) -> u16 {
    let id = 201;
    materials.register(MaterialDef {
        id,
        name: "test_heater".to_string(),
        phase: Phase::Solid,
        tags: MaterialTags::HEAT_SOURCE,
        behavior: Behavior::Static,
        ..Default::default()
    });
    id
}

#[test]
fn test_ignition_rate_close_to_fifteen_percent() {
    let mut materials = Materials::new();
    let fuel = register_fuel(&mut materials, 0.0);
    let heater = register_heater(&mut materials);
    let rules = InteractionRules::standard(&InteractionConfig::default());
    let mut grid = Grid::new(2, 1);
    let mut rng = Xoshiro256StarStar::seed_from_u64(2024);

    let trials = 40_000;
    let mut ignitions = 0;
    for _ in 0..trials {
        grid.set_id(&materials, 0, 0, fuel);
        grid.set_id(&materials, 1, 0, heater);
        ChemistrySystem::check_interaction(&mut grid, &materials, &rules, 1, 0, 0, 0, &mut rng);
        if grid.material_at(0, 0) == Some(MaterialId::FIRE) {
            ignitions += 1;
        }
    }

    let rate = ignitions as f64 / trials as f64;
    assert!((rate - 0.15).abs() < 0.01, "ignition rate {}", rate);
}

#[test]
fn test_oxygen_next_to_fire_turns_to_fire_at_oxidation_rate() {
    let materials = Materials::new();
    let config = InteractionConfig::default();
    let rules = InteractionRules::standard(&config);
    let mut grid = Grid::new(2, 1);
    let mut rng = Xoshiro256StarStar::seed_from_u64(31);

    let trials = 40_000;
    let mut oxidized = 0;
    for _ in 0..trials {
        grid.set_id(&materials, 0, 0, MaterialId::OXYGEN);
        grid.set_id(&materials, 1, 0, MaterialId::FIRE);
        ChemistrySystem::check_interaction(&mut grid, &materials, &rules, 1, 0, 0, 0, &mut rng);
        assert_eq!(grid.material_at(1, 0), Some(MaterialId::FIRE));
        if grid.material_at(0, 0) == Some(MaterialId::FIRE) {
            oxidized += 1;
        }
    }

    let rate = oxidized as f64 / trials as f64;
    assert!(
        (rate - config.oxidation as f64).abs() < 0.01,
        "oxidation rate {}",
        rate
    );
}

#[test]
fn test_fully_resistant_fuel_never_ignites_in_world() {
    let mut materials = Materials::new();
    let fuel = register_fuel(&mut materials, 1.0);
    let heater = register_heater(&mut materials);
    let mut world = World::new(world_config(5, 5, 8), Arc::new(materials));
    world.fill_rect(0, 0, 5, 5, heater);
    world.set(2, 2, fuel);

    for _ in 0..2_000 {
        world.tick();
    }
    assert_eq!(world.grid().material_at(2, 2), Some(fuel));
}

#[test]
fn test_fire_spreads_through_wood_and_burns_out() {
    let mut world = world(12, 12, 21);
    world.fill_rect(4, 6, 4, 4, MaterialId::WOOD);
    // Walled in by wood, so it cannot drift away before catching
    world.set(5, 7, MaterialId::FIRE);
    let wood_before = world.grid().count_material(MaterialId::WOOD);

    for _ in 0..3_000 {
        world.tick();
    }

    assert!(world.grid().count_material(MaterialId::WOOD) < wood_before);
    assert_eq!(world.grid().count_material(MaterialId::FIRE), 0);
    assert!(world.stats().interactions > 0);
}

#[test]
fn test_lava_and_water_make_stone_and_steam() {
    let mut world = world(8, 6, 4);
    world.fill_rect(0, 5, 8, 1, MaterialId::STONE);
    world.fill_rect(0, 4, 4, 1, MaterialId::LAVA);
    world.fill_rect(4, 4, 4, 1, MaterialId::WATER);

    let stone_before = world.grid().count_material(MaterialId::STONE);
    for _ in 0..200 {
        world.tick();
    }
    assert!(world.grid().count_material(MaterialId::STONE) > stone_before);
    assert!(world.stats().interactions > 0);
}

// ============================================================================
// Particles
// ============================================================================

#[test]
fn test_particles_stay_inside_world() {
    const W: f32 = 40.0;
    const H: f32 = 30.0;
    let mut world = world(40, 30, 17);
    world.fill_rect(10, 20, 20, 2, MaterialId::STONE);
    world.fill_rect(0, 10, 3, 12, MaterialId::WOOD);

    let mut rng = Xoshiro256StarStar::seed_from_u64(17);
    let kinds = [MaterialId::SAND, MaterialId::WATER, MaterialId::STEAM];
    for i in 0..300 {
        let x = rng.gen_range(3.5..37.0);
        let y = rng.gen_range(0.5..18.0);
        world.spawn_particle(x, y, kinds[i % kinds.len()]);
    }

    for _ in 0..400 {
        world.tick();
        for p in world.particles().iter() {
            assert!(
                p.position.x >= 0.0 && p.position.x < W,
                "x out of bounds: {:?}",
                p.position
            );
            assert!(
                p.position.y >= 0.0 && p.position.y < H,
                "y out of bounds: {:?}",
                p.position
            );
        }
    }

    assert_eq!(world.stats().particles_spawned, 300);
}

#[test]
fn test_particle_pool_exhaustion_is_graceful() {
    let mut config = world_config(20, 20, 3);
    config.particles.capacity = 10;
    let mut world = World::with_default_materials(config);

    let handles: Vec<_> = (0..20)
        .filter_map(|i| world.spawn_particle(1.5 + i as f32 * 0.5, 2.5, MaterialId::SAND))
        .collect();

    assert_eq!(handles.len(), 10);
    assert_eq!(world.particles().len(), 10);
    world.tick();
    assert!(world.particles().len() <= 10);
}

// ============================================================================
// Frame order
// ============================================================================

/// Sand centre of mass relative to the world's centre line
fn sand_offset(world: &World) -> f64 {
    let grid = world.grid();
    let centre = (grid.width() - 1) as f64 / 2.0;
    let mut sum = 0.0;
    let mut count = 0.0;
    for y in 0..grid.height() {
        for x in 0..grid.width() {
            if grid.material_at(x, y) == Some(MaterialId::SAND) {
                sum += x as f64 - centre;
                count += 1.0;
            }
        }
    }
    sum / count
}

/// Last tick at which anything in columns `xs` changed
fn settle_tick(history: &[String], width: usize, xs: std::ops::Range<usize>) -> usize {
    let column = |save: &str, x: usize| -> Vec<String> {
        let body = save.split_once('|').map(|(_, b)| b).unwrap_or("");
        body.split(',')
            .enumerate()
            .filter(|(i, _)| i % width == x)
            .map(|(_, id)| id.to_string())
            .collect()
    };
    let mut last = 0;
    for t in 1..history.len() {
        if xs
            .clone()
            .any(|x| column(&history[t], x) != column(&history[t - 1], x))
        {
            last = t;
        }
    }
    last
}

#[test]
fn test_mirrored_piles_show_no_side_bias() {
    const WIDTH: i32 = 41;
    const HEIGHT: i32 = 30;
    const RUNS: u64 = 20;

    let mut offsets = 0.0;
    let mut left_settle = 0usize;
    let mut right_settle = 0usize;

    for seed in 0..RUNS {
        let mut world = world(WIDTH as u32, HEIGHT as u32, 1_000 + seed);
        world.fill_rect(0, HEIGHT - 1, WIDTH, 1, MaterialId::STONE);
        // Mirror images around x = 20
        world.fill_rect(4, 0, 5, 10, MaterialId::SAND);
        world.fill_rect(WIDTH - 9, 0, 5, 10, MaterialId::SAND);

        let mut history = vec![world.save()];
        for _ in 0..150 {
            world.tick();
            history.push(world.save());
        }

        offsets += sand_offset(&world);
        left_settle += settle_tick(&history, WIDTH as usize, 0..20);
        right_settle += settle_tick(&history, WIDTH as usize, 21..41);
    }

    let mean_offset = offsets / RUNS as f64;
    assert!(mean_offset.abs() < 1.0, "sand drifted by {}", mean_offset);

    let ratio = left_settle as f64 / right_settle.max(1) as f64;
    assert!(
        (0.75..=1.33).contains(&ratio),
        "left settled in {} ticks, right in {}",
        left_settle,
        right_settle
    );
}
