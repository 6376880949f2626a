//! Benchmark: cost of one full tick (grid sweep + particle step)
//!
//! Worlds are rebuilt for every iteration so the grid is actively moving
//! rather than settled.

use std::hint::black_box;

use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use grainfall_core::simulation::MaterialId;
use grainfall_core::{SimConfig, World, WorldConfig};

fn world(width: u32, height: u32) -> World {
    World::with_default_materials(SimConfig {
        world: WorldConfig {
            width,
            height,
            seed: Some(7),
            ..Default::default()
        },
        ..Default::default()
    })
}

/// Empty grid - baseline cost of scanning every cell
fn bench_tick_empty(c: &mut Criterion) {
    c.bench_function("tick_empty_256x256", |b| {
        let mut world = world(256, 256);
        b.iter(|| {
            world.tick();
            black_box(world.stats().last_tick);
        });
    });
}

fn bench_tick_sand_falling(c: &mut Criterion) {
    c.bench_function("tick_sand_falling_256x256", |b| {
        b.iter_batched(
            || {
                let mut world = world(256, 256);
                world.fill_rect(0, 0, 256, 51, MaterialId::SAND);
                world
            },
            |mut world| {
                world.tick();
                black_box(world.stats().last_tick);
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_tick_water_body(c: &mut Criterion) {
    c.bench_function("tick_water_body_256x256", |b| {
        b.iter_batched(
            || {
                let mut world = world(256, 256);
                world.fill_rect(0, 128, 128, 128, MaterialId::WATER);
                world
            },
            |mut world| {
                world.tick();
                black_box(world.stats().last_tick);
            },
            BatchSize::SmallInput,
        );
    });
}

/// Sand, water, wood and fire together: movement plus reactions
fn bench_tick_mixed_active(c: &mut Criterion) {
    c.bench_function("tick_mixed_active_256x256", |b| {
        b.iter_batched(
            || {
                let mut world = world(256, 256);
                world.fill_rect(0, 200, 256, 56, MaterialId::WATER);
                world.fill_rect(0, 150, 256, 10, MaterialId::WOOD);
                world.fill_rect(0, 140, 256, 4, MaterialId::FIRE);
                world.fill_rect(0, 0, 256, 40, MaterialId::SAND);
                world
            },
            |mut world| {
                world.tick();
                black_box(world.stats().last_tick);
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_tick_particles(c: &mut Criterion) {
    c.bench_function("tick_2000_particles_128x128", |b| {
        b.iter_batched(
            || {
                let mut world = world(128, 128);
                world.fill_rect(0, 120, 128, 8, MaterialId::STONE);
                for i in 0..2000 {
                    let x = (i % 100) as f32 + 14.5;
                    let y = (i / 100) as f32 * 2.0 + 10.5;
                    let material = if i % 2 == 0 {
                        MaterialId::WATER
                    } else {
                        MaterialId::SAND
                    };
                    world.spawn_particle(x, y, material);
                }
                world
            },
            |mut world| {
                world.tick();
                black_box(world.particles().len());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_tick_empty,
    bench_tick_sand_falling,
    bench_tick_water_body,
    bench_tick_mixed_active,
    bench_tick_particles
);
criterion_main!(benches);
