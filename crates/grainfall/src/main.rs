mod config;
mod scenario;

use std::path::PathBuf;

use anyhow::{Context, anyhow};
use clap::Parser;
use grainfall_core::World;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use web_time::Instant;

use crate::scenario::Scenario;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of ticks to simulate
    #[arg(long, default_value = "600")]
    ticks: u64,

    /// RON config file layered over the built-in defaults
    #[arg(long, default_value = "grainfall.ron")]
    config: PathBuf,

    /// Starting scene: sandpile, reservoir, bonfire, volcano, garden, rain
    #[arg(long, default_value = "sandpile")]
    scenario: String,

    /// Seed for the world and the scenario layout (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Start from a saved world instead of a scenario
    #[arg(long)]
    load: Option<PathBuf>,

    /// Write the final world to this file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Log a statistics line every N ticks (0 = only at the end)
    #[arg(long, default_value = "60")]
    report_every: u64,

    /// List available scenarios
    #[arg(long)]
    list_scenarios: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list_scenarios {
        for scenario in Scenario::ALL {
            println!("{:<10} {}", scenario.name(), scenario.description());
        }
        return Ok(());
    }

    let mut sim_config = config::load(&args.config)?;
    let seed = args
        .seed
        .or(sim_config.world.seed)
        .unwrap_or_else(rand::random);
    sim_config.world.seed = Some(seed);

    let mut world = World::with_default_materials(sim_config);

    match &args.load {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read world file: {}", path.display()))?;
            world
                .load(&text)
                .with_context(|| format!("Failed to load world file: {}", path.display()))?;
        }
        None => {
            let scenario = Scenario::from_name(&args.scenario)
                .ok_or_else(|| anyhow!("Unknown scenario '{}' (try --list-scenarios)", args.scenario))?;
            let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
            scenario.setup(&mut world, &mut rng);
        }
    }

    let start = Instant::now();
    for tick in 1..=args.ticks {
        world.tick();
        if args.report_every > 0 && tick % args.report_every == 0 {
            let last = world.stats().last_tick;
            log::info!(
                "tick {}: {} cells, {} particles, {} moved, {} interactions",
                tick,
                world.grid().count_non_empty(),
                world.particles().len(),
                last.cells_moved,
                last.interactions
            );
        }
    }
    let elapsed = start.elapsed();

    let stats = world.stats();
    log::info!(
        "Ran {} ticks in {:.2?} ({:.1} ticks/s)",
        stats.ticks,
        elapsed,
        stats.ticks as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
    );
    log::info!(
        "Totals: {} moved, {} interactions, {} expired, particles {} spawned / {} settled / {} lost",
        stats.cells_moved,
        stats.interactions,
        stats.expired,
        stats.particles_spawned,
        stats.particles_settled,
        stats.particles_lost
    );

    if let Some(path) = &args.save {
        std::fs::write(path, world.save())
            .with_context(|| format!("Failed to write world file: {}", path.display()))?;
        log::info!("Saved world to {}", path.display());
    }

    Ok(())
}
