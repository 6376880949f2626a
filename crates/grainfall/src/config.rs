//! Runner configuration with layered loading
//!
//! Configuration is loaded from multiple sources (lowest to highest priority):
//! 1. Compiled defaults
//! 2. A RON file, `grainfall.ron` unless `--config` names another (optional)
//! 3. Environment variables prefixed with `GRAINFALL_`
//!
//! Example environment variable: `GRAINFALL_WORLD__WIDTH=320`

use std::path::Path;

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use grainfall_core::SimConfig;

/// Load the simulation config, layering `path` and the environment over the defaults
pub fn load(path: &Path) -> Result<SimConfig> {
    load_with_env(path, Environment::with_prefix("GRAINFALL").separator("__"))
}

fn load_with_env(path: &Path, env: Environment) -> Result<SimConfig> {
    let defaults = SimConfig::default();

    if !path.exists() {
        log::info!("No config file at {}, using defaults", path.display());
    }

    let builder = Config::builder()
        // Layer 1: Compiled defaults
        .set_default("world.width", i64::from(defaults.world.width))?
        .set_default("world.height", i64::from(defaults.world.height))?
        .set_default("world.tick_rate", f64::from(defaults.world.tick_rate))?
        .set_default(
            "world.max_steps_per_update",
            i64::from(defaults.world.max_steps_per_update),
        )?
        .set_default("particles.capacity", defaults.particles.capacity as i64)?
        .set_default("particles.gravity", f64::from(defaults.particles.gravity))?
        .set_default(
            "interactions.ignition",
            f64::from(defaults.interactions.ignition),
        )?
        // Layer 2: Config file (optional, won't error if missing)
        .add_source(File::from(path).format(FileFormat::Ron).required(false))
        // Layer 3: Environment variables (GRAINFALL_WORLD__SEED, etc.)
        .add_source(env);

    let config = builder.build().context("Failed to build configuration")?;

    config
        .try_deserialize()
        .with_context(|| format!("Failed to deserialize configuration from {}", path.display()))
}
