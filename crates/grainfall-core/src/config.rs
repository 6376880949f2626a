//! Simulation configuration
//!
//! Every section has compiled defaults; a partial RON document only needs to
//! name the fields it overrides.

use serde::{Deserialize, Serialize};

/// Top-level simulation configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    #[serde(default)]
    pub world: WorldConfig,
    #[serde(default)]
    pub particles: ParticleConfig,
    #[serde(default)]
    pub interactions: InteractionConfig,
}

impl SimConfig {
    /// Parse a RON document, filling missing fields with defaults
    pub fn from_ron_str(text: &str) -> Result<Self, ron::error::SpannedError> {
        ron::from_str(text)
    }
}

/// Grid size and clock settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Grid width in cells
    pub width: u32,
    /// Grid height in cells
    pub height: u32,
    /// RNG seed; a random one is drawn when absent
    pub seed: Option<u64>,
    /// Fixed simulation rate in ticks per second
    pub tick_rate: f32,
    /// Cap on ticks run by one `World::update` call
    pub max_steps_per_update: u32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            width: 200,
            height: 150,
            seed: None,
            tick_rate: 60.0,
            max_steps_per_update: 2,
        }
    }
}

/// Continuous-physics track settings
///
/// Distances are in cells, times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticleConfig {
    /// Pool capacity, fixed for the lifetime of the world
    pub capacity: usize,
    /// Downward acceleration in cells/sec^2
    pub gravity: f32,
    /// Gases rise: gravity is negated and multiplied by this
    pub gas_gravity_scale: f32,
    /// Fraction of velocity lost per step, by phase
    pub powder_drag: f32,
    pub liquid_drag: f32,
    pub gas_drag: f32,
    /// Speed limit in cells/sec (keep `max_speed / tick_rate <= 1` to avoid tunnelling)
    pub max_speed: f32,
    /// Particles closer than this push each other apart
    pub particle_radius: f32,
    /// Neighbour query radius
    pub neighbor_radius: f32,
    /// Overlap repulsion stiffness
    pub repulsion: f32,
    /// Neighbour count above which liquids spread sideways
    pub pressure_threshold: usize,
    /// Sideways acceleration applied under pressure
    pub pressure_spread: f32,
    /// Random sideways jitter for liquids
    pub dispersion_jitter: f32,
    /// Extra friction multiplier for powders in contact
    pub powder_friction_scale: f32,
    /// Below this speed a particle counts as resting
    pub settle_speed: f32,
    /// Consecutive resting steps before a particle turns back into a cell
    pub settle_frames: u32,
    /// Spatial hash bucket size
    pub hash_cell_size: f32,
}

impl Default for ParticleConfig {
    fn default() -> Self {
        Self {
            capacity: 4096,
            gravity: 200.0,
            gas_gravity_scale: 0.3,
            powder_drag: 0.01,
            liquid_drag: 0.02,
            gas_drag: 0.08,
            max_speed: 60.0,
            particle_radius: 0.5,
            neighbor_radius: 1.5,
            repulsion: 30.0,
            pressure_threshold: 3,
            pressure_spread: 20.0,
            dispersion_jitter: 4.0,
            powder_friction_scale: 2.0,
            settle_speed: 1.0,
            settle_frames: 20,
            hash_cell_size: 4.0,
        }
    }
}

/// Probabilities of the generic interaction rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InteractionConfig {
    /// Ignition chance at zero resistance, scaled by `1 - ignition_resistance`
    pub ignition: f32,
    pub evaporation: f32,
    /// Chance the heat source is used up by an evaporation
    pub heat_source_consumption: f32,
    pub oxidation: f32,
    pub composite: f32,
    pub condensation: f32,
    pub freezing: f32,
    /// Radius of the fire burst left by an exploding combustible
    pub blast_radius: i32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            ignition: 0.15,
            evaporation: 0.10,
            heat_source_consumption: 0.5,
            oxidation: 0.05,
            composite: 0.30,
            condensation: 0.05,
            freezing: 0.02,
            blast_radius: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SimConfig::default();
        assert_eq!(config.world.width, 200);
        assert_eq!(config.world.seed, None);
        assert_eq!(config.interactions.ignition, 0.15);
        assert_eq!(config.particles.capacity, 4096);
    }

    #[test]
    fn test_partial_ron_keeps_defaults() {
        let config = SimConfig::from_ron_str(
            "(world: (width: 64, seed: Some(7)), interactions: (condensation: 0.5))",
        )
        .expect("valid RON");

        assert_eq!(config.world.width, 64);
        assert_eq!(config.world.height, 150);
        assert_eq!(config.world.seed, Some(7));
        assert_eq!(config.interactions.condensation, 0.5);
        assert_eq!(config.interactions.ignition, 0.15);
        assert_eq!(config.particles, ParticleConfig::default());
    }

    #[test]
    fn test_invalid_ron_is_error() {
        assert!(SimConfig::from_ron_str("(world: (width: \"wide\"))").is_err());
    }

    #[test]
    fn test_particle_defaults_do_not_tunnel() {
        let config = SimConfig::default();
        assert!(config.particles.max_speed / config.world.tick_rate <= 1.0);
    }
}
