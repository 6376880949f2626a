//! Material definitions and registry

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Built-in material IDs
pub struct MaterialId;

impl MaterialId {
    /// Vacuum. Always registered, never removable.
    pub const EMPTY: u16 = 0;

    // Inert terrain
    pub const STONE: u16 = 1;
    pub const SAND: u16 = 2;
    pub const WATER: u16 = 3;
    pub const WOOD: u16 = 4;

    // Combustion products
    pub const FIRE: u16 = 5;
    pub const SMOKE: u16 = 6;
    pub const STEAM: u16 = 7;

    // Fluids and phase-change materials
    pub const OIL: u16 = 8;
    pub const ICE: u16 = 9;
    pub const WET_SAND: u16 = 10;
    pub const LAVA: u16 = 11;
    pub const ACID: u16 = 12;
    pub const GUNPOWDER: u16 = 13;

    // Living things
    pub const PLANT: u16 = 14;
    pub const SEED: u16 = 15;
    pub const DIRT: u16 = 16;
    pub const BIRD: u16 = 17;
    pub const FISH: u16 = 18;
    pub const BUILDER: u16 = 19;
    pub const BRICK: u16 = 20;
    pub const OXYGEN: u16 = 21;
}

/// How a material behaves physically
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Doesn't fall on its own (stone, wood, brick)
    Solid,
    /// Falls, piles up (sand, gunpowder)
    Powder,
    /// Flows, seeks level (water, oil, lava)
    Liquid,
    /// Rises, disperses (steam, smoke)
    Gas,
}

bitflags! {
    /// Capability tags used by the generic interaction rules
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct MaterialTags: u16 {
        const COMBUSTIBLE = 1 << 0;
        const HEAT_SOURCE = 1 << 1;
        const ORGANIC = 1 << 2;
        const CONDUCTIVE = 1 << 3;
        const EXPLOSIVE = 1 << 4;
        const EVAPORATES = 1 << 5;
        const OXIDIZER = 1 << 6;
        /// Gas that turns back into a liquid on a cool surface
        const CONDENSES = 1 << 7;
        /// Cool surface for condensation
        const COOLANT = 1 << 8;
        /// Freezes neighbouring liquids that have a frozen form
        const FREEZING = 1 << 9;
        const CORROSIVE = 1 << 10;
    }
}

/// Per-material update logic, dispatched by `match` in the cellular automaton
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Behavior {
    /// Never moves on its own
    Static,
    /// Falls, slides diagonally, piles up
    Powder,
    /// Falls, spreads sideways
    Liquid,
    /// Rises, spreads sideways
    Gas,
    /// Flickers upward and burns out
    Fire,
    /// Grows while it has moisture
    Plant,
    /// Falls like powder, germinates on soil
    Seed,
    /// Flies, seeks food, perches, reproduces
    Bird,
    /// Swims in water, suffocates on land
    Fish,
    /// Walks along the ground laying bricks
    Builder,
}

/// Material-specific pairwise logic checked before the generic rule table
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomInteraction {
    #[default]
    None,
    /// Dissolves non-corrosive neighbours
    Corrode,
    /// Solidifies when touching an evaporating liquid, boiling the liquid
    Quench,
    /// Drinks neighbouring water to gain moisture
    Absorb,
    /// Eats neighbouring organic solids
    Graze,
}

/// Definition of a material's properties
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaterialDef {
    pub id: u16,
    pub name: String,
    pub phase: Phase,

    /// Base color (RGBA)
    pub color: [u8; 4],

    /// Ordering scalar for displacement: denser materials sink through lighter ones
    pub density: f32,
    /// Whether denser materials may displace this one
    pub movable: bool,
    /// Frames until the cell turns empty (-1 = infinite)
    pub lifetime: i32,
    /// Resistance to catching fire (0.0 = ignites readily, 1.0 = never)
    pub ignition_resistance: f32,

    // State transitions
    /// What this becomes when ignited (defaults to fire)
    pub burns_into: Option<u16>,
    /// What this becomes next to a heat source
    pub evaporates_into: Option<u16>,
    /// What this becomes on a cool surface
    pub condenses_into: Option<u16>,
    /// What this becomes next to a freezing material
    pub freezes_into: Option<u16>,

    pub tags: MaterialTags,
    pub behavior: Behavior,
    pub custom: CustomInteraction,

    /// Cells a liquid may travel sideways in one update
    pub dispersion: u8,

    // Continuous-physics properties
    /// Velocity damping while in contact (particles)
    pub friction: f32,
    /// Bounce factor on collision (particles)
    pub restitution: f32,
}

impl Default for MaterialDef {
    fn default() -> Self {
        Self {
            id: 0,
            name: "unknown".to_string(),
            phase: Phase::Solid,
            color: [255, 0, 255, 255], // Magenta for missing materials
            density: 1.0,
            movable: false,
            lifetime: -1,
            ignition_resistance: 1.0,
            burns_into: None,
            evaporates_into: None,
            condenses_into: None,
            freezes_into: None,
            tags: MaterialTags::empty(),
            behavior: Behavior::Static,
            custom: CustomInteraction::None,
            dispersion: 0,
            friction: 0.5,
            restitution: 0.2,
        }
    }
}

impl MaterialDef {
    pub fn is_empty(&self) -> bool {
        self.id == MaterialId::EMPTY
    }

    pub fn has(&self, tags: MaterialTags) -> bool {
        self.tags.contains(tags)
    }
}

/// Registry of all materials
///
/// Built once at startup and shared read-only afterwards.
pub struct Materials {
    materials: Vec<Option<MaterialDef>>,
    by_name: HashMap<String, u16>,
}

impl Materials {
    /// Registry with the built-in catalog
    pub fn new() -> Self {
        let mut materials = Self::bare();
        materials.register_defaults();
        materials
    }

    /// Registry containing only the empty material
    pub fn bare() -> Self {
        let mut materials = Self {
            materials: Vec::new(),
            by_name: HashMap::new(),
        };
        materials.register(MaterialDef {
            id: MaterialId::EMPTY,
            name: "empty".to_string(),
            phase: Phase::Gas,
            color: [0, 0, 0, 0], // Transparent
            density: 0.0,
            movable: true,
            ignition_resistance: 1.0,
            ..Default::default()
        });
        materials
    }

    fn register_defaults(&mut self) {
        self.register(MaterialDef {
            id: MaterialId::STONE,
            name: "stone".to_string(),
            phase: Phase::Solid,
            color: [128, 128, 128, 255],
            density: 2.5,
            tags: MaterialTags::COOLANT,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::SAND,
            name: "sand".to_string(),
            phase: Phase::Powder,
            color: [194, 178, 128, 255],
            density: 1.5,
            movable: true,
            behavior: Behavior::Powder,
            friction: 0.6,
            restitution: 0.1,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::WATER,
            name: "water".to_string(),
            phase: Phase::Liquid,
            color: [64, 164, 223, 200],
            density: 1.0,
            movable: true,
            evaporates_into: Some(MaterialId::STEAM),
            freezes_into: Some(MaterialId::ICE),
            tags: MaterialTags::EVAPORATES | MaterialTags::CONDUCTIVE,
            behavior: Behavior::Liquid,
            dispersion: 4,
            friction: 0.05,
            restitution: 0.05,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::WOOD,
            name: "wood".to_string(),
            phase: Phase::Solid,
            color: [139, 90, 43, 255],
            density: 0.7,
            ignition_resistance: 0.4,
            burns_into: Some(MaterialId::FIRE),
            tags: MaterialTags::COMBUSTIBLE | MaterialTags::ORGANIC,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::FIRE,
            name: "fire".to_string(),
            phase: Phase::Gas,
            color: [255, 100, 0, 255],
            density: 0.01,
            movable: true,
            lifetime: 40,
            tags: MaterialTags::HEAT_SOURCE,
            behavior: Behavior::Fire,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::SMOKE,
            name: "smoke".to_string(),
            phase: Phase::Gas,
            color: [60, 60, 60, 150],
            density: 0.05,
            movable: true,
            lifetime: 90,
            behavior: Behavior::Gas,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::STEAM,
            name: "steam".to_string(),
            phase: Phase::Gas,
            color: [200, 200, 200, 100],
            density: 0.04,
            movable: true,
            lifetime: 240,
            condenses_into: Some(MaterialId::WATER),
            tags: MaterialTags::CONDENSES,
            behavior: Behavior::Gas,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::OIL,
            name: "oil".to_string(),
            phase: Phase::Liquid,
            color: [50, 40, 30, 255],
            density: 0.8, // Floats on water
            movable: true,
            ignition_resistance: 0.1,
            tags: MaterialTags::COMBUSTIBLE,
            behavior: Behavior::Liquid,
            dispersion: 3,
            friction: 0.1,
            restitution: 0.05,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::ICE,
            name: "ice".to_string(),
            phase: Phase::Solid,
            color: [200, 230, 255, 200],
            density: 0.9,
            evaporates_into: Some(MaterialId::WATER), // Melts
            tags: MaterialTags::EVAPORATES | MaterialTags::COOLANT | MaterialTags::FREEZING,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::WET_SAND,
            name: "wet_sand".to_string(),
            phase: Phase::Powder,
            color: [150, 130, 90, 255],
            density: 1.9,
            movable: true,
            evaporates_into: Some(MaterialId::SAND), // Dries out
            tags: MaterialTags::EVAPORATES,
            behavior: Behavior::Powder,
            friction: 0.8,
            restitution: 0.05,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::LAVA,
            name: "lava".to_string(),
            phase: Phase::Liquid,
            color: [255, 80, 0, 255],
            density: 3.0,
            movable: true,
            tags: MaterialTags::HEAT_SOURCE,
            behavior: Behavior::Liquid,
            custom: CustomInteraction::Quench,
            dispersion: 1, // Very viscous
            friction: 0.4,
            restitution: 0.0,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::ACID,
            name: "acid".to_string(),
            phase: Phase::Liquid,
            color: [0, 255, 0, 200],
            density: 1.1,
            movable: true,
            tags: MaterialTags::CORROSIVE,
            behavior: Behavior::Liquid,
            custom: CustomInteraction::Corrode,
            dispersion: 3,
            friction: 0.05,
            restitution: 0.05,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::GUNPOWDER,
            name: "gunpowder".to_string(),
            phase: Phase::Powder,
            color: [64, 64, 64, 255],
            density: 1.7,
            movable: true,
            ignition_resistance: 0.0,
            tags: MaterialTags::COMBUSTIBLE | MaterialTags::EXPLOSIVE,
            behavior: Behavior::Powder,
            friction: 0.5,
            restitution: 0.1,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::PLANT,
            name: "plant".to_string(),
            phase: Phase::Solid,
            color: [34, 139, 34, 255],
            density: 0.4,
            ignition_resistance: 0.2,
            tags: MaterialTags::COMBUSTIBLE | MaterialTags::ORGANIC,
            behavior: Behavior::Plant,
            custom: CustomInteraction::Absorb,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::SEED,
            name: "seed".to_string(),
            phase: Phase::Powder,
            color: [160, 120, 60, 255],
            density: 0.8,
            movable: true,
            ignition_resistance: 0.3,
            tags: MaterialTags::COMBUSTIBLE | MaterialTags::ORGANIC,
            behavior: Behavior::Seed,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::DIRT,
            name: "dirt".to_string(),
            phase: Phase::Powder,
            color: [101, 67, 33, 255],
            density: 1.4,
            movable: true,
            behavior: Behavior::Powder,
            friction: 0.7,
            restitution: 0.05,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::BIRD,
            name: "bird".to_string(),
            phase: Phase::Solid,
            color: [230, 230, 60, 255],
            density: 0.5,
            ignition_resistance: 0.5,
            tags: MaterialTags::ORGANIC | MaterialTags::COMBUSTIBLE,
            behavior: Behavior::Bird,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::FISH,
            name: "fish".to_string(),
            phase: Phase::Solid,
            color: [255, 140, 40, 255],
            density: 1.05,
            movable: true,
            tags: MaterialTags::ORGANIC,
            behavior: Behavior::Fish,
            custom: CustomInteraction::Graze,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::BUILDER,
            name: "builder".to_string(),
            phase: Phase::Solid,
            color: [90, 60, 200, 255],
            density: 1.2,
            ignition_resistance: 0.6,
            tags: MaterialTags::ORGANIC | MaterialTags::COMBUSTIBLE,
            behavior: Behavior::Builder,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::BRICK,
            name: "brick".to_string(),
            phase: Phase::Solid,
            color: [170, 74, 68, 255],
            density: 2.2,
            tags: MaterialTags::COOLANT,
            ..Default::default()
        });

        self.register(MaterialDef {
            id: MaterialId::OXYGEN,
            name: "oxygen".to_string(),
            phase: Phase::Gas,
            color: [180, 220, 255, 40],
            density: 0.02,
            movable: true,
            tags: MaterialTags::OXIDIZER,
            behavior: Behavior::Gas,
            ..Default::default()
        });
    }

    /// Register a material. Only meant to be called while building the registry.
    pub fn register(&mut self, material: MaterialDef) {
        let id = material.id as usize;

        // Ensure vec is large enough
        if self.materials.len() <= id {
            self.materials.resize(id + 1, None);
        }

        if let Some(previous) = self.materials[id].take() {
            log::warn!(
                "Material id {} re-registered: '{}' replaces '{}'",
                id,
                material.name,
                previous.name
            );
            if self.by_name.get(&previous.name) == Some(&material.id) {
                self.by_name.remove(&previous.name);
            }
        }

        if let Some(other) = self.by_name.insert(material.name.clone(), material.id) {
            if other != material.id {
                log::warn!(
                    "Material name '{}' moved from id {} to id {}",
                    material.name,
                    other,
                    material.id
                );
            }
        }
        self.materials[id] = Some(material);
    }

    /// Get material definition by ID (`None` for unknown ids)
    pub fn get(&self, id: u16) -> Option<&MaterialDef> {
        self.materials.get(id as usize).and_then(Option::as_ref)
    }

    /// Get material definition by name (`None` for unknown names)
    pub fn by_name(&self, name: &str) -> Option<&MaterialDef> {
        self.by_name.get(name).and_then(|&id| self.get(id))
    }

    pub fn id_of(&self, name: &str) -> Option<u16> {
        self.by_name.get(name).copied()
    }

    /// The empty material, always present
    pub fn empty(&self) -> &MaterialDef {
        self.materials[MaterialId::EMPTY as usize]
            .as_ref()
            .unwrap_or_else(|| unreachable!("empty material is registered on construction"))
    }

    pub fn contains(&self, id: u16) -> bool {
        self.get(id).is_some()
    }

    /// Get color for a material (magenta for unknown ids)
    pub fn get_color(&self, id: u16) -> [u8; 4] {
        self.get(id)
            .map(|m| m.color)
            .unwrap_or(MaterialDef::default().color)
    }

    /// Number of registered materials, including empty
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = &MaterialDef> {
        self.materials.iter().filter_map(Option::as_ref)
    }
}

impl Default for Materials {
    fn default() -> Self {
        Self::new()
    }
}
