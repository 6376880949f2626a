//! Built-in starting scenes for the headless runner
//!
//! Layouts are proportional to the world size so any configured grid works.

use grainfall_core::World;
use grainfall_core::simulation::MaterialId;
use rand::Rng;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    Sandpile,
    Reservoir,
    Bonfire,
    Volcano,
    Garden,
    Rain,
}

impl Scenario {
    pub const ALL: [Scenario; 6] = [
        Scenario::Sandpile,
        Scenario::Reservoir,
        Scenario::Bonfire,
        Scenario::Volcano,
        Scenario::Garden,
        Scenario::Rain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Scenario::Sandpile => "sandpile",
            Scenario::Reservoir => "reservoir",
            Scenario::Bonfire => "bonfire",
            Scenario::Volcano => "volcano",
            Scenario::Garden => "garden",
            Scenario::Rain => "rain",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Scenario::Sandpile => "A block of sand and scattered grains settling on a stone floor",
            Scenario::Reservoir => "A stone basin of water with oil floating on top and an ice floe",
            Scenario::Bonfire => "Wood and oil set alight, with a gunpowder stash nearby",
            Scenario::Volcano => "Lava poured onto a lake under an ice ceiling",
            Scenario::Garden => "Seeds on soil beside a fish pond, with birds and a builder",
            Scenario::Rain => "Water, sand and steam particles falling onto ledges",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Paint the scene into `world`
    pub fn setup<R: Rng>(self, world: &mut World, rng: &mut R) {
        let w = world.width();
        let h = world.height();
        log::info!("Setting up scenario '{}' in {}x{} world", self.name(), w, h);

        match self {
            Scenario::Sandpile => {
                floor(world, MaterialId::STONE);
                world.fill_rect(w / 2 - w / 8, 0, w / 4, h / 4, MaterialId::SAND);
                for _ in 0..w {
                    let x = rng.gen_range(0..w.max(1));
                    let y = rng.gen_range(0..(h / 3).max(1));
                    world.set(x, y, MaterialId::SAND);
                }
            }
            Scenario::Reservoir => {
                floor(world, MaterialId::STONE);
                let (left, right) = (w / 4, w * 3 / 4);
                world.fill_rect(left, h / 2, 2, h / 2, MaterialId::STONE);
                world.fill_rect(right, h / 2, 2, h / 2, MaterialId::STONE);
                world.fill_rect(left + 2, h / 2, right - left - 2, h / 4, MaterialId::WATER);
                let oil_depth = h / 10;
                world.fill_rect(left + 2, h / 2 - oil_depth, right - left - 2, oil_depth, MaterialId::OIL);
                world.fill_rect(w / 2 - 2, h / 2 - oil_depth - 3, 4, 2, MaterialId::ICE);
            }
            Scenario::Bonfire => {
                floor(world, MaterialId::STONE);
                let ground = h - 4;
                let (left, span) = (w / 3, w / 3);
                for i in 0..4 {
                    let y = ground - 2 - i * 2;
                    world.fill_rect(left + i * 2, y, span - i * 4, 2, MaterialId::WOOD);
                }
                world.fill_rect(left, ground - 12, span, 2, MaterialId::OIL);
                world.paint(w / 2, ground - 14, 1, MaterialId::FIRE);

                // Wooden fuse running to a gunpowder stash
                let stash = w - w / 6;
                world.fill_rect(left + span, ground - 1, stash - left - span, 1, MaterialId::WOOD);
                world.fill_rect(stash, ground - 3, 3, 3, MaterialId::GUNPOWDER);
                world.paint(w / 2, h / 4, 3, MaterialId::OXYGEN);
            }
            Scenario::Volcano => {
                floor(world, MaterialId::STONE);
                world.fill_rect(0, 0, w, 2, MaterialId::ICE);
                world.fill_rect(0, h * 3 / 4, w, h / 4 - 4, MaterialId::WATER);
                world.paint(w / 3, h / 4, (w / 10).max(2), MaterialId::LAVA);
                world.paint(w * 2 / 3, h / 3, (w / 14).max(1), MaterialId::ACID);
            }
            Scenario::Garden => {
                floor(world, MaterialId::STONE);
                let soil = h - 8;
                world.fill_rect(0, soil, w / 2, 4, MaterialId::DIRT);

                // Pond on the right half
                world.fill_rect(w / 2, soil - 4, 2, 8, MaterialId::STONE);
                world.fill_rect(w / 2 + 2, soil - 2, w / 2 - 2, 6, MaterialId::WATER);
                world.set(w * 3 / 4, soil, MaterialId::FISH);
                world.set(w * 3 / 4 + 3, soil + 2, MaterialId::FISH);

                for _ in 0..(w / 8).max(1) {
                    let x = rng.gen_range(0..(w / 2).max(1));
                    world.set(x, soil - 6, MaterialId::SEED);
                }
                for _ in 0..3 {
                    let x = rng.gen_range(0..w.max(1));
                    let y = rng.gen_range(0..(h / 4).max(1));
                    world.set(x, y, MaterialId::BIRD);
                }
                world.set(2, soil - 1, MaterialId::BUILDER);
            }
            Scenario::Rain => {
                floor(world, MaterialId::STONE);
                for i in 1..4 {
                    let (x, y) = (i * w / 4 - w / 10, (i + 1) * h / 5);
                    world.fill_rect(x, y, w / 5, 1, MaterialId::STONE);
                }
                let kinds = [
                    MaterialId::WATER,
                    MaterialId::WATER,
                    MaterialId::SAND,
                    MaterialId::STEAM,
                ];
                let count = (w * h / 8).max(1) as usize;
                for i in 0..count {
                    let x = rng.gen_range(0.5..(w as f32 - 0.5).max(1.0));
                    let y = rng.gen_range(0.5..(h as f32 / 4.0).max(1.0));
                    world.spawn_particle(x, y, kinds[i % kinds.len()]);
                }
            }
        }
    }
}

fn floor(world: &mut World, material: u16) {
    let (w, h) = (world.width(), world.height());
    world.fill_rect(0, h - 4, w, 4, material);
}
