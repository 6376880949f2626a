//! Generic pairwise interaction rules
//!
//! Rules match on capability tags rather than on specific materials. Each rule
//! is symmetric: it works out which operand plays which role, rolls its
//! probability, and describes the outcome as an [`Effect`]. Applying the effect
//! is left to the caller, so grid cells and particles share the same rules.

use crate::config::InteractionConfig;
use crate::simulation::{MaterialDef, MaterialId, MaterialTags, Phase};
use crate::world::WorldRng;

/// One side of a pairwise interaction
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operand {
    First,
    Second,
}

impl Operand {
    pub fn other(self) -> Self {
        match self {
            Operand::First => Operand::Second,
            Operand::Second => Operand::First,
        }
    }
}

/// Outcome of a successful rule
///
/// `None` leaves that operand untouched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Effect {
    pub first: Option<u16>,
    pub second: Option<u16>,
    /// Operand whose position becomes the centre of a fire burst
    pub blast: Option<Operand>,
}

impl Effect {
    /// Build an effect from role-relative results
    ///
    /// `role` says which operand played the rule's primary role (`primary`).
    fn by_role(role: Operand, primary: Option<u16>, partner: Option<u16>) -> Self {
        match role {
            Operand::First => Self {
                first: primary,
                second: partner,
                blast: None,
            },
            Operand::Second => Self {
                first: partner,
                second: primary,
                blast: None,
            },
        }
    }

    pub fn get(&self, operand: Operand) -> Option<u16> {
        match operand {
            Operand::First => self.first,
            Operand::Second => self.second,
        }
    }
}

/// A generic interaction rule
#[derive(Clone, Debug, PartialEq)]
pub enum InteractionRule {
    /// Combustible next to a heat source catches fire
    Ignition { chance: f32 },
    /// Evaporating material next to a heat source turns into its vapour
    Evaporation { chance: f32, consume_heat: f32 },
    /// Oxidizer next to a heat source feeds the fire
    Oxidation { chance: f32 },
    /// A liquid soaks into a powder, forming a new material
    Composite {
        liquid: u16,
        powder: u16,
        result: u16,
        consumes_liquid: bool,
        chance: f32,
    },
    /// Vapour touching a cool surface turns back into liquid
    Condensation { chance: f32 },
    /// Liquid touching a freezing material solidifies
    Freezing { chance: f32 },
}

/// Find the operand that satisfies `primary` while its partner satisfies `partner`
fn roles<'a>(
    a: &'a MaterialDef,
    b: &'a MaterialDef,
    primary: impl Fn(&MaterialDef) -> bool,
    partner: impl Fn(&MaterialDef) -> bool,
) -> Option<(Operand, &'a MaterialDef, &'a MaterialDef)> {
    if primary(a) && partner(b) {
        Some((Operand::First, a, b))
    } else if primary(b) && partner(a) {
        Some((Operand::Second, b, a))
    } else {
        None
    }
}

fn is_heat_source(m: &MaterialDef) -> bool {
    m.has(MaterialTags::HEAT_SOURCE)
}

impl InteractionRule {
    /// Check the predicate, roll the probability and describe the outcome
    pub fn resolve<R: WorldRng>(
        &self,
        a: &MaterialDef,
        b: &MaterialDef,
        rng: &mut R,
    ) -> Option<Effect> {
        match *self {
            InteractionRule::Ignition { chance } => {
                let (role, fuel, _) = roles(
                    a,
                    b,
                    |m| m.has(MaterialTags::COMBUSTIBLE),
                    is_heat_source,
                )?;
                if !rng.check_probability(chance * (1.0 - fuel.ignition_resistance)) {
                    return None;
                }
                let mut effect = Effect::by_role(
                    role,
                    Some(fuel.burns_into.unwrap_or(MaterialId::FIRE)),
                    None,
                );
                if fuel.has(MaterialTags::EXPLOSIVE) {
                    effect.blast = Some(role);
                }
                Some(effect)
            }
            InteractionRule::Evaporation {
                chance,
                consume_heat,
            } => {
                let (role, source, _) = roles(
                    a,
                    b,
                    |m| m.has(MaterialTags::EVAPORATES) && m.evaporates_into.is_some(),
                    is_heat_source,
                )?;
                if !rng.check_probability(chance) {
                    return None;
                }
                let heat = rng
                    .check_probability(consume_heat)
                    .then_some(MaterialId::EMPTY);
                Some(Effect::by_role(role, source.evaporates_into, heat))
            }
            InteractionRule::Oxidation { chance } => {
                let (role, _, _) =
                    roles(a, b, |m| m.has(MaterialTags::OXIDIZER), is_heat_source)?;
                if !rng.check_probability(chance) {
                    return None;
                }
                Some(Effect::by_role(role, Some(MaterialId::FIRE), None))
            }
            InteractionRule::Composite {
                liquid,
                powder,
                result,
                consumes_liquid,
                chance,
            } => {
                let (role, _, _) = roles(a, b, |m| m.id == powder, |m| m.id == liquid)?;
                if !rng.check_probability(chance) {
                    return None;
                }
                let liquid_after = consumes_liquid.then_some(MaterialId::EMPTY);
                Some(Effect::by_role(role, Some(result), liquid_after))
            }
            InteractionRule::Condensation { chance } => {
                let (role, vapour, _) = roles(
                    a,
                    b,
                    |m| m.has(MaterialTags::CONDENSES) && m.condenses_into.is_some(),
                    |m| m.has(MaterialTags::COOLANT),
                )?;
                if !rng.check_probability(chance) {
                    return None;
                }
                Some(Effect::by_role(role, vapour.condenses_into, None))
            }
            InteractionRule::Freezing { chance } => {
                let (role, liquid, _) = roles(
                    a,
                    b,
                    |m| m.phase == Phase::Liquid && m.freezes_into.is_some(),
                    |m| m.has(MaterialTags::FREEZING),
                )?;
                if !rng.check_probability(chance) {
                    return None;
                }
                Some(Effect::by_role(role, liquid.freezes_into, None))
            }
        }
    }
}

/// Ordered rule table; the first rule that fires wins
#[derive(Clone, Debug, Default)]
pub struct InteractionRules {
    rules: Vec<InteractionRule>,
    /// Radius of the fire burst around an exploding operand (0 = no burst)
    pub blast_radius: i32,
}

impl InteractionRules {
    /// Empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical rule set with probabilities from config
    pub fn standard(config: &InteractionConfig) -> Self {
        let mut rules = Self::new();
        rules.blast_radius = config.blast_radius;
        rules.push(InteractionRule::Ignition {
            chance: config.ignition,
        });
        rules.push(InteractionRule::Evaporation {
            chance: config.evaporation,
            consume_heat: config.heat_source_consumption,
        });
        rules.push(InteractionRule::Oxidation {
            chance: config.oxidation,
        });
        rules.push(InteractionRule::Composite {
            liquid: MaterialId::WATER,
            powder: MaterialId::SAND,
            result: MaterialId::WET_SAND,
            consumes_liquid: true,
            chance: config.composite,
        });
        rules.push(InteractionRule::Condensation {
            chance: config.condensation,
        });
        rules.push(InteractionRule::Freezing {
            chance: config.freezing,
        });
        rules
    }

    pub fn push(&mut self, rule: InteractionRule) {
        self.rules.push(rule);
    }

    pub fn iter(&self) -> impl Iterator<Item = &InteractionRule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run the table in order and return the first effect
    pub fn resolve<R: WorldRng>(
        &self,
        a: &MaterialDef,
        b: &MaterialDef,
        rng: &mut R,
    ) -> Option<Effect> {
        self.rules.iter().find_map(|rule| rule.resolve(a, b, rng))
    }
}
