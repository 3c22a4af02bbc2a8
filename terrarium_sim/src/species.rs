// Species data: data-driven per-kind configuration.
//
// Every difference between kinds (stones, trees, lilies, rats, tigers) is
// expressed as data in `SpeciesData`, keyed by `Kind` in the game config.
// The lifecycle code runs one generic algorithm over a single `Entity` type
// and reads everything kind-specific from this table: decay time, size,
// terrain criteria, byproducts, and either plant or animal parameters.
//
// Prey and predator relations are plain `Kind` lists, so "is this entity
// my prey" is set membership on the kind-id.
//
// `default_species_table()` builds the standard roster. Its numbers follow
// the original game's balance; kinds it left implicit (intermediate pine and
// coconut stages, lilies) interpolate between their neighbors.
//
// See also: `config.rs` where the species table lives, `lifecycle.rs` for
// the generic update code that consumes it, `types.rs` for `Kind`.

use crate::types::{Kind, PositionCriteria, ZLayer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-kind constants shared by every entity of that kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesData {
    /// Initial size (diameter, in tiles). Animals start at `size_at_birth`.
    pub size: f64,
    /// Starting integrity. The entity decays once it reaches zero.
    pub integrity: f64,
    /// Lifespan in simulated seconds. Negative means immortal.
    pub decay_time: f64,
    pub position_criteria: PositionCriteria,
    pub z_layer: ZLayer,
    /// Non-colliding kinds (ground cover) never block placement or movement.
    pub collides: bool,
    /// When this kind replaces another (decay byproduct or next growth
    /// stage), copy the predecessor's size instead of `size`.
    pub keep_previous_size: bool,
    /// When this kind replaces another, inherit its sprite variant.
    pub keep_previous_sprite: bool,
    /// Entities spawned around the footprint when this kind decays.
    pub decay_products: Vec<Kind>,
    pub behavior: Behavior,
}

/// Category-specific parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Behavior {
    /// No behavior beyond decay.
    Mineral,
    Plant(PlantData),
    Animal(AnimalData),
}

/// Growth-stage and spore parameters for plants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlantData {
    /// Kind that replaces this one when its time is up. `None` means the
    /// plant decays at the end of its life.
    pub next_stage: Option<Kind>,
    /// Minimum tile saturation required to move to the next stage.
    pub min_saturation: f64,
    /// Minimum tile temperature required to move to the next stage.
    pub min_temperature: Option<i32>,
    /// Kind of spore dropped nearby every `spore_interval` seconds.
    pub spore: Option<Kind>,
    /// Seconds between spore attempts. Zero disables reproduction.
    pub spore_interval: f64,
}

/// Metabolism, growth, reproduction and foraging parameters for animals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimalData {
    pub size_at_birth: f64,
    pub max_size: f64,
    /// Multiplicative growth per successful growth step.
    pub growth_rate: f64,
    pub min_food_for_growth: f64,
    pub min_size_for_reproduction: f64,
    pub min_food_for_reproduction: f64,
    /// Seconds between reproduction attempts. Zero disables reproduction.
    pub reproduction_interval: f64,
    pub max_food: f64,
    /// Food drained per unit of size per simulated second.
    pub metabolic_rate: f64,
    pub speed: f64,
    pub view_radius: f64,
    /// Integrity removed from prey (and food gained) per bite.
    pub eating_rate: f64,
    pub prey: Vec<Kind>,
    pub predators: Vec<Kind>,
}

impl SpeciesData {
    pub fn plant(&self) -> Option<&PlantData> {
        match &self.behavior {
            Behavior::Plant(p) => Some(p),
            _ => None,
        }
    }

    pub fn animal(&self) -> Option<&AnimalData> {
        match &self.behavior {
            Behavior::Animal(a) => Some(a),
            _ => None,
        }
    }

    pub fn is_animal(&self) -> bool {
        matches!(self.behavior, Behavior::Animal(_))
    }

    /// Size a freshly constructed entity of this kind starts with.
    pub fn initial_size(&self) -> f64 {
        match &self.behavior {
            Behavior::Animal(a) => a.size_at_birth,
            _ => self.size,
        }
    }

    pub fn is_immortal(&self) -> bool {
        self.decay_time < 0.0
    }
}

// ---------------------------------------------------------------------------
// Default roster
// ---------------------------------------------------------------------------

fn mineral(size: f64, integrity: f64) -> SpeciesData {
    SpeciesData {
        size,
        integrity,
        decay_time: -1.0,
        position_criteria: PositionCriteria::Ground,
        z_layer: ZLayer::OnFloor,
        collides: true,
        keep_previous_size: false,
        keep_previous_sprite: false,
        decay_products: Vec::new(),
        behavior: Behavior::Mineral,
    }
}

fn tree(
    decay_time: f64,
    size: f64,
    integrity: f64,
    criteria: PositionCriteria,
    plant: PlantData,
    decay_products: Vec<Kind>,
) -> SpeciesData {
    SpeciesData {
        size,
        integrity,
        decay_time,
        position_criteria: criteria,
        z_layer: ZLayer::OnFloor,
        collides: true,
        keep_previous_size: false,
        keep_previous_sprite: false,
        decay_products,
        behavior: Behavior::Plant(plant),
    }
}

fn stage(next: Option<Kind>, min_saturation: f64, min_temperature: Option<i32>) -> PlantData {
    PlantData {
        next_stage: next,
        min_saturation,
        min_temperature,
        spore: None,
        spore_interval: 0.0,
    }
}

fn seeding(spore: Kind, interval: f64) -> PlantData {
    PlantData {
        next_stage: None,
        min_saturation: 0.0,
        min_temperature: None,
        spore: Some(spore),
        spore_interval: interval,
    }
}

fn animal(decay_time: f64, integrity: f64, data: AnimalData) -> SpeciesData {
    SpeciesData {
        size: data.size_at_birth,
        integrity,
        decay_time,
        position_criteria: PositionCriteria::Ground,
        z_layer: ZLayer::OnFloor,
        collides: true,
        keep_previous_size: false,
        keep_previous_sprite: false,
        decay_products: vec![Kind::Corpse],
        behavior: Behavior::Animal(data),
    }
}

/// The standard roster of every `Kind`.
pub fn default_species_table() -> BTreeMap<Kind, SpeciesData> {
    use Kind::*;
    use PositionCriteria::{Anywhere, Ground, Water};

    let trunk = vec![Trunk];
    let all_trees = vec![
        SmallFruitTree,
        MediumFruitTree,
        LargeFruitTree,
        SmallPineTree,
        MediumPineTree,
        LargePineTree,
        SmallCocoTree,
        MediumCocoTree,
        LargeCocoTree,
        Trunk,
    ];
    let seedlings = vec![
        SeedFruitTree,
        SmallFruitTree,
        SeedPineTree,
        SmallPineTree,
        SeedCocoTree,
        SmallCocoTree,
    ];

    let mut table = BTreeMap::new();

    table.insert(LargeStone, mineral(3.0, 20.0));
    table.insert(MediumStone, mineral(2.0, 10.0));
    table.insert(SmallStone, mineral(1.0, 5.0));

    table.insert(
        SeedFruitTree,
        tree(30.0, 0.5, 1.0, Ground, stage(Some(SmallFruitTree), 0.000_031_25, None), vec![]),
    );
    table.insert(
        SmallFruitTree,
        tree(50.0, 1.0, 3.0, Ground, stage(Some(MediumFruitTree), 0.000_062_5, Some(4)), trunk.clone()),
    );
    table.insert(
        MediumFruitTree,
        tree(200.0, 2.0, 6.0, Ground, stage(Some(LargeFruitTree), 0.032, Some(4)), trunk.clone()),
    );
    table.insert(
        LargeFruitTree,
        tree(1000.0, 3.0, 10.0, Ground, seeding(SeedFruitTree, 10.0), trunk.clone()),
    );

    table.insert(
        SeedPineTree,
        tree(30.0, 0.5, 1.0, Ground, stage(Some(SmallPineTree), 0.000_031_25, None), vec![]),
    );
    table.insert(
        SmallPineTree,
        tree(50.0, 1.0, 4.0, Ground, stage(Some(MediumPineTree), 0.000_062_5, Some(-6)), trunk.clone()),
    );
    table.insert(
        MediumPineTree,
        tree(200.0, 2.0, 8.0, Ground, stage(Some(LargePineTree), 0.032, Some(-6)), trunk.clone()),
    );
    table.insert(
        LargePineTree,
        tree(1000.0, 3.0, 15.0, Ground, seeding(SeedPineTree, 10.0), trunk.clone()),
    );

    table.insert(
        SeedCocoTree,
        tree(30.0, 0.5, 1.0, Ground, stage(Some(SmallCocoTree), 0.000_062_5, Some(14)), vec![]),
    );
    table.insert(
        SmallCocoTree,
        tree(50.0, 1.0, 4.0, Ground, stage(Some(MediumCocoTree), 0.000_062_5, Some(14)), trunk.clone()),
    );
    table.insert(
        MediumCocoTree,
        tree(170.0, 2.0, 7.0, Ground, stage(Some(LargeCocoTree), 0.032, Some(14)), trunk.clone()),
    );
    table.insert(
        LargeCocoTree,
        tree(1000.0, 3.0, 10.0, Ground, seeding(SeedCocoTree, 12.0), trunk),
    );

    table.insert(
        SeedLily,
        tree(20.0, 0.5, 1.0, Water, stage(Some(Lily), 0.5, Some(0)), vec![]),
    );
    table.insert(Lily, tree(120.0, 1.0, 2.0, Water, seeding(SeedLily, 15.0), vec![]));

    let mut trunk_data = tree(30.0, 3.0, 10.0, Ground, stage(None, 0.0, None), vec![Soil]);
    trunk_data.keep_previous_size = true;
    trunk_data.keep_previous_sprite = true;
    table.insert(Trunk, trunk_data);

    let mut corpse = mineral(2.0, 2.0);
    corpse.decay_time = 30.0;
    corpse.position_criteria = Anywhere;
    corpse.keep_previous_size = true;
    table.insert(Corpse, corpse);

    let mut soil = mineral(4.0, 1.0);
    soil.decay_time = 1000.0;
    soil.position_criteria = Anywhere;
    soil.z_layer = ZLayer::Floor;
    soil.collides = false;
    table.insert(Soil, soil);

    table.insert(
        Beaver,
        animal(
            600.0,
            5.0,
            AnimalData {
                size_at_birth: 0.5,
                max_size: 2.5,
                growth_rate: 1.01,
                min_food_for_growth: 0.5,
                min_size_for_reproduction: 2.1,
                min_food_for_reproduction: 1.0,
                reproduction_interval: 12.0,
                max_food: 12.0,
                metabolic_rate: 0.002,
                speed: 0.3,
                view_radius: 6.0,
                eating_rate: 0.6,
                prey: all_trees,
                predators: vec![Tiger],
            },
        ),
    );
    table.insert(
        Rat,
        animal(
            1200.0,
            3.0,
            AnimalData {
                size_at_birth: 0.5,
                max_size: 2.0,
                growth_rate: 1.01,
                min_food_for_growth: 1.0,
                min_size_for_reproduction: 1.3,
                min_food_for_reproduction: 1.0,
                reproduction_interval: 3.0,
                max_food: 30.0,
                metabolic_rate: 0.002,
                speed: 0.2,
                view_radius: 20.0,
                eating_rate: 1.3,
                prey: seedlings.clone(),
                predators: vec![Tiger],
            },
        ),
    );
    table.insert(
        SmallCritter,
        animal(
            200.0,
            3.0,
            AnimalData {
                size_at_birth: 0.5,
                max_size: 1.5,
                growth_rate: 1.01,
                min_food_for_growth: 0.5,
                min_size_for_reproduction: 1.3,
                min_food_for_reproduction: 1.0,
                reproduction_interval: 7.0,
                max_food: 3.0,
                metabolic_rate: 0.002,
                speed: 0.2,
                view_radius: 5.0,
                eating_rate: 0.2,
                prey: seedlings,
                predators: vec![Tiger, Rat],
            },
        ),
    );
    table.insert(
        Tiger,
        animal(
            1200.0,
            10.0,
            AnimalData {
                size_at_birth: 0.5,
                max_size: 2.0,
                growth_rate: 1.01,
                min_food_for_growth: 1.0,
                min_size_for_reproduction: 2.1,
                min_food_for_reproduction: 1.0,
                reproduction_interval: 3.0,
                max_food: 120.0,
                metabolic_rate: 0.002,
                speed: 0.3,
                view_radius: 20.0,
                eating_rate: 2.4,
                prey: vec![Beaver, Rat, SmallCritter, Corpse],
                predators: Vec::new(),
            },
        ),
    );

    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_covers_every_kind() {
        let table = default_species_table();
        for kind in Kind::ALL {
            assert!(table.contains_key(&kind), "missing species data for {kind}");
        }
    }

    #[test]
    fn next_stages_are_plants() {
        let table = default_species_table();
        for (kind, data) in &table {
            if let Some(next) = data.plant().and_then(|p| p.next_stage) {
                assert!(
                    table[&next].plant().is_some(),
                    "{kind} grows into {next}, which is not a plant"
                );
            }
        }
    }

    #[test]
    fn animals_start_at_birth_size() {
        let table = default_species_table();
        let rat = &table[&Kind::Rat];
        assert!(rat.is_animal());
        assert_eq!(rat.initial_size(), 0.5);
        assert_eq!(table[&Kind::LargeStone].initial_size(), 3.0);
    }

    #[test]
    fn stones_are_immortal_and_soil_does_not_collide() {
        let table = default_species_table();
        assert!(table[&Kind::SmallStone].is_immortal());
        assert!(!table[&Kind::Soil].collides);
        assert!(!table[&Kind::Trunk].is_immortal());
    }
}
