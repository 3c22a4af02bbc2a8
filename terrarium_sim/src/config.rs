// Data-driven game configuration.
//
// All tunable simulation parameters live in `GameConfig`, parsed from JSON
// at startup and never re-read while the simulation runs. The sim has no
// magic numbers of its own: world size, terrain ranges, time scale, retry
// budgets, the species table and the regulator list all come from here.
//
// Terrain parameters are grouped into `PlanetConfig`. Per-kind parameters
// live in `SpeciesData` entries keyed by `Kind` in the `species` map (see
// `species.rs`). Population floors are `RegulatorConfig` entries, evaluated
// in list order every tick.
//
// Every field has a default, so a partial JSON document such as
// `{"planet": {"width": 64, "height": 64}}` is a valid config.
//
// `validate()` catches contradictory configurations (a next stage that is
// not a plant, a regulator for a kind with no species data, a zero-sized
// world). Such configs are programming errors; `SimState::with_config`
// debug-asserts validity, and the headless runner refuses to start.
//
// See also: `sim.rs` which owns the `GameConfig` as part of `SimState`,
// `species.rs` for `SpeciesData`, `terrain.rs` for the consumer of
// `PlanetConfig`, `regulator.rs` for the consumer of `RegulatorConfig`.

use crate::species::{SpeciesData, default_species_table};
use crate::types::Kind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a configuration cannot be used.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    /// The JSON did not match the config schema.
    #[error("malformed config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    /// Planet dimensions or ranges are unusable.
    #[error("invalid planet configuration: {0}")]
    InvalidPlanet(&'static str),

    /// Simulation-wide scalar out of range.
    #[error("invalid simulation parameter: {0}")]
    InvalidParameter(&'static str),

    /// A kind is referenced but has no entry in the species table.
    #[error("no species data for {0}")]
    MissingSpecies(Kind),

    /// A kind is used in a role its behavior does not support.
    #[error("{kind} is used as {expected} but its species data says otherwise")]
    WrongBehavior { kind: Kind, expected: &'static str },

    /// A chance or fraction lies outside [0, 1].
    #[error("{name} must be within [0, 1], got {value}")]
    OutOfUnitRange { name: &'static str, value: f64 },

    /// A regulator entry is unusable.
    #[error("invalid regulator for {kind}: {reason}")]
    InvalidRegulator { kind: Kind, reason: &'static str },
}

// ---------------------------------------------------------------------------
// Planet parameters
// ---------------------------------------------------------------------------

/// Terrain generation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanetConfig {
    /// World width in tiles. The world wraps horizontally.
    pub width: u32,
    /// World height in tiles. The world wraps vertically.
    pub height: u32,
    pub min_temperature: i32,
    pub max_temperature: i32,
    pub min_altitude: i32,
    pub max_altitude: i32,
    /// Fraction of the altitude range that lies under water. Fixes
    /// `water_threshold_altitude`.
    pub water_percentage: f64,
    /// Rounds of altitude softening. Saturation gets eight times as many.
    pub softness_pass_count: u32,
    /// Rivers carved, regardless of world size.
    pub river_count: u32,
    /// Steps in each river's random walk for a 512×512 world; scaled by
    /// area for other sizes.
    pub river_length: u32,
    /// Saturation seeded on dry tiles before averaging.
    pub dry_saturation_seed: f64,
}

impl Default for PlanetConfig {
    fn default() -> Self {
        Self {
            width: 512,
            height: 512,
            min_temperature: -10,
            max_temperature: 50,
            min_altitude: -70,
            max_altitude: 70,
            water_percentage: 0.3,
            softness_pass_count: 5,
            river_count: 20,
            river_length: 10_000,
            dry_saturation_seed: 0.001,
        }
    }
}

impl PlanetConfig {
    /// `round((max − min) × water_percentage) + min`.
    pub fn water_threshold_altitude(&self) -> i32 {
        let span = (self.max_altitude - self.min_altitude) as f64;
        (span * self.water_percentage).round_ties_even() as i32 + self.min_altitude
    }
}

// ---------------------------------------------------------------------------
// Regulators and bucket sampling
// ---------------------------------------------------------------------------

/// One density floor.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegulatorConfig {
    /// Kind spawned when the pooled count is below the floor.
    pub kind: Kind,
    /// Other kinds counted together with `kind` (later growth stages).
    #[serde(default)]
    pub pooled_with: Vec<Kind>,
    /// Floor as a fraction of world area (tiles).
    pub min_fraction: f64,
    /// Seconds between checks, before the speed multiplier.
    pub interval: f64,
}

impl RegulatorConfig {
    pub fn new(kind: Kind, min_fraction: f64) -> Self {
        Self {
            kind,
            pooled_with: Vec::new(),
            min_fraction,
            interval: 1.0,
        }
    }

    pub fn pooled(mut self, others: &[Kind]) -> Self {
        self.pooled_with = others.to_vec();
        self
    }
}

/// The standard regulator list, in evaluation order.
pub fn default_regulators() -> Vec<RegulatorConfig> {
    use Kind::*;
    vec![
        RegulatorConfig::new(LargeStone, 0.0005),
        RegulatorConfig::new(MediumStone, 0.001),
        RegulatorConfig::new(SmallStone, 0.002),
        RegulatorConfig::new(SeedFruitTree, 0.001).pooled(&[
            SmallFruitTree,
            MediumFruitTree,
            LargeFruitTree,
        ]),
        RegulatorConfig::new(SeedPineTree, 0.0005).pooled(&[
            SmallPineTree,
            MediumPineTree,
            LargePineTree,
        ]),
        RegulatorConfig::new(SeedCocoTree, 0.0005).pooled(&[
            SmallCocoTree,
            MediumCocoTree,
            LargeCocoTree,
        ]),
        RegulatorConfig::new(SeedLily, 0.0005).pooled(&[Lily]),
        RegulatorConfig::new(Rat, 0.0001),
        RegulatorConfig::new(Beaver, 0.0001),
        RegulatorConfig::new(Tiger, 0.0001),
    ]
}

/// How the per-tick static update picks buckets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BucketSampling {
    /// Independent uniform picks. No revisit guarantee.
    Uniform,
    /// Shuffled sweep: every bucket once per cycle of
    /// `ceil(bucket_count / buckets_per_tick)` ticks.
    Shuffled,
}

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// All tunable simulation parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub planet: PlanetConfig,

    /// Edge length of a spatial hash bucket, in tiles.
    pub bucket_size: f64,

    /// Attempts before a placement search gives up.
    pub max_placement_attempts: u32,

    /// Global time scale applied to ages, intervals and movement.
    pub speed_multiplier: f64,

    /// Simulated seconds per tick.
    pub tick_seconds: f64,

    /// Movement units per simulated second (one unit = 16 ms of wall time
    /// in the original frame loop).
    pub movement_units_per_second: f64,

    /// Distance scale in `physics::advance`.
    pub advance_scale: f64,

    /// Extra factor on an animal's walk distance.
    pub walk_multiplier: f64,

    /// Chance per forage opportunity to look for prey and predators.
    pub reorient_chance: f64,

    /// Chance per tick that an animal acts at all.
    pub animal_action_chance: f64,

    /// Fraction of `size_at_birth` an animal offspring starts with as food.
    pub offspring_food_fraction: f64,

    pub bucket_sampling: BucketSampling,

    /// Buckets swept per tick by the static update.
    pub buckets_per_tick: u32,

    /// Per-kind parameters.
    pub species: BTreeMap<Kind, SpeciesData>,

    /// Density floors, evaluated in order.
    pub regulators: Vec<RegulatorConfig>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            planet: PlanetConfig::default(),
            bucket_size: 5.0,
            max_placement_attempts: 100,
            speed_multiplier: 1.0,
            tick_seconds: 1.0 / 60.0,
            movement_units_per_second: 1000.0 / 16.0,
            advance_scale: 0.1,
            walk_multiplier: 4.0,
            reorient_chance: 0.2,
            animal_action_chance: 1.0,
            offspring_food_fraction: 0.2,
            bucket_sampling: BucketSampling::Shuffled,
            buckets_per_tick: 1,
            species: default_species_table(),
            regulators: default_regulators(),
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Species data for `kind`, if configured.
    pub fn species_of(&self, kind: Kind) -> Option<&SpeciesData> {
        self.species.get(&kind)
    }

    /// Area of the world in tiles.
    pub fn world_area(&self) -> f64 {
        self.planet.width as f64 * self.planet.height as f64
    }

    /// Check the config for contradictions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.planet;
        if p.width == 0 || p.height == 0 {
            return Err(ConfigError::InvalidPlanet("width and height must be positive"));
        }
        if p.min_altitude > p.max_altitude {
            return Err(ConfigError::InvalidPlanet("min_altitude exceeds max_altitude"));
        }
        if p.min_temperature > p.max_temperature {
            return Err(ConfigError::InvalidPlanet(
                "min_temperature exceeds max_temperature",
            ));
        }
        if !(0.0..=1.0).contains(&p.water_percentage) {
            return Err(ConfigError::InvalidPlanet("water_percentage must be in [0, 1]"));
        }
        if self.bucket_size.is_nan() || self.bucket_size <= 0.0 {
            return Err(ConfigError::InvalidParameter("bucket_size must be positive"));
        }
        if self.max_placement_attempts == 0 {
            return Err(ConfigError::InvalidParameter(
                "max_placement_attempts must be at least 1",
            ));
        }
        if self.speed_multiplier.is_nan()
            || self.speed_multiplier <= 0.0
            || self.tick_seconds.is_nan()
            || self.tick_seconds <= 0.0
        {
            return Err(ConfigError::InvalidParameter(
                "speed_multiplier and tick_seconds must be positive",
            ));
        }
        if self.buckets_per_tick == 0 {
            return Err(ConfigError::InvalidParameter("buckets_per_tick must be at least 1"));
        }
        for (name, value) in [
            ("reorient_chance", self.reorient_chance),
            ("animal_action_chance", self.animal_action_chance),
            ("offspring_food_fraction", self.offspring_food_fraction),
        ] {
            unit_range(name, value)?;
        }
        for value in [
            self.advance_scale,
            self.walk_multiplier,
            self.movement_units_per_second,
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(ConfigError::InvalidParameter(
                    "advance_scale, walk_multiplier and movement_units_per_second must not be negative",
                ));
            }
        }

        for (kind, data) in &self.species {
            for product in &data.decay_products {
                self.require(*product)?;
            }
            if let Some(plant) = data.plant() {
                unit_range("min_saturation", plant.min_saturation)?;
                if let Some(next) = plant.next_stage {
                    if self.require(next)?.plant().is_none() {
                        return Err(ConfigError::WrongBehavior {
                            kind: next,
                            expected: "a plant growth stage",
                        });
                    }
                }
                if let Some(spore) = plant.spore {
                    self.require(spore)?;
                }
            }
            if let Some(animal) = data.animal() {
                if animal.size_at_birth <= 0.0 || animal.max_size < animal.size_at_birth {
                    return Err(ConfigError::WrongBehavior {
                        kind: *kind,
                        expected: "an animal with 0 < size_at_birth <= max_size",
                    });
                }
                let rates = [
                    animal.metabolic_rate,
                    animal.eating_rate,
                    animal.speed,
                    animal.view_radius,
                ];
                if rates.iter().any(|r| r.is_nan() || *r < 0.0) {
                    return Err(ConfigError::WrongBehavior {
                        kind: *kind,
                        expected: "an animal with non-negative rates, speed and view radius",
                    });
                }
                if animal.growth_rate < 1.0 {
                    return Err(ConfigError::WrongBehavior {
                        kind: *kind,
                        expected: "an animal with growth_rate >= 1",
                    });
                }
                for other in animal.prey.iter().chain(&animal.predators) {
                    self.require(*other)?;
                }
            }
        }

        for regulator in &self.regulators {
            self.require(regulator.kind)?;
            for other in &regulator.pooled_with {
                self.require(*other)?;
            }
            if regulator.min_fraction < 0.0 {
                return Err(ConfigError::InvalidRegulator {
                    kind: regulator.kind,
                    reason: "min_fraction is negative",
                });
            }
            if regulator.interval < 0.0 {
                return Err(ConfigError::InvalidRegulator {
                    kind: regulator.kind,
                    reason: "interval is negative",
                });
            }
        }
        Ok(())
    }

    fn require(&self, kind: Kind) -> Result<&SpeciesData, ConfigError> {
        self.species.get(&kind).ok_or(ConfigError::MissingSpecies(kind))
    }
}

fn unit_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfUnitRange { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::species::Behavior;

    #[test]
    fn default_config_is_valid() {
        GameConfig::default().validate().unwrap();
    }

    #[test]
    fn default_config_serializes_and_roundtrips() {
        let config = GameConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("\"SeedFruitTree\""));
        let restored = GameConfig::from_json_str(&json).unwrap();
        assert_eq!(restored.planet, config.planet);
        assert_eq!(restored.regulators.len(), config.regulators.len());
        assert_eq!(
            restored.species.keys().collect::<Vec<_>>(),
            config.species.keys().collect::<Vec<_>>()
        );
        assert!((restored.tick_seconds - config.tick_seconds).abs() < 1e-12);
    }

    #[test]
    fn partial_json_fills_in_defaults() {
        let config =
            GameConfig::from_json_str(r#"{"planet": {"width": 64, "height": 32}, "bucket_size": 4.0}"#)
                .unwrap();
        assert_eq!(config.planet.width, 64);
        assert_eq!(config.planet.height, 32);
        assert_eq!(config.planet.min_altitude, -70);
        assert_eq!(config.bucket_size, 4.0);
        assert_eq!(config.max_placement_attempts, 100);
        assert_eq!(config.species.len(), Kind::ALL.len());
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = GameConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn water_threshold_matches_formula() {
        let planet = PlanetConfig {
            min_altitude: -10,
            max_altitude: 10,
            water_percentage: 0.5,
            ..PlanetConfig::default()
        };
        assert_eq!(planet.water_threshold_altitude(), 0);

        let default = PlanetConfig::default();
        // round(140 × 0.3) − 70 = 42 − 70
        assert_eq!(default.water_threshold_altitude(), -28);

        // round(10 × 0.25) = round(2.5) = 2, halves go to even.
        let tie = PlanetConfig {
            min_altitude: -5,
            max_altitude: 5,
            water_percentage: 0.25,
            ..PlanetConfig::default()
        };
        assert_eq!(tie.water_threshold_altitude(), -3);
    }

    #[test]
    fn zero_sized_world_is_rejected() {
        let mut config = GameConfig::default();
        config.planet.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPlanet(_))
        ));
    }

    #[test]
    fn regulator_for_unknown_species_is_rejected() {
        let mut config = GameConfig::default();
        config.species.remove(&Kind::Tiger);
        // Tiger is referenced by predator lists and the regulator list.
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingSpecies(Kind::Tiger))
        ));
    }

    #[test]
    fn next_stage_must_be_a_plant() {
        let mut config = GameConfig::default();
        if let Some(data) = config.species.get_mut(&Kind::SeedFruitTree) {
            if let Behavior::Plant(plant) = &mut data.behavior {
                plant.next_stage = Some(Kind::SmallStone);
            }
        }
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::WrongBehavior { kind: Kind::SmallStone, .. }),
            "got {err:?}"
        );
        assert!(err.to_string().contains("SmallStone"));
    }

    #[test]
    fn chances_outside_unit_range_are_rejected() {
        let mut config = GameConfig::default();
        config.reorient_chance = 1.5;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange {
                name: "reorient_chance",
                ..
            })
        ));

        let mut config = GameConfig::default();
        config.animal_action_chance = f64::NAN;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange {
                name: "animal_action_chance",
                ..
            })
        ));

        let mut config = GameConfig::default();
        if let Some(Behavior::Plant(plant)) = config
            .species
            .get_mut(&Kind::SeedLily)
            .map(|d| &mut d.behavior)
        {
            plant.min_saturation = -0.1;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange {
                name: "min_saturation",
                ..
            })
        ));
    }

    #[test]
    fn negative_scales_and_rates_are_rejected() {
        let mut config = GameConfig::default();
        config.advance_scale = -0.1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter(_))
        ));

        let mut config = GameConfig::default();
        if let Some(Behavior::Animal(rat)) = config.species.get_mut(&Kind::Rat).map(|d| &mut d.behavior) {
            rat.eating_rate = -1.0;
        }
        assert!(matches!(
            config.validate(),
            Err(ConfigError::WrongBehavior { kind: Kind::Rat, .. })
        ));
    }
}
