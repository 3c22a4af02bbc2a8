// terrarium_sim: pure Rust ecosystem simulation library.
//
// This crate contains all simulation logic for Terrarium: terrain
// generation, the entity arena and its spatial index, the data-driven
// lifecycle of minerals, plants and animals, population regulation, and the
// tick loop. It has no rendering or windowing dependencies and can be
// tested, benchmarked, and run headless.
//
// Module overview:
// - `sim.rs`:        Top-level SimState, tick phases, bucket sweep, population reports.
// - `types.rs`:      EntityId, Kind, Point, PositionCriteria, ZLayer.
// - `species.rs`:    SpeciesData: per-kind parameters + the default roster.
// - `config.rs`:     GameConfig, PlanetConfig, RegulatorConfig: all tunables, JSON loading.
// - `tile.rs`:       Per-cell terrain sample.
// - `planet.rs`:     Toroidal tile grid with wrapping accessors.
// - `terrain.rs`:    Terrain generation: altitude, rivers, softening, saturation.
// - `physics.rs`:    Torus geometry, bearing, movement integration.
// - `spatial.rs`:    Bucketed spatial hash for collision and sighting queries.
// - `entity.rs`:     Per-instance Entity record.
// - `collection.rs`: EntityCollection: arena owning entities and the index.
// - `placement.rs`:  Bounded-retry placement search.
// - `lifecycle.rs`:  Decay, phase transition, reproduction, growth, foraging, predation.
// - `regulator.rs`:  PopulationRegulator density floors.
// - `command.rs`:    SimCommand / SimAction: external input (view pan).
// - `event.rs`:      Narrative SimEvents.
// - `prng`:          Re-exported from `terrarium_prng`: xoshiro256++ PRNG with SplitMix64 seeding.
//
// **Critical constraint: determinism.** Within one build, the simulation
// is a function `(seed, config, commands) -> (state, events)`. All
// randomness comes from one seeded `GameRng`; ordered collections are
// `BTreeMap`/`BTreeSet`, and the hash maps in `spatial.rs` are never
// iterated.

pub mod collection;
pub mod command;
pub mod config;
pub mod entity;
pub mod event;
pub mod lifecycle;
pub mod physics;
pub mod placement;
pub mod planet;
pub use terrarium_prng as prng;
pub mod regulator;
pub mod sim;
pub mod spatial;
pub mod species;
pub mod terrain;
pub mod tile;
pub mod types;
