// Test-only world builder for end-to-end ecosystem scenarios.
//
// `TestWorld` builds a `SimState` on a hand-made planet instead of generated
// terrain, so scenarios control exactly where water is and what the tiles
// hold. Everything after construction runs through the same
// `SimState::step()` path as the headless runner.
//
// Worlds start with no regulators; scenarios that want them add them
// explicitly.
//
// See also: `tests/ecosystem.rs` for the scenarios.

use terrarium_sim::config::{GameConfig, RegulatorConfig};
use terrarium_sim::event::SimEvent;
use terrarium_sim::planet::Planet;
use terrarium_sim::sim::SimState;
use terrarium_sim::types::Kind;

/// Builder for a flat test planet and the config that goes with it.
pub struct TestWorld {
    config: GameConfig,
    water_columns: u32,
    land_saturation: f64,
    temperature: i32,
}

impl TestWorld {
    /// A dry, flat `width × height` world with default species and no
    /// regulators.
    pub fn new(width: u32, height: u32) -> Self {
        let mut config = GameConfig::default();
        config.planet.width = width;
        config.planet.height = height;
        config.regulators.clear();
        Self {
            config,
            water_columns: 0,
            land_saturation: 0.0,
            temperature: 15,
        }
    }

    /// Columns `0..columns` are water (saturation 1).
    pub fn with_water_columns(mut self, columns: u32) -> Self {
        self.water_columns = columns;
        self
    }

    pub fn with_land_saturation(mut self, saturation: f64) -> Self {
        self.land_saturation = saturation;
        self
    }

    pub fn with_temperature(mut self, temperature: i32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_regulators(mut self, regulators: Vec<RegulatorConfig>) -> Self {
        self.config.regulators = regulators;
        self
    }

    /// Arbitrary config tweaks.
    pub fn configure(mut self, f: impl FnOnce(&mut GameConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn planet(&self) -> Planet {
        let mut planet = Planet::new(&self.config.planet);
        for y in 0..self.config.planet.height as i64 {
            for x in 0..self.config.planet.width as i64 {
                let water = (x as u32) < self.water_columns;
                let tile = planet.tile_mut(x, y);
                tile.is_water = water;
                tile.saturation = if water { 1.0 } else { self.land_saturation };
                tile.temperature = self.temperature;
            }
        }
        planet
    }

    pub fn build(self, seed: u64) -> SimState {
        let planet = self.planet();
        SimState::with_planet(seed, self.config, planet)
    }
}

/// Step `sim` forward by `ticks`, returning every event emitted.
pub fn run_ticks(sim: &mut SimState, ticks: u64) -> Vec<SimEvent> {
    let target = sim.tick + ticks;
    sim.step(&[], target).events
}

/// Ticks covering `seconds` of simulated time at the sim's tick rate.
pub fn ticks_for(sim: &SimState, seconds: f64) -> u64 {
    (seconds / sim.config.tick_seconds).ceil() as u64
}

/// A bit-exact summary of every entity, for determinism comparisons.
pub fn fingerprint(sim: &SimState) -> Vec<(u64, Kind, u64, u64, u64)> {
    sim.entities
        .iter()
        .map(|e| {
            let p = e.position();
            (
                e.id().0,
                e.kind(),
                p.x.to_bits(),
                p.y.to_bits(),
                e.size().to_bits(),
            )
        })
        .collect()
}
