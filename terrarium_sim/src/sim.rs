// Core simulation state and tick loop.
//
// `SimState` is the single source of truth for the ecosystem. It owns the
// planet (terrain), the entity collection (arena + spatial index), the
// regulator set, the PRNG and the game config. The sim is a function
// `(state, commands) -> (new_state, events)`: `step()` applies due commands
// and runs whole ticks up to a target tick, returning the narrative events
// produced along the way.
//
// ## Tick phases
//
// Every tick advances simulated time by `tick_seconds` and runs, in order:
//
//   1. Regulators: each `PopulationRegulator` gets one throttled check and
//      may spawn one entity (see `regulator.rs`).
//   2. Static sweep: a batch of spatial buckets is chosen by
//      `BucketSweep`, and every non-animal registered in those buckets gets
//      `Ecosystem::update_static` (reproduce, decay, phase transition).
//      Static entities vastly outnumber animals, so they are amortized
//      across ticks instead of all being touched every tick.
//   3. Fauna: every animal alive at the start of the phase gets
//      `Ecosystem::update_animal` (reproduce / grow / forage, then
//      metabolism), in id order.
//
// ## Bucket sweep
//
// In `BucketSampling::Shuffled` mode (default) the sweep walks a freshly
// shuffled permutation of all bucket indices, `buckets_per_tick` per tick,
// never crossing a permutation boundary within one tick. Every bucket is
// therefore visited exactly once per cycle of
// `K = ceil(bucket_count / buckets_per_tick)` ticks, and no bucket waits
// more than `2K - 1` ticks between visits. `BucketSampling::Uniform` draws
// `buckets_per_tick` independent uniform buckets per tick with no bound.
//
// See also: `lifecycle.rs` for the per-entity updates, `regulator.rs` for
// phase 1, `command.rs` / `event.rs` for the I/O types, `terrain.rs` for
// world generation at construction.
//
// **Critical constraint: determinism.** A single `GameRng` drives terrain
// generation, regulators, the sweep and every lifecycle draw, and all
// iteration is over ordered collections. Two sims built from the same seed
// and config and stepped with the same commands stay identical.

use crate::collection::EntityCollection;
use crate::command::{SimAction, SimCommand};
use crate::config::{BucketSampling, GameConfig};
use crate::entity::NewEntity;
use crate::event::{SimEvent, SimEventKind};
use crate::lifecycle::Ecosystem;
use crate::planet::Planet;
use crate::prng::GameRng;
use crate::regulator::{PopulationRegulator, regulators_from_config, run_regulators};
use crate::terrain;
use crate::types::{EntityId, Kind, Point};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, error, info, trace};

// ---------------------------------------------------------------------------
// Bucket sweep
// ---------------------------------------------------------------------------

/// Chooses which spatial buckets get the static update each tick.
#[derive(Clone, Debug, Default)]
pub struct BucketSweep {
    order: Vec<usize>,
    cursor: usize,
}

impl BucketSweep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bucket indices to process this tick.
    pub fn next_batch(
        &mut self,
        sampling: BucketSampling,
        per_tick: u32,
        bucket_count: usize,
        rng: &mut GameRng,
    ) -> Vec<usize> {
        let per_tick = per_tick as usize;
        if bucket_count == 0 || per_tick == 0 {
            return Vec::new();
        }
        match sampling {
            BucketSampling::Uniform => (0..per_tick)
                .map(|_| rng.range_usize(0, bucket_count))
                .collect(),
            BucketSampling::Shuffled => {
                if self.cursor >= self.order.len() || self.order.len() != bucket_count {
                    self.order = (0..bucket_count).collect();
                    rng.shuffle(&mut self.order);
                    self.cursor = 0;
                }
                let end = (self.cursor + per_tick).min(self.order.len());
                let batch = self.order[self.cursor..end].to_vec();
                self.cursor = end;
                batch
            }
        }
    }
}

/// Ticks per full sweep of `bucket_count` buckets in shuffled mode.
pub fn sweep_cycle_ticks(bucket_count: usize, per_tick: u32) -> usize {
    bucket_count.div_ceil((per_tick as usize).max(1))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Snapshot of population counts.
#[derive(Clone, Debug, PartialEq)]
pub struct PopulationReport {
    pub tick: u64,
    /// Simulated seconds.
    pub seconds: f64,
    pub counts: BTreeMap<Kind, usize>,
    pub total: usize,
    pub animals: usize,
}

impl fmt::Display for PopulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "tick {} ({:.1} s): {} entities, {} animals",
            self.tick, self.seconds, self.total, self.animals
        )?;
        for (kind, count) in &self.counts {
            writeln!(f, "  {:<16} {:>6}", kind.to_string(), count)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// SimState
// ---------------------------------------------------------------------------

/// The complete simulation state.
pub struct SimState {
    /// Ticks run so far.
    pub tick: u64,
    pub rng: GameRng,
    pub config: GameConfig,
    pub planet: Planet,
    pub entities: EntityCollection,
    pub regulators: Vec<PopulationRegulator>,
    /// Top-left tile of the renderer's view, moved by `PanView`.
    pub view_origin: (u32, u32),
    sweep: BucketSweep,
}

/// Output of a `step()` call.
pub struct StepResult {
    /// Narrative events emitted during this step.
    pub events: Vec<SimEvent>,
}

impl SimState {
    /// Create a new simulation with default config and the given seed.
    pub fn new(seed: u64) -> Self {
        Self::with_config(seed, GameConfig::default())
    }

    /// Create a new simulation with the given seed and config, generating
    /// fresh terrain.
    pub fn with_config(seed: u64, config: GameConfig) -> Self {
        if let Err(err) = config.validate() {
            error!(%err, "invalid game configuration");
            if cfg!(debug_assertions) {
                panic!("invalid game configuration: {err}");
            }
        }
        let mut rng = GameRng::new(seed);
        let planet = terrain::generate(&config.planet, &mut rng);
        Self::assemble(rng, config, planet)
    }

    /// Create a simulation on an already-built planet. The planet's size
    /// must match `config.planet`.
    pub fn with_planet(seed: u64, config: GameConfig, planet: Planet) -> Self {
        debug_assert_eq!(
            (planet.width(), planet.height()),
            (config.planet.width, config.planet.height),
            "planet size does not match config"
        );
        Self::assemble(GameRng::new(seed), config, planet)
    }

    fn assemble(rng: GameRng, config: GameConfig, planet: Planet) -> Self {
        let entities = EntityCollection::new(
            planet.width() as f64,
            planet.height() as f64,
            config.bucket_size,
        );
        let regulators = regulators_from_config(&config, 0.0);
        info!(
            width = planet.width(),
            height = planet.height(),
            buckets = entities.spatial().bucket_count(),
            regulators = regulators.len(),
            "simulation created"
        );
        Self {
            tick: 0,
            rng,
            config,
            planet,
            entities,
            regulators,
            view_origin: (0, 0),
            sweep: BucketSweep::new(),
        }
    }

    /// Simulated seconds elapsed.
    pub fn now(&self) -> f64 {
        self.tick as f64 * self.config.tick_seconds
    }

    /// Place a default instance of `kind` at `position` without any
    /// placement checks. `None` if the kind has no species data.
    pub fn spawn(&mut self, kind: Kind, position: Point) -> Option<EntityId> {
        let now = self.now();
        let species = self.config.species.get(&kind)?;
        Some(
            self.entities
                .insert(NewEntity::of(kind, species, position), species, now),
        )
    }

    /// Apply due commands and run ticks until `self.tick == target_tick`.
    /// `commands` must be sorted by tick.
    pub fn step(&mut self, commands: &[SimCommand], target_tick: u64) -> StepResult {
        let mut events = Vec::new();
        let mut cmd_idx = 0;

        while self.tick < target_tick {
            self.tick += 1;
            while cmd_idx < commands.len() && commands[cmd_idx].tick <= self.tick {
                self.apply_command(&commands[cmd_idx], &mut events);
                cmd_idx += 1;
            }
            self.run_tick(&mut events);
        }

        StepResult { events }
    }

    fn apply_command(&mut self, command: &SimCommand, events: &mut Vec<SimEvent>) {
        match command.action {
            SimAction::PanView { dx, dy } => {
                let (x, y) = self.view_origin;
                let origin = self
                    .planet
                    .wrap(x as i64 + dx as i64, y as i64 + dy as i64);
                self.view_origin = origin;
                debug!(x = origin.0, y = origin.1, "view panned");
                events.push(SimEvent {
                    tick: self.tick,
                    kind: SimEventKind::ViewPanned {
                        x: origin.0,
                        y: origin.1,
                    },
                });
            }
        }
    }

    fn run_tick(&mut self, events: &mut Vec<SimEvent>) {
        let now = self.now();
        let SimState {
            tick,
            rng,
            config,
            planet,
            entities,
            regulators,
            sweep,
            ..
        } = self;
        let config: &GameConfig = config;
        let mut eco = Ecosystem {
            config,
            planet,
            entities,
            rng,
            tick: *tick,
            now,
            events,
        };

        run_regulators(regulators, &mut eco);

        let batch = sweep.next_batch(
            config.bucket_sampling,
            config.buckets_per_tick,
            eco.entities.spatial().bucket_count(),
            eco.rng,
        );
        let statics: BTreeSet<EntityId> = batch
            .iter()
            .flat_map(|&b| eco.entities.bucket_entities(b))
            .collect();
        for id in statics {
            eco.update_static(id);
        }

        let animals: Vec<EntityId> = eco.entities.animals().collect();
        for id in animals {
            eco.update_animal(id);
        }

        trace!(
            tick = *tick,
            entities = eco.entities.len(),
            buckets = batch.len(),
            "tick done"
        );
    }

    /// Per-kind population counts at the current tick.
    pub fn population_report(&self) -> PopulationReport {
        PopulationReport {
            tick: self.tick,
            seconds: self.now(),
            counts: self.entities.kind_counts().clone(),
            total: self.entities.len(),
            animals: self.entities.animal_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::SpawnCause;

    fn small_config() -> GameConfig {
        let mut config = GameConfig::default();
        config.planet.width = 48;
        config.planet.height = 48;
        config
    }

    #[test]
    fn step_advances_tick_and_time() {
        let mut sim = SimState::with_config(42, small_config());
        sim.step(&[], 120);
        assert_eq!(sim.tick, 120);
        assert!((sim.now() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn regulators_populate_an_empty_world() {
        let mut sim = SimState::with_config(42, small_config());
        assert!(sim.entities.is_empty());
        let result = sim.step(&[], 600);
        assert!(!sim.entities.is_empty());
        assert!(result.events.iter().any(|e| matches!(
            e.kind,
            SimEventKind::Spawned {
                cause: SpawnCause::Regulator,
                ..
            }
        )));
        assert!(sim.entities.is_consistent());
    }

    #[test]
    fn determinism_after_stepping() {
        let mut sim_a = SimState::with_config(7, small_config());
        let mut sim_b = SimState::with_config(7, small_config());
        let cmds = vec![SimCommand {
            tick: 30,
            action: SimAction::PanView { dx: 2, dy: -1 },
        }];

        let events_a = sim_a.step(&cmds, 900).events;
        let events_b = sim_b.step(&cmds, 900).events;

        assert_eq!(events_a, events_b);
        let a: Vec<_> = sim_a.entities.iter().cloned().collect();
        let b: Vec<_> = sim_b.entities.iter().cloned().collect();
        assert_eq!(a, b);
        assert_eq!(sim_a.rng, sim_b.rng);
    }

    #[test]
    fn different_seeds_give_different_terrain() {
        let a = SimState::with_config(1, small_config());
        let b = SimState::with_config(2, small_config());
        assert_ne!(a.planet.tiles(), b.planet.tiles());
    }

    #[test]
    fn pan_view_wraps_and_emits() {
        let mut sim = SimState::with_config(42, small_config());
        let cmds = vec![
            SimCommand {
                tick: 1,
                action: SimAction::PanView { dx: -1, dy: 0 },
            },
            SimCommand {
                tick: 2,
                action: SimAction::PanView { dx: 0, dy: 50 },
            },
        ];
        let result = sim.step(&cmds, 2);
        assert_eq!(sim.view_origin, (47, 2));
        let pans: Vec<_> = result
            .events
            .iter()
            .filter_map(|e| match e.kind {
                SimEventKind::ViewPanned { x, y } => Some((e.tick, x, y)),
                _ => None,
            })
            .collect();
        assert_eq!(pans, vec![(1, 47, 0), (2, 47, 2)]);
    }

    #[test]
    fn future_commands_wait_for_their_tick() {
        let mut sim = SimState::with_config(42, small_config());
        let cmds = vec![SimCommand {
            tick: 10,
            action: SimAction::PanView { dx: 1, dy: 1 },
        }];
        sim.step(&cmds, 5);
        assert_eq!(sim.view_origin, (0, 0));
    }

    #[test]
    fn shuffled_sweep_visits_every_bucket_once_per_cycle() {
        let mut sweep = BucketSweep::new();
        let mut rng = GameRng::new(9);
        let buckets = 10;
        let per_tick = 3;
        let k = sweep_cycle_ticks(buckets, per_tick);
        assert_eq!(k, 4);

        for _cycle in 0..5 {
            let mut seen = vec![0; buckets];
            for _ in 0..k {
                for b in sweep.next_batch(BucketSampling::Shuffled, per_tick, buckets, &mut rng) {
                    seen[b] += 1;
                }
            }
            assert!(seen.iter().all(|&n| n == 1), "visits per cycle: {seen:?}");
        }
    }

    #[test]
    fn uniform_sweep_draws_in_range() {
        let mut sweep = BucketSweep::new();
        let mut rng = GameRng::new(9);
        for _ in 0..100 {
            let batch = sweep.next_batch(BucketSampling::Uniform, 2, 7, &mut rng);
            assert_eq!(batch.len(), 2);
            assert!(batch.iter().all(|&b| b < 7));
        }
    }

    #[test]
    fn population_report_matches_collection() {
        let mut sim = SimState::with_config(3, small_config());
        sim.step(&[], 300);
        let report = sim.population_report();
        assert_eq!(report.total, sim.entities.len());
        assert_eq!(report.counts.values().sum::<usize>(), report.total);
        assert_eq!(report.animals, sim.entities.animal_count());
        assert!(report.to_string().starts_with("tick 300"));
    }

    #[test]
    fn spawn_places_default_instance() {
        let mut sim = SimState::with_config(3, small_config());
        let id = sim.spawn(Kind::Tiger, Point::new(10.0, 10.0)).expect("tiger");
        let tiger = sim.entities.get(id).expect("tiger");
        assert_eq!(tiger.size(), 0.5);
        assert_eq!(tiger.food, 0.5);
    }
}
