// CLI entry point for running Terrarium without a renderer.
//
// Builds a `SimState` from a seed and an optional JSON config, steps it in
// batches and prints a per-kind population table after each batch. Logging
// goes through `tracing`; set `RUST_LOG` (default `info`) to see lifecycle
// detail, e.g. `RUST_LOG=terrarium_sim=debug`.
//
// Usage:
//   terrarium [OPTIONS]
//     --seed <N>           PRNG seed (default: 42)
//     --ticks <N>          Ticks to run (default: 3600, one minute at 60 Hz)
//     --report-every <N>   Ticks between population reports (default: 600)
//     --config <PATH>      JSON game config (default: built-in)

use std::collections::BTreeMap;
use std::path::PathBuf;

use terrarium_sim::config::GameConfig;
use terrarium_sim::event::{SimEvent, SimEventKind};
use terrarium_sim::sim::SimState;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct RunConfig {
    seed: u64,
    ticks: u64,
    report_every: u64,
    config_path: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            ticks: 3600,
            report_every: 600,
            config_path: None,
        }
    }
}

fn main() {
    init_tracing();
    let run = parse_args();

    let config = match load_config(&run) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    let mut sim = SimState::with_config(run.seed, config);
    info!(
        seed = run.seed,
        ticks = run.ticks,
        water_tiles = sim.planet.water_tile_count(),
        "starting headless run"
    );

    let mut tally = EventTally::default();
    while sim.tick < run.ticks {
        let target = (sim.tick + run.report_every).min(run.ticks);
        let result = sim.step(&[], target);
        tally.record(&result.events);
        print!("{}", sim.population_report());
        println!("  {tally}");
    }

    info!(tick = sim.tick, entities = sim.entities.len(), "run finished");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(run: &RunConfig) -> Result<GameConfig, terrarium_sim::config::ConfigError> {
    match &run.config_path {
        Some(path) => GameConfig::load(path),
        None => {
            let config = GameConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Running totals of narrative events, by category.
#[derive(Default)]
struct EventTally {
    counts: BTreeMap<&'static str, u64>,
}

impl EventTally {
    fn record(&mut self, events: &[SimEvent]) {
        for event in events {
            let label = match event.kind {
                SimEventKind::Spawned { .. } => "spawned",
                SimEventKind::Decayed { .. } => "decayed",
                SimEventKind::Transitioned { .. } => "transitioned",
                SimEventKind::Born { .. } => "born",
                SimEventKind::Grew { .. } => "grew",
                SimEventKind::Ate { .. } => "bites",
                SimEventKind::ViewPanned { .. } => "panned",
            };
            *self.counts.entry(label).or_insert(0) += 1;
        }
    }
}

impl std::fmt::Display for EventTally {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .counts
            .iter()
            .map(|(label, n)| format!("{label}={n}"))
            .collect();
        write!(f, "events so far: {}", parts.join(" "))
    }
}

/// Parse command-line arguments into a `RunConfig`. Uses simple
/// `std::env::args()` matching.
fn parse_args() -> RunConfig {
    let mut run = RunConfig::default();
    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;

    while i < args.len() {
        match args[i].as_str() {
            "--seed" => {
                i += 1;
                run.seed = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--seed requires a valid number");
                    std::process::exit(1);
                });
            }
            "--ticks" => {
                i += 1;
                run.ticks = args.get(i).and_then(|s| s.parse().ok()).unwrap_or_else(|| {
                    eprintln!("--ticks requires a valid number");
                    std::process::exit(1);
                });
            }
            "--report-every" => {
                i += 1;
                run.report_every = args
                    .get(i)
                    .and_then(|s| s.parse().ok())
                    .filter(|n: &u64| *n > 0)
                    .unwrap_or_else(|| {
                        eprintln!("--report-every requires a positive number");
                        std::process::exit(1);
                    });
            }
            "--config" => {
                i += 1;
                run.config_path = args.get(i).map(PathBuf::from).or_else(|| {
                    eprintln!("--config requires a path");
                    std::process::exit(1);
                });
            }
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    run
}

fn print_usage() {
    println!("Usage: terrarium [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --seed <N>           PRNG seed (default: 42)");
    println!("  --ticks <N>          Ticks to run (default: 3600)");
    println!("  --report-every <N>   Ticks between population reports (default: 600)");
    println!("  --config <PATH>      JSON game config (default: built-in)");
    println!("  --help, -h           Show this help");
}
