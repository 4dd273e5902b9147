//! Wayfarer - headless runner
//!
//! Builds the demo world, runs it for a number of ticks and prints the
//! travelers' logs or a JSON snapshot.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use wayfarer::core::config::SimulationConfig;
use wayfarer::core::error::Result;
use wayfarer::simulation::tick::SimulationEvent;
use wayfarer::simulation::Simulation;
use wayfarer::world::scenario;

/// Run the caravan world headless
#[derive(Parser, Debug)]
#[command(name = "wayfarer")]
#[command(about = "Run the towns-and-travelers simulation and print what happened")]
struct Args {
    /// TOML configuration file; defaults are used when absent
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON map file; the built-in demo map is used when absent
    #[arg(long)]
    map: Option<PathBuf>,

    /// Resume from a JSON snapshot instead of building a new world
    #[arg(long, conflicts_with_all = ["config", "map"])]
    resume: Option<PathBuf>,

    /// Number of ticks to run
    #[arg(long, default_value_t = 100)]
    ticks: u32,

    /// Simulated milliseconds per tick
    #[arg(long, default_value_t = 250)]
    tick_ms: u32,

    /// Random seed override
    #[arg(long)]
    seed: Option<u64>,

    /// Travelers spawned per town
    #[arg(long, default_value_t = 2)]
    per_town: usize,

    /// Output format: text or json
    #[arg(long, default_value = "text")]
    format: String,

    /// Write the final snapshot to this file
    #[arg(long)]
    save: Option<PathBuf>,
}

fn build(args: &Args) -> Result<Simulation> {
    if let Some(path) = &args.resume {
        return Simulation::load_json(path);
    }
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let map = match &args.map {
        Some(path) => scenario::load_map(path)?,
        None => scenario::demo_map(),
    };
    let mut sim = Simulation::new(config, map)?;
    scenario::populate(&mut sim, args.per_town)?;
    Ok(sim)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wayfarer=info")),
        )
        .init();

    let args = Args::parse();
    let mut sim = build(&args)?;
    tracing::info!(
        "starting with {} travelers in {} towns",
        sim.traveler_count(),
        sim.map.towns().count()
    );

    let mut arrivals = 0;
    let mut pruned = 0;
    for _ in 0..args.ticks {
        for event in sim.tick(args.tick_ms) {
            match event {
                SimulationEvent::Arrived { .. } => arrivals += 1,
                SimulationEvent::Pruned { count } => pruned += count,
                SimulationEvent::IntentFailed { traveler, reason } => {
                    tracing::debug!("{} could not act: {}", traveler, reason);
                }
            }
        }
    }
    tracing::info!(
        "ran {} ticks: {} arrivals, {} removed, {} remaining",
        args.ticks,
        arrivals,
        pruned,
        sim.traveler_count()
    );

    match args.format.as_str() {
        "json" => println!("{}", sim.to_json()?),
        _ => {
            for traveler in sim.travelers() {
                println!("=== {} ({}) ===", traveler.name, traveler.id);
                for line in traveler.status_text() {
                    println!("  {}", line);
                }
                for entry in &traveler.log {
                    println!("  - {}", entry);
                }
            }
        }
    }

    if let Some(path) = &args.save {
        sim.save_json(path)?;
    }
    Ok(())
}
