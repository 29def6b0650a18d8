//! Animat Simulator
//!
//! Runs a seeded simulation from a TOML config and optional command line
//! overrides, writing events, frames and a summary on request.

use animat_core::brain::LearningBrain;
use animat_core::{EventLog, JsonlRecorder, SimConfig, SimError, Simulation};
use animat_events::RunManifest;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Command line arguments for the simulator
#[derive(Parser, Debug)]
#[command(name = "animat_sim")]
#[command(about = "Animats foraging, fighting and learning on a toroidal grid")]
struct Args {
    /// TOML configuration file (defaults are used when absent)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate
    #[arg(long)]
    ticks: Option<u64>,

    /// Side length of the square board
    #[arg(long)]
    board_size: Option<usize>,

    /// Number of animats placed at startup
    #[arg(long)]
    animats: Option<usize>,

    /// Append every event to this JSONL file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write one frame per tick to this JSONL file
    #[arg(long)]
    frames: Option<PathBuf>,

    /// Write the run summary as JSON
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Start every animat from a saved learning brain
    #[arg(long)]
    load_brain: Option<PathBuf>,

    /// Save the fittest animat's learning brain after the run
    #[arg(long)]
    save_brain: Option<PathBuf>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

fn load_config(args: &Args) -> Result<SimConfig, SimError> {
    let mut config = match &args.config {
        Some(path) => SimConfig::from_file(path)?,
        None => SimConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.world.seed = seed;
    }
    if let Some(ticks) = args.ticks {
        config.world.ticks = ticks;
    }
    if let Some(size) = args.board_size {
        config.world.board_size = size;
    }
    if let Some(animats) = args.animats {
        config.world.initial_animats = animats;
    }
    config.validate()?;
    Ok(config)
}

fn run(args: Args) -> Result<(), SimError> {
    let config = load_config(&args)?;
    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let mut builder = Simulation::builder(config.clone());
    if let Some(path) = &args.load_brain {
        let brain = LearningBrain::load(path)?;
        info!("loaded brain with {} entries from {}", brain.table_size(), path.display());
        builder = builder.with_brain_template(Box::new(brain));
    }
    if let Some(path) = &args.events {
        builder = builder.with_event_log(EventLog::new(path)?);
    }
    if let Some(path) = &args.frames {
        let brain = if args.load_brain.is_some() {
            "learning"
        } else {
            config.learning.brain.name()
        };
        let manifest = RunManifest::new(
            config.world.seed,
            config.world.board_size as u32,
            config.world.ticks,
            config.world.initial_animats as u32,
            brain,
        );
        builder = builder.with_recorder(JsonlRecorder::create(path, &manifest)?);
    }

    let mut sim = builder.build()?;
    let summary = sim.run();

    println!();
    println!(
        "Ran {} ticks: {} animats left, mean health {:.1}",
        summary.ticks_run, summary.final_population, summary.mean_health
    );
    println!(
        "  births: {}  deaths: {}  attacks: {}  meals: {}",
        summary.births, summary.deaths, summary.attacks, summary.meals
    );
    if summary.brain_failures > 0 || summary.recorder_failures > 0 {
        println!(
            "  brain failures: {}  recorder failures: {}",
            summary.brain_failures, summary.recorder_failures
        );
    }

    if let Some(path) = &args.summary {
        fs::write(path, summary.to_json_pretty()?)?;
        info!("wrote summary to {}", path.display());
    }

    if let Some(path) = &args.save_brain {
        let learned = sim
            .fittest()
            .and_then(|animat| animat.brain.as_any().downcast_ref::<LearningBrain>());
        match learned {
            Some(brain) => {
                brain.save(path)?;
                info!("saved fittest brain to {}", path.display());
            }
            None => warn!("no learning brain to save, skipping {}", path.display()),
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
