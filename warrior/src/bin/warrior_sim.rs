//! warrior_sim - run a warrior simulation and print the summary as JSON
//!
//! Usage: warrior_sim <sim.toml> <build.toml> [rotation.toml]
//!
//! Logging goes to stderr and is controlled with RUST_LOG (default: info).
//! SIM_CONSTANTS may point at a TOML file overriding the engine constants.

use serde::Serialize;
use sim_core::metrics::AggregateMetrics;
use sim_core::stat_weights::{compute_stat_weights, StatWeights};
use sim_core::{init_constants, SimConfig, SimError, TrialRunner};
use sim_types::{Build, ConfigError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use thiserror::Error;
use tracing_subscriber::filter::EnvFilter;
use warrior::{RotationOptions, WarriorScenario, EP_REFERENCE, EP_STATS};

/// Stat bonus used for each stat weight run
const STAT_WEIGHT_DELTA: f64 = 50.0;

#[derive(Debug, Error)]
enum CliError {
    #[error("usage: warrior_sim <sim.toml> <build.toml> [rotation.toml]")]
    Usage,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Sim(#[from] SimError),
    #[error("failed to write results: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct Report {
    build: String,
    iterations: u64,
    seed: u64,
    duration_secs: f64,
    results: AggregateMetrics,
    #[serde(skip_serializing_if = "Option::is_none")]
    stat_weights: Option<StatWeights>,
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &[String]) -> Result<String, CliError> {
    let (sim_path, build_path, rotation_path) = match args {
        [sim, build] => (PathBuf::from(sim), PathBuf::from(build), None),
        [sim, build, rotation] => (PathBuf::from(sim), PathBuf::from(build), Some(PathBuf::from(rotation))),
        _ => return Err(CliError::Usage),
    };

    if let Ok(path) = std::env::var("SIM_CONSTANTS") {
        init_constants(Path::new(&path))?;
    }
    let config = SimConfig::load(&sim_path)?;
    let build = Build::load(&build_path)?;
    let options = match rotation_path {
        Some(path) => RotationOptions::load(&path)?,
        None => RotationOptions::default(),
    };
    tracing::info!(build = %build.name, sim = %sim_path.display(), "loaded inputs");

    let runner = TrialRunner::from_config(&config);
    let scenario = WarriorScenario::new(build.clone(), config.clone(), options.clone());
    let results = runner.run(&scenario)?;
    let stat_weights = if options.stat_weights {
        Some(compute_stat_weights(&runner, &scenario, &EP_STATS, STAT_WEIGHT_DELTA, EP_REFERENCE)?)
    } else {
        None
    };

    let report = Report {
        build: build.name,
        iterations: config.iterations,
        seed: config.seed,
        duration_secs: config.duration_secs,
        results,
        stat_weights,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn main() -> ExitCode {
    init_logging();
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "simulation failed");
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
