//! generate-telemetry: write every synthetic run to the data directory.
//!
//! Usage:
//!   generate-telemetry --seed 42 --duration 300 --data-dir data
//!   generate-telemetry --config pipeline.json

use anyhow::Result;
use clap::Parser;
use enginehealth_core::{
    config::PipelineConfig,
    fault::Regime,
    pipeline::generate_dataset,
    store::PipelineStore,
};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "generate-telemetry")]
#[command(about = "Generate labeled synthetic rocket-engine telemetry runs", long_about = None)]
struct Args {
    /// JSON pipeline config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output directory for <regime>_run_<i>.csv files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Master seed for every run's noise streams
    #[arg(long)]
    seed: Option<u64>,

    /// Run duration in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Sample rate in Hz
    #[arg(long)]
    sample_rate: Option<f64>,

    /// Replicates of the normal regime
    #[arg(long)]
    normal_replicates: Option<usize>,

    /// Replicates of each fault regime
    #[arg(long)]
    fault_replicates: Option<usize>,

    /// Skip the SQLite run registry
    #[arg(long, default_value_t = false)]
    no_registry: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    let g = &mut config.generation;
    if let Some(v) = args.seed              { g.seed = v; }
    if let Some(v) = args.duration          { g.duration_s = v; }
    if let Some(v) = args.sample_rate       { g.sample_rate_hz = v; }
    if let Some(v) = args.normal_replicates { g.normal_replicates = v; }
    if let Some(v) = args.fault_replicates  { g.fault_replicates = v; }
    if let Some(v) = args.data_dir          { config.paths.data_dir = v; }

    println!("Engine telemetry generator");
    println!("  seed:        {}", config.generation.seed);
    println!("  duration:    {} s @ {} Hz", config.generation.duration_s, config.generation.sample_rate_hz);
    println!("  data_dir:    {}", config.paths.data_dir.display());
    println!();

    let store = if args.no_registry {
        None
    } else {
        let store = PipelineStore::open(&config.registry_path())?;
        store.migrate()?;
        log::debug!("registry at {}", config.registry_path().display());
        Some(store)
    };

    let summary = generate_dataset(&config, store.as_ref())?;

    println!("=== GENERATION SUMMARY ===");
    println!("  session:     {}", summary.session_id);
    for regime in Regime::ALL {
        println!("  {:<22} {} runs", regime.as_str(), config.generation.replicates_for(regime));
    }
    println!("  files:       {}", summary.files.len());
    Ok(())
}
