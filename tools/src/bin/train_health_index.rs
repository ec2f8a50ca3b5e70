//! train-health-index: features, classifier, health index, plots.
//!
//! Usage:
//!   train-health-index --data-dir data --figures-dir figures
//!   train-health-index --config pipeline.json --json

use anyhow::Result;
use clap::Parser;
use enginehealth_core::{config::PipelineConfig, pipeline::train_and_evaluate, store::PipelineStore};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "train-health-index")]
#[command(about = "Train the regime classifier and derive the engine health index", long_about = None)]
struct Args {
    /// JSON pipeline config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the generated run CSV files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory for rendered SVG figures
    #[arg(long)]
    figures_dir: Option<PathBuf>,

    /// Rolling window length in samples
    #[arg(long)]
    window: Option<usize>,

    /// Number of trees in the forest
    #[arg(long)]
    trees: Option<usize>,

    /// Health index alarm threshold
    #[arg(long)]
    threshold: Option<f64>,

    /// Trailing moving-average window applied to the health index
    #[arg(long)]
    smoothing: Option<usize>,

    /// Skip the SQLite run registry
    #[arg(long, default_value_t = false)]
    no_registry: bool,

    /// Print the classification report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(v) = args.data_dir    { config.paths.data_dir = v; }
    if let Some(v) = args.figures_dir { config.paths.figures_dir = v; }
    if let Some(v) = args.window      { config.features.window = v; }
    if let Some(v) = args.trees       { config.forest.n_estimators = v; }
    if let Some(v) = args.threshold   { config.health.alarm_threshold = v; }
    if args.smoothing.is_some()       { config.health.smoothing_window = args.smoothing; }

    let store = if args.no_registry {
        None
    } else {
        let store = PipelineStore::open(&config.registry_path())?;
        store.migrate()?;
        log::debug!("registry at {}", config.registry_path().display());
        Some(store)
    };

    let report = train_and_evaluate(&config, store.as_ref())?;
    let eval = &report.evaluation;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&eval.report)?);
        return Ok(());
    }

    println!("Classification report (fault vs normal regimes):");
    println!("{}", eval.report);

    println!("=== HEALTH SUMMARY ===");
    for s in &eval.summaries {
        let alarm = s
            .first_alarm
            .map(|t| format!("{t:.0} s"))
            .unwrap_or_else(|| "-".into());
        println!(
            "  {:<28} mean {:.3} | min {:.3} | first alarm {alarm}",
            s.run_id, s.mean_health, s.min_health
        );
    }
    println!();
    println!("  session:     {}", report.session_id);
    println!("  health csv:  {}", report.health_csv.display());
    for fig in &report.figures {
        println!("  figure:      {}", fig.display());
    }
    Ok(())
}
