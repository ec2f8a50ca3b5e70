//! Pipeline orchestration: generation and train/evaluate glue.
//!
//! STAGE ORDER (fixed, documented, never reordered):
//!   1. Load every persisted run from the data directory
//!   2. Extract rolling-window features per run
//!   3. Stratified train/validation split
//!   4. Fit the classifier on the training split
//!   5. Score the validation split (classification report)
//!   6. Predict class probabilities for the full feature table
//!   7. Project P(normal) into the health index
//!   8. Persist health_index.csv, figures, registry rows
//!
//! RULES:
//!   - No stage mutates the output of an earlier stage.
//!   - Any error aborts the pipeline; nothing half-written is renamed in.

use crate::{
    classifier::{Classifier, RandomForest},
    config::{GenerationConfig, PipelineConfig},
    error::{TelemetryError, TelemetryResult},
    fault::Regime,
    features::{extract_features, FeatureTable},
    health::{health_series, HealthSeries, RunHealthSummary},
    metrics::{classification_report, ClassificationReport},
    persist::{load_runs, write_health_csv, write_run_csv, HEALTH_INDEX_FILE},
    plot::{plot_channel_by_regime, plot_health_index},
    run::{Run, RunGenerator},
    split::{select, stratified_split},
    store::{new_session_id, PipelineStore},
    types::Channel,
};
use std::path::PathBuf;

/// Run generator configured from the generation section, overrides applied.
pub fn build_generator(config: &GenerationConfig) -> TelemetryResult<RunGenerator> {
    let mut generator = RunGenerator::new(config.seed, config.duration_s, config.sample_rate_hz)?;
    for signature in &config.fault_overrides {
        generator = generator.with_signature(signature.clone())?;
    }
    Ok(generator)
}

/// Every regime, every replicate, in regime order.
pub fn generate_all_runs(config: &GenerationConfig) -> TelemetryResult<Vec<Run>> {
    let generator = build_generator(config)?;
    let mut runs = Vec::new();
    for regime in Regime::ALL {
        runs.extend(generator.generate_runs(regime, config.replicates_for(regime))?);
    }
    Ok(runs)
}

#[derive(Debug, Clone)]
pub struct GenerationSummary {
    pub session_id: String,
    pub files:      Vec<PathBuf>,
}

/// Generate all runs and write one CSV per run into the data directory.
pub fn generate_dataset(
    config: &PipelineConfig,
    store: Option<&PipelineStore>,
) -> TelemetryResult<GenerationSummary> {
    config.validate()?;
    let session_id = new_session_id();
    if let Some(store) = store {
        store.insert_session(&session_id, "generate", config.generation.seed, &serde_json::to_string(config)?)?;
    }

    let runs = generate_all_runs(&config.generation)?;
    let mut files = Vec::with_capacity(runs.len());
    for run in &runs {
        let path = write_run_csv(&config.paths.data_dir, run)?;
        if let Some(store) = store {
            store.record_generated_run(&session_id, run, &path)?;
        }
        files.push(path);
    }

    log::info!(
        "saved {} synthetic runs to {}",
        files.len(),
        config.paths.data_dir.display()
    );
    Ok(GenerationSummary { session_id, files })
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub classifier:      &'static str,
    pub classes:         Vec<Regime>,
    pub train_rows:      usize,
    pub validation_rows: usize,
    pub report:          ClassificationReport,
    pub health:          HealthSeries,
    pub summaries:       Vec<RunHealthSummary>,
}

/// Stages 3–7 against any classifier.
pub fn evaluate<C: Classifier>(
    classifier: &mut C,
    features: &FeatureTable,
    config: &PipelineConfig,
) -> TelemetryResult<Evaluation> {
    let labels = features
        .labels
        .as_ref()
        .ok_or_else(|| TelemetryError::invalid("labels", "training needs a labeled feature table"))?;

    let split = stratified_split(labels, config.split.validation_fraction, config.split.seed)?;
    log::info!("split: {} train rows, {} validation rows", split.train.len(), split.validation.len());

    classifier.fit(&select(&features.rows, &split.train), &select(labels, &split.train))?;

    let predicted = classifier.predict(&select(&features.rows, &split.validation))?;
    let report = classification_report(&select(labels, &split.validation), &predicted)?;
    log::info!("validation accuracy {:.4} ({})", report.accuracy, classifier.name());

    let probabilities = classifier.predict_probabilities(&features.rows)?;
    let health = health_series(features, &probabilities, &config.health)?;
    let summaries = health.summarize(config.health.alarm_threshold);

    Ok(Evaluation {
        classifier: classifier.name(),
        classes: classifier.classes().to_vec(),
        train_rows: split.train.len(),
        validation_rows: split.validation.len(),
        report,
        health,
        summaries,
    })
}

#[derive(Debug, Clone)]
pub struct PipelineReport {
    pub session_id: String,
    pub evaluation: Evaluation,
    pub health_csv: PathBuf,
    pub figures:    Vec<PathBuf>,
}

/// The full train, evaluate, health-index and plot pipeline.
pub fn train_and_evaluate(
    config: &PipelineConfig,
    store: Option<&PipelineStore>,
) -> TelemetryResult<PipelineReport> {
    config.validate()?;
    let session_id = new_session_id();

    let table = load_runs(&config.paths.data_dir)?;
    let features = extract_features(&table, config.features.window)?;

    let mut forest = RandomForest::new(config.forest.clone());
    let evaluation = evaluate(&mut forest, &features, config)?;

    let health_csv = config.paths.data_dir.join(HEALTH_INDEX_FILE);
    write_health_csv(&health_csv, &evaluation.health)?;

    let figures = vec![
        config.paths.figures_dir.join("health_index.svg"),
        config.paths.figures_dir.join("time_series_Pc.svg"),
    ];
    plot_health_index(&figures[0], &evaluation.health, config.health.alarm_threshold)?;
    plot_channel_by_regime(&figures[1], &table, Channel::ChamberPressure)?;

    if let Some(store) = store {
        store.insert_session(&session_id, "train", config.forest.seed, &serde_json::to_string(config)?)?;
        store.record_report(&session_id, evaluation.classifier, &evaluation.report)?;
        store.record_run_health(&session_id, &evaluation.summaries)?;
    }

    Ok(PipelineReport { session_id, evaluation, health_csv, figures })
}
