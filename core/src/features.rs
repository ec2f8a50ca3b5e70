//! Rolling-window feature extraction.
//!
//! Each row gets the mean and sample standard deviation of the trailing
//! `window` samples of every channel, computed within its own run only.
//! The first `window - 1` rows of a run use the samples available so far
//! (shrinking window), so every input row yields exactly one output row.

use crate::{
    error::{TelemetryError, TelemetryResult},
    fault::Regime,
    table::TelemetryTable,
    types::{Channel, RunId, Seconds},
};
use std::{collections::BTreeSet, ops::Range};

pub const DEFAULT_WINDOW: usize = 10;

const TIME_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statistic {
    Mean,
    Std,
}

impl Statistic {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Std  => "std",
        }
    }
}

/// Column position of (channel, statistic) in a feature row.
pub fn feature_index(channel: Channel, stat: Statistic) -> usize {
    channel.index() * 2 + matches!(stat, Statistic::Std) as usize
}

/// `<channel>_mean`, `<channel>_std` for every channel, in channel order.
pub fn feature_names() -> Vec<String> {
    Channel::ALL
        .iter()
        .flat_map(|c| {
            [Statistic::Mean, Statistic::Std]
                .into_iter()
                .map(move |s| format!("{}_{}", c.name(), s.suffix()))
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    pub names:   Vec<String>,
    pub rows:    Vec<Vec<f64>>,
    pub run_ids: Vec<RunId>,
    pub time:    Vec<Seconds>,
    pub labels:  Option<Vec<Regime>>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value(&self, row: usize, channel: Channel, stat: Statistic) -> f64 {
        self.rows[row][feature_index(channel, stat)]
    }
}

/// Extract rolling features from a validated telemetry table.
pub fn extract_features(table: &TelemetryTable, window: usize) -> TelemetryResult<FeatureTable> {
    if window == 0 {
        return Err(TelemetryError::invalid("window", "rolling window must be at least 1 sample"));
    }
    let segments = validate_table(table)?;

    let n = table.len();
    let mut rows = vec![vec![0.0; Channel::ALL.len() * 2]; n];

    for (run_id, range) in &segments {
        for channel in Channel::ALL {
            let Some(column) = table.column(channel) else {
                return Err(TelemetryError::malformed(run_id, range.start, format!("missing channel column '{channel}'")));
            };
            let values = &column[range.clone()];
            for k in 0..values.len() {
                let start = (k + 1).saturating_sub(window);
                let (mean, std) = mean_std(&values[start..=k]);
                let row = &mut rows[range.start + k];
                row[feature_index(channel, Statistic::Mean)] = mean;
                row[feature_index(channel, Statistic::Std)] = std;
            }
        }
        log::debug!("features: {run_id} rows {}..{} window={window}", range.start, range.end);
    }

    log::info!("extracted {} feature rows from {} runs (window={window})", n, segments.len());

    Ok(FeatureTable {
        names: feature_names(),
        rows,
        run_ids: table.run_ids.clone(),
        time: table.time.clone(),
        labels: table.labels.clone(),
    })
}

/// Arithmetic mean and sample standard deviation (ddof = 1).
/// A single sample has standard deviation 0.
pub fn mean_std(values: &[f64]) -> (f64, f64) {
    let len = values.len() as f64;
    let mean = values.iter().sum::<f64>() / len;
    if values.len() < 2 {
        return (mean, 0.0);
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (len - 1.0);
    (mean, var.sqrt())
}

/// Check shape, contiguity and timestamps before any windowing.
/// Offending rows are reported as table row indices.
fn validate_table(table: &TelemetryTable) -> TelemetryResult<Vec<(RunId, Range<usize>)>> {
    let n = table.len();
    let first_run = table.run_ids.first().cloned().unwrap_or_default();

    if table.run_ids.len() != n {
        return Err(TelemetryError::malformed(
            first_run,
            table.run_ids.len().min(n),
            format!("{} run ids for {n} timestamps", table.run_ids.len()),
        ));
    }
    for channel in Channel::ALL {
        match table.column(channel) {
            None => {
                return Err(TelemetryError::malformed(first_run, 0, format!("missing channel column '{channel}'")));
            }
            Some(col) if col.len() != n => {
                return Err(TelemetryError::malformed(
                    first_run,
                    col.len().min(n),
                    format!("channel column '{channel}' has {} rows, expected {n}", col.len()),
                ));
            }
            Some(_) => {}
        }
    }
    if let Some(labels) = &table.labels {
        if labels.len() != n {
            return Err(TelemetryError::malformed(
                first_run,
                labels.len().min(n),
                format!("{} labels for {n} rows", labels.len()),
            ));
        }
    }

    let segments = table.run_segments();
    let mut seen = BTreeSet::new();
    for (run_id, range) in &segments {
        if !seen.insert(run_id.as_str()) {
            return Err(TelemetryError::malformed(run_id, range.start, "rows of this run are not contiguous"));
        }
        validate_timestamps(run_id, &table.time, range.clone())?;

        for channel in Channel::ALL {
            let col = &table.columns[&channel];
            if let Some(i) = range.clone().find(|&i| !col[i].is_finite()) {
                return Err(TelemetryError::malformed(run_id, i, format!("non-finite '{channel}' value")));
            }
        }
        if let Some(labels) = &table.labels {
            let first = labels[range.start];
            if let Some(i) = range.clone().find(|&i| labels[i] != first) {
                return Err(TelemetryError::malformed(
                    run_id,
                    i,
                    format!("label changes mid-run from '{first}' to '{}'", labels[i]),
                ));
            }
        }
    }
    Ok(segments)
}

fn validate_timestamps(run_id: &str, time: &[Seconds], range: Range<usize>) -> TelemetryResult<()> {
    let start = range.start;
    if time[start] != 0.0 {
        return Err(TelemetryError::malformed(run_id, start, format!("run starts at t={} instead of 0", time[start])));
    }
    if range.len() < 2 {
        return Ok(());
    }
    let step = time[start + 1] - time[start];
    if !step.is_finite() || step <= 0.0 {
        return Err(TelemetryError::malformed(run_id, start + 1, format!("non-monotonic timestamp t={}", time[start + 1])));
    }
    for i in start + 1..range.end {
        let dt = time[i] - time[i - 1];
        if !dt.is_finite() || dt <= 0.0 {
            return Err(TelemetryError::malformed(run_id, i, format!("non-monotonic timestamp t={}", time[i])));
        }
        if (dt - step).abs() > TIME_TOLERANCE * time[i].abs().max(1.0) {
            return Err(TelemetryError::malformed(
                run_id,
                i,
                format!("gap in timestamps: step {dt} after t={}, expected {step}", time[i - 1]),
            ));
        }
    }
    Ok(())
}
