//! Health index: the classifier's probability of the `normal` regime.
//!
//! The index is a projection of one probability column, not a new
//! estimate. Smoothing is opt-in and never crosses a run boundary.

use crate::{
    classifier::ProbabilityMatrix,
    config::HealthConfig,
    error::{TelemetryError, TelemetryResult},
    fault::Regime,
    features::FeatureTable,
    types::{RunId, Seconds},
};
use serde::{Deserialize, Serialize};

/// Rounding slack tolerated on averaged probabilities before clamping.
const PROBABILITY_SLACK: f64 = 1e-9;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSample {
    pub run_id:       RunId,
    pub time:         Seconds,
    pub health_index: f64,
    pub label:        Option<Regime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHealthSummary {
    pub run_id:      RunId,
    pub label:       Option<Regime>,
    pub samples:     usize,
    pub mean_health: f64,
    pub min_health:  f64,
    /// First time the index fell below the alarm threshold.
    pub first_alarm: Option<Seconds>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HealthSeries {
    pub samples: Vec<HealthSample>,
}

/// Extract the column of `class`, validating every value.
pub fn project_class(probabilities: &ProbabilityMatrix, class: Regime) -> TelemetryResult<Vec<f64>> {
    let col = probabilities
        .column_index(class)
        .ok_or_else(|| TelemetryError::LabelSetMismatch {
            expected: class.to_string(),
            classes:  probabilities.classes.iter().map(|c| c.to_string()).collect(),
        })?;

    probabilities
        .rows
        .iter()
        .enumerate()
        .map(|(row, values)| {
            let value = *values.get(col).ok_or(TelemetryError::InvalidProbability { row, value: f64::NAN })?;
            if !value.is_finite() || value < -PROBABILITY_SLACK || value > 1.0 + PROBABILITY_SLACK {
                return Err(TelemetryError::InvalidProbability { row, value });
            }
            Ok(value.clamp(0.0, 1.0))
        })
        .collect()
}

/// P(normal) per row.
pub fn project_normal(probabilities: &ProbabilityMatrix) -> TelemetryResult<Vec<f64>> {
    project_class(probabilities, Regime::Normal)
}

/// Trailing moving average over `window` samples, restarted at each run.
pub fn smooth(values: &[f64], run_ids: &[RunId], window: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let mut run_start = 0;
    for i in 0..values.len() {
        if i > 0 && run_ids[i] != run_ids[i - 1] {
            run_start = i;
        }
        let start = run_start.max((i + 1).saturating_sub(window));
        let span = &values[start..=i];
        out.push(span.iter().sum::<f64>() / span.len() as f64);
    }
    out
}

/// Health index for every feature row.
pub fn health_series(
    features: &FeatureTable,
    probabilities: &ProbabilityMatrix,
    config: &HealthConfig,
) -> TelemetryResult<HealthSeries> {
    if probabilities.len() != features.len() {
        return Err(TelemetryError::invalid(
            "probabilities",
            format!("{} probability rows for {} feature rows", probabilities.len(), features.len()),
        ));
    }
    let mut index = project_normal(probabilities)?;
    if let Some(window) = config.smoothing_window {
        if window == 0 {
            return Err(TelemetryError::invalid("smoothing_window", "must be at least 1 sample"));
        }
        index = smooth(&index, &features.run_ids, window);
    }

    let samples = index
        .into_iter()
        .enumerate()
        .map(|(i, health_index)| HealthSample {
            run_id: features.run_ids[i].clone(),
            time: features.time[i],
            health_index,
            label: features.labels.as_ref().map(|l| l[i]),
        })
        .collect();
    Ok(HealthSeries { samples })
}

impl HealthSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.health_index).collect()
    }

    pub fn for_run<'a>(&'a self, run_id: &'a str) -> impl Iterator<Item = &'a HealthSample> + 'a {
        self.samples.iter().filter(move |s| s.run_id == run_id)
    }

    /// Per-run mean, minimum and first alarm, in first-seen run order.
    pub fn summarize(&self, alarm_threshold: f64) -> Vec<RunHealthSummary> {
        let mut out: Vec<RunHealthSummary> = Vec::new();
        for s in &self.samples {
            let at = match out.iter().position(|r| r.run_id == s.run_id) {
                Some(at) => at,
                None => {
                    out.push(RunHealthSummary {
                        run_id:      s.run_id.clone(),
                        label:       s.label,
                        samples:     0,
                        mean_health: 0.0,
                        min_health:  f64::INFINITY,
                        first_alarm: None,
                    });
                    out.len() - 1
                }
            };
            let summary = &mut out[at];
            summary.samples += 1;
            summary.mean_health += s.health_index;
            summary.min_health = summary.min_health.min(s.health_index);
            if summary.first_alarm.is_none() && s.health_index < alarm_threshold {
                summary.first_alarm = Some(s.time);
            }
        }
        for r in &mut out {
            r.mean_health /= r.samples as f64;
        }
        out
    }
}
