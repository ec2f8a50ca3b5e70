//! Classifier seam.
//!
//! RULE: the pipeline depends only on the `Classifier` trait. Any model
//! that fits on labeled feature rows and returns per-class probabilities
//! (rows summing to 1, columns = classes seen during fit) can stand in.

pub mod forest;
pub mod tree;

use crate::{
    error::{TelemetryError, TelemetryResult},
    fault::Regime,
};

pub use forest::RandomForest;

/// Per-class probabilities, one row per feature row.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityMatrix {
    pub classes: Vec<Regime>,
    pub rows:    Vec<Vec<f64>>,
}

impl ProbabilityMatrix {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, class: Regime) -> Option<usize> {
        self.classes.iter().position(|c| *c == class)
    }

    /// Most probable class per row; ties go to the earlier class.
    pub fn argmax(&self) -> Vec<Regime> {
        self.rows
            .iter()
            .map(|row| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold(0, |best, (i, &p)| if p > row[best] { i } else { best });
                self.classes[best]
            })
            .collect()
    }
}

pub trait Classifier {
    /// Stable name for logs and the run registry.
    fn name(&self) -> &'static str;

    fn fit(&mut self, features: &[Vec<f64>], labels: &[Regime]) -> TelemetryResult<()>;

    /// Classes seen during fit, in column order. Empty before fit.
    fn classes(&self) -> &[Regime];

    fn predict_probabilities(&self, features: &[Vec<f64>]) -> TelemetryResult<ProbabilityMatrix>;

    fn predict(&self, features: &[Vec<f64>]) -> TelemetryResult<Vec<Regime>> {
        Ok(self.predict_probabilities(features)?.argmax())
    }
}

/// Shape checks shared by classifier implementations.
pub fn check_training_set(features: &[Vec<f64>], labels: &[Regime]) -> TelemetryResult<usize> {
    if features.is_empty() {
        return Err(TelemetryError::invalid("features", "training set is empty"));
    }
    if features.len() != labels.len() {
        return Err(TelemetryError::invalid(
            "labels",
            format!("{} labels for {} feature rows", labels.len(), features.len()),
        ));
    }
    check_width(features, features[0].len())
}

/// Every row must have `width` columns. Returns the width.
pub fn check_width(features: &[Vec<f64>], width: usize) -> TelemetryResult<usize> {
    if let Some((i, row)) = features.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(TelemetryError::invalid(
            "features",
            format!("row {i} has {} columns, expected {width}", row.len()),
        ));
    }
    Ok(width)
}
