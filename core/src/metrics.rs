//! Classification report: per-class precision, recall, F1 and support.

use crate::{
    error::{TelemetryError, TelemetryResult},
    fault::Regime,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeSet, fmt};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label:     Regime,
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
    pub support:   usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Averages {
    pub precision: f64,
    pub recall:    f64,
    pub f1:        f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    pub classes:      Vec<ClassMetrics>,
    pub accuracy:     f64,
    pub macro_avg:    Averages,
    pub weighted_avg: Averages,
    /// confusion[truth][predicted], indexed like `classes`.
    pub confusion:    Vec<Vec<usize>>,
    pub support:      usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}

pub fn classification_report(truth: &[Regime], predicted: &[Regime]) -> TelemetryResult<ClassificationReport> {
    if truth.len() != predicted.len() {
        return Err(TelemetryError::invalid(
            "predicted",
            format!("{} predictions for {} labels", predicted.len(), truth.len()),
        ));
    }
    if truth.is_empty() {
        return Err(TelemetryError::invalid("truth", "cannot score an empty validation set"));
    }

    let labels: Vec<Regime> = truth.iter().chain(predicted).copied().collect::<BTreeSet<_>>().into_iter().collect();
    let at = |r: &Regime| labels.iter().position(|l| l == r).unwrap_or_default();

    let k = labels.len();
    let mut confusion = vec![vec![0usize; k]; k];
    for (t, p) in truth.iter().zip(predicted) {
        confusion[at(t)][at(p)] += 1;
    }

    let classes: Vec<ClassMetrics> = labels
        .iter()
        .enumerate()
        .map(|(i, &label)| {
            let tp = confusion[i][i];
            let support: usize = confusion[i].iter().sum();
            let predicted_as: usize = confusion.iter().map(|row| row[i]).sum();
            let precision = ratio(tp, predicted_as);
            let recall = ratio(tp, support);
            let f1 = if precision + recall > 0.0 {
                2.0 * precision * recall / (precision + recall)
            } else {
                0.0
            };
            ClassMetrics { label, precision, recall, f1, support }
        })
        .collect();

    let total = truth.len();
    let correct: usize = (0..k).map(|i| confusion[i][i]).sum();
    let macro_avg = Averages {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / k as f64,
        recall:    classes.iter().map(|c| c.recall).sum::<f64>() / k as f64,
        f1:        classes.iter().map(|c| c.f1).sum::<f64>() / k as f64,
    };
    let weight = |f: fn(&ClassMetrics) -> f64| {
        classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / total as f64
    };
    let weighted_avg = Averages {
        precision: weight(|c| c.precision),
        recall:    weight(|c| c.recall),
        f1:        weight(|c| c.f1),
    };

    Ok(ClassificationReport {
        accuracy: ratio(correct, total),
        classes,
        macro_avg,
        weighted_avg,
        confusion,
        support: total,
    })
}

impl fmt::Display for ClassificationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:>22} {:>9} {:>9} {:>9} {:>9}", "", "precision", "recall", "f1-score", "support")?;
        writeln!(f)?;
        for c in &self.classes {
            writeln!(
                f,
                "{:>22} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                c.label.as_str(), c.precision, c.recall, c.f1, c.support
            )?;
        }
        writeln!(f)?;
        writeln!(f, "{:>22} {:>9} {:>9} {:>9.2} {:>9}", "accuracy", "", "", self.accuracy, self.support)?;
        for (name, avg) in [("macro avg", &self.macro_avg), ("weighted avg", &self.weighted_avg)] {
            writeln!(
                f,
                "{:>22} {:>9.2} {:>9.2} {:>9.2} {:>9}",
                name, avg.precision, avg.recall, avg.f1, self.support
            )?;
        }
        Ok(())
    }
}
