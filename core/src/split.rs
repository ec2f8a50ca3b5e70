//! Stratified train/validation split.

use crate::{
    error::{TelemetryError, TelemetryResult},
    fault::Regime,
    rng::SignalRng,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train:      Vec<usize>,
    pub validation: Vec<usize>,
}

/// Hold out `validation_fraction` of every class. Each class with at
/// least two rows keeps one row on each side. Indices come back sorted.
pub fn stratified_split(labels: &[Regime], validation_fraction: f64, seed: u64) -> TelemetryResult<Split> {
    if !(validation_fraction > 0.0 && validation_fraction < 1.0) {
        return Err(TelemetryError::invalid(
            "validation_fraction",
            format!("must lie strictly between 0 and 1, got {validation_fraction}"),
        ));
    }

    let mut by_class: BTreeMap<Regime, Vec<usize>> = BTreeMap::new();
    for (i, label) in labels.iter().enumerate() {
        by_class.entry(*label).or_default().push(i);
    }

    let mut split = Split { train: Vec::new(), validation: Vec::new() };
    for (class, mut rows) in by_class {
        let n = rows.len();
        if n < 2 {
            log::warn!("class '{class}' has a single row; it goes to the training split only");
            split.train.extend(rows);
            continue;
        }
        let mut rng = SignalRng::new(seed, class.slot()).with_name("split");
        rng.shuffle(&mut rows);
        let n_val = ((n as f64 * validation_fraction).round() as usize).clamp(1, n - 1);
        split.validation.extend_from_slice(&rows[..n_val]);
        split.train.extend_from_slice(&rows[n_val..]);
    }
    split.train.sort_unstable();
    split.validation.sort_unstable();
    Ok(split)
}

/// Gather rows by index.
pub fn select<T: Clone>(items: &[T], indices: &[usize]) -> Vec<T> {
    indices.iter().map(|&i| items[i].clone()).collect()
}
