//! Random forest: bootstrap-aggregated CART trees.
//!
//! Tree `k` grows from its own stream `SignalRng::new(seed, k)`, so the
//! forest is reproducible for a fixed seed and tree count.

use super::{
    check_training_set, check_width,
    tree::{DecisionTree, TreeParams},
    Classifier, ProbabilityMatrix,
};
use crate::{
    config::ForestConfig,
    error::{TelemetryError, TelemetryResult},
    fault::Regime,
    rng::SignalRng,
};
use std::collections::BTreeSet;

pub struct RandomForest {
    config:  ForestConfig,
    classes: Vec<Regime>,
    width:   usize,
    trees:   Vec<DecisionTree>,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self { config, classes: Vec::new(), width: 0, trees: Vec::new() }
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }

    fn tree_params(&self, width: usize) -> TreeParams {
        let max_features = self
            .config
            .max_features
            .unwrap_or_else(|| (width as f64).sqrt().floor() as usize)
            .clamp(1, width.max(1));
        TreeParams {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            max_features,
        }
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &'static str {
        "random_forest"
    }

    fn fit(&mut self, features: &[Vec<f64>], labels: &[Regime]) -> TelemetryResult<()> {
        self.config.validate()?;
        let width = check_training_set(features, labels)?;

        let classes: Vec<Regime> = labels.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let y: Vec<usize> = labels
            .iter()
            .map(|l| classes.iter().position(|c| c == l).unwrap_or_default())
            .collect();
        let params = self.tree_params(width);
        let n = features.len();

        let mut trees = Vec::with_capacity(self.config.n_estimators);
        for k in 0..self.config.n_estimators {
            let mut rng = SignalRng::new(self.config.seed, k as u64).with_name("forest");
            let samples: Vec<usize> = if self.config.bootstrap {
                (0..n).map(|_| rng.next_below(n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(DecisionTree::fit(features, &y, samples, classes.len(), params, &mut rng));
        }

        log::info!(
            "random forest: {} trees on {n} rows x {width} features, {} classes, max_features={}",
            trees.len(),
            classes.len(),
            params.max_features
        );

        self.classes = classes;
        self.width = width;
        self.trees = trees;
        Ok(())
    }

    fn classes(&self) -> &[Regime] {
        &self.classes
    }

    fn predict_probabilities(&self, features: &[Vec<f64>]) -> TelemetryResult<ProbabilityMatrix> {
        if self.trees.is_empty() {
            return Err(TelemetryError::NotFitted);
        }
        check_width(features, self.width)?;

        let n_trees = self.trees.len() as f64;
        let rows = features
            .iter()
            .map(|row| {
                let mut acc = vec![0.0; self.classes.len()];
                for tree in &self.trees {
                    for (a, p) in acc.iter_mut().zip(tree.predict_distribution(row)) {
                        *a += p;
                    }
                }
                acc.iter_mut().for_each(|a| *a /= n_trees);
                acc
            })
            .collect();

        Ok(ProbabilityMatrix { classes: self.classes.clone(), rows })
    }
}
