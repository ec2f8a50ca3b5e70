//! Random forest behaviour through the `Classifier` seam.

use enginehealth_core::{
    classifier::{
        tree::{DecisionTree, TreeParams},
        Classifier, RandomForest,
    },
    config::ForestConfig,
    error::TelemetryError,
    fault::Regime,
    rng::SignalRng,
};

/// Two Gaussian blobs in three dimensions, 50 rows each.
fn blobs(seed: u64) -> (Vec<Vec<f64>>, Vec<Regime>) {
    let mut rng = SignalRng::new(seed, 0);
    let mut x = Vec::new();
    let mut y = Vec::new();
    for (label, centre) in [(Regime::Normal, 0.0), (Regime::TempRise, 5.0)] {
        let noise = rng.gaussian_noise(0.5, 150).unwrap();
        for chunk in noise.chunks(3) {
            x.push(chunk.iter().map(|n| centre + n).collect());
            y.push(label);
        }
    }
    (x, y)
}

fn small_forest(seed: u64) -> RandomForest {
    RandomForest::new(ForestConfig { n_estimators: 15, seed, ..ForestConfig::default() })
}

#[test]
fn forest_separates_well_separated_classes() {
    let (x, y) = blobs(1);
    let mut forest = small_forest(7);
    forest.fit(&x, &y).unwrap();

    assert_eq!(forest.classes(), &[Regime::Normal, Regime::TempRise]);
    assert_eq!(forest.trees().len(), 15);

    let queries = vec![vec![0.1, -0.2, 0.0], vec![5.2, 4.9, 5.1]];
    assert_eq!(forest.predict(&queries).unwrap(), vec![Regime::Normal, Regime::TempRise]);

    let accuracy = forest.predict(&x).unwrap().iter().zip(&y).filter(|(p, t)| p == t).count();
    assert_eq!(accuracy, y.len());
}

#[test]
fn probability_rows_sum_to_one() {
    let (x, y) = blobs(2);
    let mut forest = small_forest(3);
    forest.fit(&x, &y).unwrap();
    let probs = forest.predict_probabilities(&x).unwrap();
    assert_eq!(probs.len(), x.len());
    for (i, row) in probs.rows.iter().enumerate() {
        assert_eq!(row.len(), 2);
        assert!(row.iter().all(|p| (0.0..=1.0).contains(p)), "row {i}: {row:?}");
        let sum: f64 = row.iter().sum();
        assert!((sum - 1.0).abs() < 1e-12, "row {i} sums to {sum}");
    }
}

#[test]
fn same_seed_same_probabilities() {
    let (x, y) = blobs(4);
    let mut a = small_forest(11);
    let mut b = small_forest(11);
    a.fit(&x, &y).unwrap();
    b.fit(&x, &y).unwrap();
    assert_eq!(a.predict_probabilities(&x).unwrap(), b.predict_probabilities(&x).unwrap());
}

#[test]
fn single_class_training_yields_certainty() {
    let (x, _) = blobs(5);
    let y = vec![Regime::Normal; x.len()];
    let mut forest = small_forest(1);
    forest.fit(&x, &y).unwrap();
    let probs = forest.predict_probabilities(&x[..4]).unwrap();
    assert_eq!(probs.classes, vec![Regime::Normal]);
    assert!(probs.rows.iter().all(|r| r == &vec![1.0]));
}

#[test]
fn predicting_before_fit_fails() {
    let forest = small_forest(1);
    assert!(matches!(forest.predict_probabilities(&[vec![0.0; 3]]), Err(TelemetryError::NotFitted)));
    assert!(forest.classes().is_empty());
}

#[test]
fn width_mismatch_is_rejected() {
    let (x, y) = blobs(6);
    let mut forest = small_forest(1);
    forest.fit(&x, &y).unwrap();
    assert!(matches!(
        forest.predict_probabilities(&[vec![0.0; 2]]),
        Err(TelemetryError::InvalidParameter { .. })
    ));
}

#[test]
fn mismatched_labels_are_rejected() {
    let (x, mut y) = blobs(7);
    y.pop();
    assert!(small_forest(1).fit(&x, &y).is_err());
    assert!(small_forest(1).fit(&[], &[]).is_err());
}

#[test]
fn invalid_forest_config_is_rejected_at_fit() {
    let (x, y) = blobs(8);
    let mut forest = RandomForest::new(ForestConfig { n_estimators: 0, ..ForestConfig::default() });
    assert!(matches!(forest.fit(&x, &y), Err(TelemetryError::InvalidParameter { .. })));
}

#[test]
fn full_depth_tree_fits_distinct_rows_exactly() {
    let (x, y) = blobs(9);
    let classes: Vec<usize> = y.iter().map(|r| usize::from(*r != Regime::Normal)).collect();
    let params = TreeParams { max_depth: None, min_samples_split: 2, max_features: 3 };
    let mut rng = SignalRng::new(0, 0);
    let tree = DecisionTree::fit(&x, &classes, (0..x.len()).collect(), 2, params, &mut rng);
    for (row, &c) in x.iter().zip(&classes) {
        let dist = tree.predict_distribution(row);
        assert_eq!(dist[c], 1.0);
    }
}

#[test]
fn depth_limit_is_respected() {
    let (x, y) = blobs(10);
    let classes: Vec<usize> = y.iter().map(|r| usize::from(*r != Regime::Normal)).collect();
    let params = TreeParams { max_depth: Some(1), min_samples_split: 2, max_features: 1 };
    let mut rng = SignalRng::new(0, 0);
    let tree = DecisionTree::fit(&x, &classes, (0..x.len()).collect(), 2, params, &mut rng);
    assert!(tree.depth() <= 1);
    assert!(tree.node_count() <= 3);
}
