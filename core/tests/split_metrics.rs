//! Stratified split and the validation classification report.

use enginehealth_core::{
    error::TelemetryError,
    fault::Regime,
    metrics::classification_report,
    split::{select, stratified_split},
};
use std::collections::BTreeSet;

fn labels() -> Vec<Regime> {
    let mut y = vec![Regime::Normal; 100];
    y.extend(vec![Regime::PressureDecay; 50]);
    y.extend(vec![Regime::TempRise; 3]);
    y
}

#[test]
fn split_is_stratified_per_class() {
    let y = labels();
    let split = stratified_split(&y, 0.2, 42).unwrap();

    let count = |idx: &[usize], r: Regime| idx.iter().filter(|&&i| y[i] == r).count();
    assert_eq!(count(&split.validation, Regime::Normal), 20);
    assert_eq!(count(&split.validation, Regime::PressureDecay), 10);
    assert_eq!(count(&split.validation, Regime::TempRise), 1);
    assert_eq!(count(&split.train, Regime::TempRise), 2);
}

#[test]
fn split_partitions_every_row_once() {
    let y = labels();
    let split = stratified_split(&y, 0.3, 7).unwrap();
    let train: BTreeSet<usize> = split.train.iter().copied().collect();
    let validation: BTreeSet<usize> = split.validation.iter().copied().collect();
    assert!(train.is_disjoint(&validation));
    assert_eq!(train.len() + validation.len(), y.len());
    assert!(split.train.windows(2).all(|w| w[0] < w[1]), "train indices sorted");
}

#[test]
fn split_is_deterministic_per_seed() {
    let y = labels();
    assert_eq!(stratified_split(&y, 0.2, 1).unwrap(), stratified_split(&y, 0.2, 1).unwrap());
    assert_ne!(stratified_split(&y, 0.2, 1).unwrap(), stratified_split(&y, 0.2, 2).unwrap());
}

#[test]
fn singleton_class_stays_in_training() {
    let y = vec![Regime::Normal, Regime::Normal, Regime::Normal, Regime::FuelLeak];
    let split = stratified_split(&y, 0.5, 0).unwrap();
    assert!(split.train.contains(&3));
    assert!(!split.validation.contains(&3));
}

#[test]
fn fraction_outside_open_interval_is_rejected() {
    for f in [0.0, 1.0, -0.1, f64::NAN] {
        assert!(matches!(
            stratified_split(&labels(), f, 0),
            Err(TelemetryError::InvalidParameter { .. })
        ), "fraction {f}");
    }
}

#[test]
fn select_gathers_in_index_order() {
    assert_eq!(select(&["a", "b", "c", "d"], &[3, 0]), vec!["d", "a"]);
}

#[test]
fn report_matches_hand_computed_scores() {
    use Regime::*;
    let truth = [Normal, Normal, Normal, PressureDecay, PressureDecay];
    let pred = [Normal, Normal, PressureDecay, PressureDecay, PressureDecay];
    let report = classification_report(&truth, &pred).unwrap();

    assert_eq!(report.support, 5);
    assert!((report.accuracy - 0.8).abs() < 1e-12);
    assert_eq!(report.confusion, vec![vec![2, 1], vec![0, 2]]);

    let normal = &report.classes[0];
    assert_eq!(normal.label, Normal);
    assert_eq!(normal.precision, 1.0);
    assert!((normal.recall - 2.0 / 3.0).abs() < 1e-12);
    assert!((normal.f1 - 0.8).abs() < 1e-12);

    let decay = &report.classes[1];
    assert!((decay.precision - 2.0 / 3.0).abs() < 1e-12);
    assert_eq!(decay.recall, 1.0);
    assert_eq!(decay.support, 2);

    assert!((report.macro_avg.f1 - 0.8).abs() < 1e-12);
    assert!((report.weighted_avg.recall - 0.8).abs() < 1e-12);

    let text = report.to_string();
    assert!(text.contains("pressure_decay"));
    assert!(text.contains("accuracy"));
}

#[test]
fn report_rejects_length_mismatch_and_empty_input() {
    assert!(classification_report(&[Regime::Normal], &[]).is_err());
    assert!(classification_report(&[], &[]).is_err());
}
