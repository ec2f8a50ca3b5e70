//! Rolling-window features: exact trailing statistics, shrinking
//! windows at run starts, no leakage across runs, malformed tables.

use enginehealth_core::{
    error::TelemetryError,
    fault::Regime,
    features::{extract_features, feature_index, feature_names, mean_std, Statistic, DEFAULT_WINDOW},
    run::RunGenerator,
    table::TelemetryTable,
    types::Channel,
};
use std::collections::BTreeMap;

/// Two short runs. Every channel carries `offset + row` so values are
/// easy to reason about; run "b" starts at 100.
fn two_run_table() -> TelemetryTable {
    let mut run_ids = Vec::new();
    let mut time = Vec::new();
    let mut values = Vec::new();
    for (id, len, offset) in [("a", 5usize, 0.0), ("b", 4usize, 100.0)] {
        for k in 0..len {
            run_ids.push(id.to_string());
            time.push(k as f64);
            values.push(offset + k as f64);
        }
    }
    let columns: BTreeMap<Channel, Vec<f64>> = Channel::ALL.into_iter().map(|c| (c, values.clone())).collect();
    TelemetryTable {
        run_ids,
        time,
        columns,
        labels: Some(vec![Regime::Normal; 5].into_iter().chain(vec![Regime::TempRise; 4]).collect()),
    }
}

fn expect_malformed(table: &TelemetryTable) -> (String, usize) {
    match extract_features(table, 3) {
        Err(TelemetryError::MalformedInputTable { run_id, row, .. }) => (run_id, row),
        other => panic!("expected MalformedInputTable, got {other:?}"),
    }
}

#[test]
fn names_follow_channel_order() {
    let names = feature_names();
    assert_eq!(names.len(), 14);
    assert_eq!(names[0], "Pc_mean");
    assert_eq!(names[1], "Pc_std");
    assert_eq!(names[13], "thrust_std");
    assert_eq!(names[feature_index(Channel::Vibration, Statistic::Std)], "Vib_std");
}

#[test]
fn one_row_per_input_row() {
    let table = two_run_table();
    let features = extract_features(&table, 3).unwrap();
    assert_eq!(features.len(), 9);
    assert_eq!(features.run_ids, table.run_ids);
    assert_eq!(features.time, table.time);
    assert_eq!(features.labels, table.labels);
}

#[test]
fn window_shrinks_at_run_start() {
    let features = extract_features(&two_run_table(), 3).unwrap();
    let c = Channel::ChamberPressure;

    // First row: its own value, std 0.
    assert_eq!(features.value(0, c, Statistic::Mean), 0.0);
    assert_eq!(features.value(0, c, Statistic::Std), 0.0);
    // Second row: mean of {0, 1}, sample std sqrt(0.5).
    assert_eq!(features.value(1, c, Statistic::Mean), 0.5);
    assert!((features.value(1, c, Statistic::Std) - 0.5f64.sqrt()).abs() < 1e-12);
    // Full window from k = 2: {2, 3, 4} at row 4.
    assert_eq!(features.value(4, c, Statistic::Mean), 3.0);
    assert!((features.value(4, c, Statistic::Std) - 1.0).abs() < 1e-12);
}

#[test]
fn windows_never_cross_run_boundaries() {
    let features = extract_features(&two_run_table(), 3).unwrap();
    let c = Channel::BearingTemp;
    // Row 5 is the first row of run "b".
    assert_eq!(features.value(5, c, Statistic::Mean), 100.0);
    assert_eq!(features.value(5, c, Statistic::Std), 0.0);
    assert_eq!(features.value(6, c, Statistic::Mean), 100.5);
}

#[test]
fn trailing_mean_is_exact_on_generated_runs() {
    let runs = RunGenerator::new(42, 300.0, 1.0).unwrap().generate_runs(Regime::FuelLeak, 2).unwrap();
    let table = TelemetryTable::from_runs(&runs);
    let features = extract_features(&table, DEFAULT_WINDOW).unwrap();
    let w = DEFAULT_WINDOW;

    for (r, run) in runs.iter().enumerate() {
        let values = run.channel(Channel::FuelFlow);
        for k in w - 1..values.len() {
            let slice = &values[k + 1 - w..=k];
            let expected = slice.iter().sum::<f64>() / w as f64;
            let got = features.value(r * 300 + k, Channel::FuelFlow, Statistic::Mean);
            assert!((got - expected).abs() <= 1e-12 * expected.abs(), "run {r} k {k}: {got} vs {expected}");

            let (_, std) = mean_std(slice);
            assert_eq!(features.value(r * 300 + k, Channel::FuelFlow, Statistic::Std), std);
        }
    }
}

#[test]
fn window_of_one_reproduces_the_signal() {
    let table = two_run_table();
    let features = extract_features(&table, 1).unwrap();
    for i in 0..table.len() {
        assert_eq!(features.value(i, Channel::Thrust, Statistic::Mean), table.columns[&Channel::Thrust][i]);
        assert_eq!(features.value(i, Channel::Thrust, Statistic::Std), 0.0);
    }
}

#[test]
fn zero_window_is_invalid() {
    match extract_features(&two_run_table(), 0) {
        Err(TelemetryError::InvalidParameter { name, .. }) => assert_eq!(name, "window"),
        other => panic!("expected InvalidParameter, got {other:?}"),
    }
}

#[test]
fn sample_std_uses_one_degree_of_freedom() {
    let (mean, std) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    assert_eq!(mean, 5.0);
    assert!((std - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    assert_eq!(mean_std(&[3.5]), (3.5, 0.0));
}

#[test]
fn missing_channel_is_malformed() {
    let mut table = two_run_table();
    table.columns.remove(&Channel::InletTemp);
    let (run_id, row) = expect_malformed(&table);
    assert_eq!(run_id, "a");
    assert_eq!(row, 0);
}

#[test]
fn timestamp_gap_is_reported_with_row() {
    let mut table = two_run_table();
    table.time[7] = 3.0; // run "b" rows: 0, 1, 3, 3
    let (run_id, row) = expect_malformed(&table);
    assert_eq!(run_id, "b");
    assert_eq!(row, 7);
}

#[test]
fn run_not_starting_at_zero_is_malformed() {
    let mut table = two_run_table();
    for t in &mut table.time[5..] {
        *t += 1.0;
    }
    assert_eq!(expect_malformed(&table), ("b".to_string(), 5));
}

#[test]
fn interleaved_runs_are_malformed() {
    let mut table = two_run_table();
    table.run_ids[8] = "a".to_string();
    let (run_id, row) = expect_malformed(&table);
    assert_eq!(run_id, "a");
    assert_eq!(row, 8);
}

#[test]
fn non_finite_value_is_malformed() {
    let mut table = two_run_table();
    table.columns.get_mut(&Channel::Vibration).unwrap()[2] = f64::NAN;
    assert_eq!(expect_malformed(&table), ("a".to_string(), 2));
}

#[test]
fn label_change_inside_run_is_malformed() {
    let mut table = two_run_table();
    table.labels.as_mut().unwrap()[3] = Regime::FuelLeak;
    assert_eq!(expect_malformed(&table), ("a".to_string(), 3));
}

#[test]
fn unlabeled_tables_are_accepted() {
    let mut table = two_run_table();
    table.labels = None;
    let features = extract_features(&table, 3).unwrap();
    assert!(features.labels.is_none());
}
