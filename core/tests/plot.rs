//! SVG figures: structure, legends, escaping.

use enginehealth_core::{
    fault::Regime,
    health::{HealthSample, HealthSeries},
    plot::{plot_channel_by_regime, plot_health_index, regime_color, Chart, Line},
    run::RunGenerator,
    table::TelemetryTable,
    types::Channel,
};
use std::collections::BTreeMap;
use tempfile::TempDir;

#[test]
fn chart_renders_one_polyline_per_line() {
    let chart = Chart {
        title:     "a < b & c".into(),
        x_label:   "x".into(),
        y_label:   "y".into(),
        y_range:   None,
        reference: Some((0.5, "limit".into())),
    };
    let lines = vec![
        Line { legend: Some("first".into()), color: "#000000", points: vec![(0.0, 0.0), (1.0, 1.0)] },
        Line { legend: None, color: "#111111", points: vec![(0.0, 1.0), (1.0, 0.0)] },
    ];
    let svg = chart.render(&lines);
    assert!(svg.starts_with("<svg"));
    assert!(svg.trim_end().ends_with("</svg>"));
    assert_eq!(svg.matches("<polyline").count(), 2);
    assert!(svg.contains("a &lt; b &amp; c"));
    assert!(svg.contains(">first<"));
    assert!(svg.contains(">limit<"));
    assert!(svg.contains("stroke-dasharray"));
}

#[test]
fn empty_chart_still_renders() {
    let chart = Chart {
        title:     "empty".into(),
        x_label:   "x".into(),
        y_label:   "y".into(),
        y_range:   None,
        reference: None,
    };
    let svg = chart.render(&[]);
    assert!(svg.contains("</svg>"));
    assert!(!svg.contains("NaN"));
}

#[test]
fn regimes_have_distinct_colors() {
    let mut colors: Vec<&str> = Regime::ALL.iter().map(|r| regime_color(Some(*r))).collect();
    colors.push(regime_color(None));
    let total = colors.len();
    colors.sort_unstable();
    colors.dedup();
    assert_eq!(colors.len(), total);
}

#[test]
fn figures_are_written_to_disk() {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("figures");
    let g = RunGenerator::new(3, 60.0, 1.0).unwrap();
    let runs = vec![g.generate_run(Regime::Normal, 0).unwrap(), g.generate_run(Regime::TempRise, 0).unwrap()];
    let table = TelemetryTable::from_runs(&runs);

    let channel_path = dir.join("time_series_Pc.svg");
    plot_channel_by_regime(&channel_path, &table, Channel::ChamberPressure).unwrap();
    let svg = std::fs::read_to_string(&channel_path).unwrap();
    assert_eq!(svg.matches("<polyline").count(), 2);
    assert!(svg.contains(">temp_rise<"));

    let series = HealthSeries {
        samples: (0..4)
            .map(|i| HealthSample {
                run_id:       if i < 2 { "normal_run_0".into() } else { "normal_run_1".into() },
                time:         (i % 2) as f64,
                health_index: 1.0,
                label:        Some(Regime::Normal),
            })
            .collect(),
    };
    let health_path = dir.join("health_index.svg");
    plot_health_index(&health_path, &series, 0.7).unwrap();
    let svg = std::fs::read_to_string(&health_path).unwrap();
    assert_eq!(svg.matches("<polyline").count(), 2);
    // One legend entry per regime, not per run.
    assert_eq!(svg.matches(">normal<").count(), 1);
    assert!(svg.contains("Threshold = 0.7"));
}

#[test]
fn short_label_column_plots_as_unlabelled() {
    let tmp = TempDir::new().unwrap();
    let columns: BTreeMap<Channel, Vec<f64>> =
        Channel::ALL.into_iter().map(|c| (c, vec![1.0, 2.0, 3.0])).collect();
    let table = TelemetryTable {
        run_ids: vec!["a".into(), "a".into(), "b".into()],
        time:    vec![0.0, 1.0, 0.0],
        columns,
        labels:  Some(vec![Regime::Normal]),
    };
    let path = tmp.path().join("time_series_Pc.svg");
    plot_channel_by_regime(&path, &table, Channel::ChamberPressure).unwrap();
    let svg = std::fs::read_to_string(&path).unwrap();
    assert_eq!(svg.matches("<polyline").count(), 2);
    assert!(svg.contains(">normal<"));
    assert!(svg.contains(">unlabelled<"));
}
