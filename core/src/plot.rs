//! SVG line charts for the health index and raw channels.

use crate::{
    error::{TelemetryError, TelemetryResult},
    fault::Regime,
    health::HealthSeries,
    persist::write_atomically,
    table::TelemetryTable,
    types::Channel,
};
use std::path::Path;

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 60.0;
const LEGEND_WIDTH: f64 = 190.0;

pub fn regime_color(regime: Option<Regime>) -> &'static str {
    match regime {
        None                             => "#555555",
        Some(Regime::Normal)             => "#1f77b4",
        Some(Regime::PressureDecay)      => "#ff7f0e",
        Some(Regime::TurbopumpOverspeed) => "#2ca02c",
        Some(Regime::TempRise)           => "#d62728",
        Some(Regime::VibrationIncrease)  => "#9467bd",
        Some(Regime::FuelLeak)           => "#8c564b",
        Some(Regime::BearingOverheat)    => "#e377c2",
    }
}

pub struct Line {
    pub legend: Option<String>,
    pub color:  &'static str,
    pub points: Vec<(f64, f64)>,
}

pub struct Chart {
    pub title:     String,
    pub x_label:   String,
    pub y_label:   String,
    /// Fixed y range; None fits the data.
    pub y_range:   Option<(f64, f64)>,
    /// Dashed horizontal reference line with its legend text.
    pub reference: Option<(f64, String)>,
}

impl Chart {
    pub fn render(&self, lines: &[Line]) -> String {
        let all = lines.iter().flat_map(|l| l.points.iter());
        let (mut x_min, mut x_max, mut y_min, mut y_max) =
            (f64::INFINITY, f64::NEG_INFINITY, f64::INFINITY, f64::NEG_INFINITY);
        for &(x, y) in all {
            x_min = x_min.min(x);
            x_max = x_max.max(x);
            y_min = y_min.min(y);
            y_max = y_max.max(y);
        }
        if let Some((lo, hi)) = self.y_range {
            (y_min, y_max) = (lo, hi);
        }
        if !x_min.is_finite() {
            (x_min, x_max) = (0.0, 1.0);
        }
        if !y_min.is_finite() {
            (y_min, y_max) = (0.0, 1.0);
        }
        if x_max <= x_min {
            x_max = x_min + 1.0;
        }
        if y_max <= y_min {
            y_max = y_min + 1.0;
        }

        let plot_w = WIDTH - 2.0 * MARGIN - LEGEND_WIDTH;
        let plot_h = HEIGHT - 2.0 * MARGIN;
        let sx = |x: f64| MARGIN + (x - x_min) / (x_max - x_min) * plot_w;
        let sy = |y: f64| HEIGHT - MARGIN - (y - y_min) / (y_max - y_min) * plot_h;

        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{WIDTH}\" height=\"{HEIGHT}\" font-family=\"sans-serif\" font-size=\"12\">\n\
             <rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n\
             <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"15\">{}</text>\n",
            MARGIN + plot_w / 2.0,
            MARGIN / 2.0,
            escape(&self.title)
        );

        // Grid and tick labels.
        for k in 0..=5 {
            let f = k as f64 / 5.0;
            let (gx, gy) = (MARGIN + f * plot_w, HEIGHT - MARGIN - f * plot_h);
            svg.push_str(&format!(
                "<line x1=\"{gx:.1}\" y1=\"{:.1}\" x2=\"{gx:.1}\" y2=\"{:.1}\" stroke=\"#dddddd\"/>\n\
                 <line x1=\"{MARGIN:.1}\" y1=\"{gy:.1}\" x2=\"{:.1}\" y2=\"{gy:.1}\" stroke=\"#dddddd\"/>\n\
                 <text x=\"{gx:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>\n\
                 <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>\n",
                MARGIN,
                HEIGHT - MARGIN,
                MARGIN + plot_w,
                HEIGHT - MARGIN + 16.0,
                tick(x_min + f * (x_max - x_min)),
                MARGIN - 6.0,
                gy + 4.0,
                tick(y_min + f * (y_max - y_min)),
            ));
        }
        svg.push_str(&format!(
            "<rect x=\"{MARGIN}\" y=\"{MARGIN}\" width=\"{plot_w:.1}\" height=\"{plot_h:.1}\" fill=\"none\" stroke=\"black\"/>\n\
             <text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">{}</text>\n\
             <text x=\"16\" y=\"{:.1}\" text-anchor=\"middle\" transform=\"rotate(-90 16 {:.1})\">{}</text>\n",
            MARGIN + plot_w / 2.0,
            HEIGHT - 14.0,
            escape(&self.x_label),
            MARGIN + plot_h / 2.0,
            MARGIN + plot_h / 2.0,
            escape(&self.y_label),
        ));

        for line in lines {
            let pts: Vec<String> = line
                .points
                .iter()
                .map(|&(x, y)| format!("{:.1},{:.1}", sx(x), sy(y)))
                .collect();
            svg.push_str(&format!(
                "<polyline fill=\"none\" stroke=\"{}\" stroke-width=\"1.2\" points=\"{}\"/>\n",
                line.color,
                pts.join(" ")
            ));
        }

        let mut legend: Vec<(String, &str, bool)> = lines
            .iter()
            .filter_map(|l| l.legend.clone().map(|t| (t, l.color, false)))
            .collect();
        if let Some((y, text)) = &self.reference {
            let y = sy(*y);
            svg.push_str(&format!(
                "<line x1=\"{MARGIN}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\" stroke=\"red\" stroke-dasharray=\"6,4\"/>\n",
                MARGIN + plot_w
            ));
            legend.push((text.clone(), "red", true));
        }
        for (i, (text, color, dashed)) in legend.iter().enumerate() {
            let lx = WIDTH - LEGEND_WIDTH - MARGIN / 2.0 + 10.0;
            let ly = MARGIN + 10.0 + i as f64 * 18.0;
            let dash = if *dashed { " stroke-dasharray=\"6,4\"" } else { "" };
            svg.push_str(&format!(
                "<line x1=\"{lx:.1}\" y1=\"{ly:.1}\" x2=\"{:.1}\" y2=\"{ly:.1}\" stroke=\"{color}\" stroke-width=\"2\"{dash}/>\n\
                 <text x=\"{:.1}\" y=\"{:.1}\">{}</text>\n",
                lx + 24.0,
                lx + 30.0,
                ly + 4.0,
                escape(text)
            ));
        }
        svg.push_str("</svg>\n");
        svg
    }
}

fn tick(v: f64) -> String {
    if v.abs() >= 100.0 { format!("{v:.0}") } else { format!("{v:.2}") }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn write_svg(path: &Path, svg: &str) -> TelemetryResult<()> {
    write_atomically(path, |tmp| Ok(std::fs::write(tmp, svg)?))?;
    log::info!("saved figure {}", path.display());
    Ok(())
}

/// One line per run, coloured by regime, with the alarm threshold.
pub fn plot_health_index(path: &Path, series: &HealthSeries, threshold: f64) -> TelemetryResult<()> {
    let mut lines: Vec<Line> = Vec::new();
    let mut legend_seen: Vec<Option<Regime>> = Vec::new();
    let mut current: Option<&str> = None;
    for s in &series.samples {
        if current != Some(s.run_id.as_str()) {
            current = Some(s.run_id.as_str());
            let legend = (!legend_seen.contains(&s.label)).then(|| {
                legend_seen.push(s.label);
                s.label.map(|l| l.to_string()).unwrap_or_else(|| "unlabelled".into())
            });
            lines.push(Line { legend, color: regime_color(s.label), points: Vec::new() });
        }
        if let Some(line) = lines.last_mut() {
            line.points.push((s.time, s.health_index));
        }
    }
    let chart = Chart {
        title:     "Engine health index over time".into(),
        x_label:   "Time, s".into(),
        y_label:   "Health index P(normal)".into(),
        y_range:   Some((0.0, 1.0)),
        reference: Some((threshold, format!("Threshold = {threshold}"))),
    };
    write_svg(path, &chart.render(&lines))
}

/// One line per run of a single channel, coloured by regime.
pub fn plot_channel_by_regime(path: &Path, table: &TelemetryTable, channel: Channel) -> TelemetryResult<()> {
    let values = table.column(channel).ok_or_else(|| {
        TelemetryError::invalid("channel", format!("table has no '{channel}' column"))
    })?;
    let mut legend_seen: Vec<Option<Regime>> = Vec::new();
    let lines: Vec<Line> = table
        .run_segments()
        .into_iter()
        .map(|(_, range)| {
            let label = table.labels.as_ref().and_then(|l| l.get(range.start).copied());
            let legend = (!legend_seen.contains(&label)).then(|| {
                legend_seen.push(label);
                label.map(|l| l.to_string()).unwrap_or_else(|| "unlabelled".into())
            });
            Line {
                legend,
                color: regime_color(label),
                points: range.filter_map(|i| Some((*table.time.get(i)?, *values.get(i)?))).collect(),
            }
        })
        .collect();
    let chart = Chart {
        title:     format!("{channel} time series by regime"),
        x_label:   "Time, s".into(),
        y_label:   channel.to_string(),
        y_range:   None,
        reference: None,
    };
    write_svg(path, &chart.render(&lines))
}
