//! Column-oriented telemetry table: one or many runs, concatenated.
//!
//! Rows of one run must be contiguous. Columns may be missing when a
//! table is assembled from external data; the feature extractor checks.

use crate::{
    fault::Regime,
    run::Run,
    types::{Channel, RunId, Seconds},
};
use std::{collections::BTreeMap, ops::Range};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetryTable {
    pub run_ids: Vec<RunId>,
    pub time:    Vec<Seconds>,
    pub columns: BTreeMap<Channel, Vec<f64>>,
    /// Ground truth, absent for inference-only tables.
    pub labels:  Option<Vec<Regime>>,
}

impl TelemetryTable {
    pub fn from_runs(runs: &[Run]) -> Self {
        let mut table = Self {
            labels: Some(Vec::new()),
            ..Self::default()
        };
        for run in runs {
            table.append_run(run);
        }
        table
    }

    pub fn append_run(&mut self, run: &Run) {
        let n = run.len();
        self.run_ids.extend(std::iter::repeat(run.run_id.clone()).take(n));
        self.time.extend_from_slice(run.time());
        for channel in Channel::ALL {
            self.columns
                .entry(channel)
                .or_default()
                .extend_from_slice(run.channel(channel));
        }
        if let Some(labels) = self.labels.as_mut() {
            labels.extend(std::iter::repeat(run.regime).take(n));
        }
    }

    /// Append another table's rows. Labels survive only if both sides have them.
    pub fn extend(&mut self, other: TelemetryTable) {
        let before = self.len();
        self.run_ids.extend(other.run_ids);
        self.time.extend(other.time);
        for (channel, values) in other.columns {
            self.columns.entry(channel).or_default().extend(values);
        }
        self.labels = match (self.labels.take(), other.labels) {
            (Some(mut mine), Some(theirs)) => {
                mine.extend(theirs);
                Some(mine)
            }
            (None, Some(theirs)) if before == 0 => Some(theirs),
            _ => None,
        };
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    pub fn column(&self, channel: Channel) -> Option<&[f64]> {
        self.columns.get(&channel).map(Vec::as_slice)
    }

    /// Contiguous row ranges sharing a run id, in table order.
    pub fn run_segments(&self) -> Vec<(RunId, Range<usize>)> {
        let mut segments: Vec<(RunId, Range<usize>)> = Vec::new();
        for (i, id) in self.run_ids.iter().enumerate() {
            match segments.last_mut() {
                Some((last, range)) if last == id => range.end = i + 1,
                _ => segments.push((id.clone(), i..i + 1)),
            }
        }
        segments
    }
}
