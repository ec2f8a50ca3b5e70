//! CSV persistence for run tables and the health index series.
//!
//! RULE: every file is written to a temporary sibling and renamed into
//! place, so a failed write never leaves a partial table behind.
//! Floats are written with the shortest round-trip representation.

use crate::{
    error::{TelemetryError, TelemetryResult},
    fault::Regime,
    health::HealthSeries,
    run::Run,
    table::TelemetryTable,
    types::Channel,
};
use std::{
    fs,
    path::{Path, PathBuf},
};

pub const HEALTH_INDEX_FILE: &str = "health_index.csv";

/// Column order of a persisted run.
pub fn run_header() -> Vec<&'static str> {
    std::iter::once("time")
        .chain(Channel::ALL.iter().map(|c| c.name()))
        .chain(std::iter::once("label"))
        .collect()
}

/// Write through a temp file, then rename over `path`.
pub fn write_atomically(
    path: &Path,
    write: impl FnOnce(&Path) -> TelemetryResult<()>,
) -> TelemetryResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    if let Err(e) = write(&tmp) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Write `<dir>/<run_id>.csv` and return its path.
pub fn write_run_csv(dir: &Path, run: &Run) -> TelemetryResult<PathBuf> {
    let path = dir.join(format!("{}.csv", run.run_id));
    write_atomically(&path, |tmp| {
        let mut w = csv::Writer::from_path(tmp)?;
        w.write_record(run_header())?;
        for i in 0..run.len() {
            let mut record = Vec::with_capacity(Channel::ALL.len() + 2);
            record.push(run.time()[i].to_string());
            for channel in Channel::ALL {
                record.push(run.channel(channel)[i].to_string());
            }
            record.push(run.regime.as_str().to_string());
            w.write_record(&record)?;
        }
        w.flush()?;
        Ok(())
    })?;
    log::debug!("wrote {} ({} rows)", path.display(), run.len());
    Ok(path)
}

/// Parse `<regime>_run_<replicate>` from a file stem.
pub fn parse_run_stem(stem: &str) -> Option<(Regime, usize)> {
    let (regime, replicate) = stem.rsplit_once("_run_")?;
    Some((regime.parse().ok()?, replicate.parse().ok()?))
}

/// Run files in `dir`, sorted by name. Other files are ignored.
pub fn list_run_files(dir: &Path) -> TelemetryResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_csv = path.extension().is_some_and(|e| e == "csv");
        let is_run = path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|s| parse_run_stem(s).is_some());
        if is_csv && is_run {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read one persisted run. The run id is the file stem.
pub fn read_run_csv(path: &Path) -> TelemetryResult<TelemetryTable> {
    let run_id = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();

    let col = |name: &str| -> TelemetryResult<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| TelemetryError::malformed(&run_id, 0, format!("missing column '{name}'")))
    };
    let i_time = col("time")?;
    let i_label = col("label")?;
    let i_channels = Channel::ALL
        .iter()
        .map(|c| col(c.name()).map(|i| (*c, i)))
        .collect::<TelemetryResult<Vec<_>>>()?;

    let mut table = TelemetryTable {
        labels: Some(Vec::new()),
        ..TelemetryTable::default()
    };
    let mut labels = Vec::new();

    for (row, result) in rdr.records().enumerate() {
        let record = result?;
        let number = |i: usize, name: &str| -> TelemetryResult<f64> {
            let raw = record.get(i).unwrap_or_default();
            raw.parse::<f64>()
                .map_err(|e| TelemetryError::malformed(&run_id, row, format!("{name} '{raw}': {e}")))
        };
        table.time.push(number(i_time, "time")?);
        for &(channel, i) in &i_channels {
            let value = number(i, channel.name())?;
            table.columns.entry(channel).or_default().push(value);
        }
        let raw_label = record.get(i_label).unwrap_or_default();
        let label: Regime = raw_label
            .parse()
            .map_err(|_| TelemetryError::malformed(&run_id, row, format!("unknown label '{raw_label}'")))?;
        labels.push(label);
        table.run_ids.push(run_id.clone());
    }
    for channel in Channel::ALL {
        table.columns.entry(channel).or_default();
    }
    table.labels = Some(labels);

    log::debug!("read {} ({} rows)", path.display(), table.len());
    Ok(table)
}

/// Concatenate every run file of `dir` in name order.
pub fn load_runs(dir: &Path) -> TelemetryResult<TelemetryTable> {
    let files = list_run_files(dir)?;
    if files.is_empty() {
        return Err(TelemetryError::invalid(
            "data_dir",
            format!("no run files in {}; generate telemetry first", dir.display()),
        ));
    }
    let mut table = TelemetryTable::default();
    for file in &files {
        table.extend(read_run_csv(file)?);
    }
    log::info!("loaded {} telemetry files ({} rows) from {}", files.len(), table.len(), dir.display());
    Ok(table)
}

/// Write `run_id, time, health_index, label`.
pub fn write_health_csv(path: &Path, series: &HealthSeries) -> TelemetryResult<()> {
    write_atomically(path, |tmp| {
        let mut w = csv::Writer::from_path(tmp)?;
        w.write_record(["run_id", "time", "health_index", "label"])?;
        for s in &series.samples {
            w.write_record([
                s.run_id.clone(),
                s.time.to_string(),
                s.health_index.to_string(),
                s.label.map(|l| l.to_string()).unwrap_or_default(),
            ])?;
        }
        w.flush()?;
        Ok(())
    })?;
    log::info!("saved health index time series to {}", path.display());
    Ok(())
}
