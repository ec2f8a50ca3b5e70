//! SQLite registry of pipeline sessions.
//!
//! RULE: Only store.rs talks to the database.
//! The registry records what was generated and how the model scored;
//! the CSV tables stay the source of truth for the data itself.

use crate::{
    error::TelemetryResult,
    fault::Regime,
    health::RunHealthSummary,
    metrics::{ClassMetrics, ClassificationReport},
    run::Run,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

pub struct PipelineStore {
    conn: Connection,
}

/// Fresh session identifier.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

impl PipelineStore {
    /// Open (or create) the registry at `path`.
    pub fn open(path: &Path) -> TelemetryResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory registry (used in tests).
    pub fn in_memory() -> TelemetryResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> TelemetryResult<()> {
        self.conn.execute_batch(include_str!("../migrations/001_registry.sql"))?;
        Ok(())
    }

    // ── Session ────────────────────────────────────────────────

    pub fn insert_session(
        &self,
        session_id: &str,
        kind: &str,
        seed: u64,
        config_json: &str,
    ) -> TelemetryResult<()> {
        self.conn.execute(
            "INSERT INTO session (session_id, kind, seed, version, config_json, started_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session_id,
                kind,
                seed as i64,
                env!("CARGO_PKG_VERSION"),
                config_json,
                chrono::Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Most recent session of a kind, by start time.
    pub fn latest_session(&self, kind: &str) -> TelemetryResult<Option<String>> {
        let id = self
            .conn
            .query_row(
                "SELECT session_id FROM session WHERE kind = ?1
                 ORDER BY started_at DESC, rowid DESC LIMIT 1",
                params![kind],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    // ── Generated runs ─────────────────────────────────────────

    pub fn record_generated_run(&self, session_id: &str, run: &Run, path: &Path) -> TelemetryResult<()> {
        self.conn.execute(
            "INSERT INTO generated_run (session_id, run_id, regime, replicate, seed, samples, path)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                session_id,
                run.run_id,
                run.regime.as_str(),
                run.replicate as i64,
                run.seed as i64,
                run.len() as i64,
                path.display().to_string(),
            ],
        )?;
        Ok(())
    }

    pub fn generated_run_count(&self, session_id: &str) -> TelemetryResult<i64> {
        let n = self.conn.query_row(
            "SELECT COUNT(*) FROM generated_run WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(n)
    }

    /// (run_id, seed) pairs of a session, in insertion order.
    pub fn generated_seeds(&self, session_id: &str) -> TelemetryResult<Vec<(String, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, seed FROM generated_run WHERE session_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![session_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    // ── Evaluation ─────────────────────────────────────────────

    pub fn record_report(
        &self,
        session_id: &str,
        classifier: &str,
        report: &ClassificationReport,
    ) -> TelemetryResult<()> {
        for c in &report.classes {
            self.conn.execute(
                "INSERT INTO class_metric (session_id, classifier, label, precision, recall, f1, support)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session_id,
                    classifier,
                    c.label.as_str(),
                    c.precision,
                    c.recall,
                    c.f1,
                    c.support as i64,
                ],
            )?;
        }
        Ok(())
    }

    pub fn class_metrics(&self, session_id: &str) -> TelemetryResult<Vec<ClassMetrics>> {
        let mut stmt = self.conn.prepare(
            "SELECT label, precision, recall, f1, support
             FROM class_metric WHERE session_id = ?1 ORDER BY id ASC",
        )?;
        let raw = stmt
            .query_map(params![session_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, i64>(4)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(label, precision, recall, f1, support)| -> TelemetryResult<ClassMetrics> {
                Ok(ClassMetrics {
                    label: label.parse::<Regime>()?,
                    precision,
                    recall,
                    f1,
                    support: support as usize,
                })
            })
            .collect()
    }

    pub fn record_run_health(&self, session_id: &str, summaries: &[RunHealthSummary]) -> TelemetryResult<()> {
        for s in summaries {
            self.conn.execute(
                "INSERT INTO run_health (session_id, run_id, label, samples, mean_health, min_health, first_alarm)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    session_id,
                    s.run_id,
                    s.label.map(|l| l.as_str()),
                    s.samples as i64,
                    s.mean_health,
                    s.min_health,
                    s.first_alarm,
                ],
            )?;
        }
        Ok(())
    }

    pub fn run_health(&self, session_id: &str) -> TelemetryResult<Vec<RunHealthSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, label, samples, mean_health, min_health, first_alarm
             FROM run_health WHERE session_id = ?1 ORDER BY id ASC",
        )?;
        let raw = stmt
            .query_map(params![session_id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, Option<f64>>(5)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(run_id, label, samples, mean_health, min_health, first_alarm)| -> TelemetryResult<RunHealthSummary> {
                Ok(RunHealthSummary {
                    run_id,
                    label: label.map(|l| l.parse::<Regime>()).transpose()?,
                    samples: samples as usize,
                    mean_health,
                    min_health,
                    first_alarm,
                })
            })
            .collect()
    }
}
