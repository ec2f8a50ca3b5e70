use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Malformed input table for run '{run_id}' at row {row}: {reason}")]
    MalformedInputTable { run_id: String, row: usize, reason: String },

    #[error("Label set mismatch: class '{expected}' not found in classifier classes {classes:?}")]
    LabelSetMismatch { expected: String, classes: Vec<String> },

    #[error("Invalid probability {value} at row {row}")]
    InvalidProbability { row: usize, value: f64 },

    #[error("Classifier used before fit()")]
    NotFitted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TelemetryError {
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { name: name.into(), reason: reason.into() }
    }

    pub fn malformed(run_id: impl Into<String>, row: usize, reason: impl Into<String>) -> Self {
        Self::MalformedInputTable {
            run_id: run_id.into(),
            row,
            reason: reason.into(),
        }
    }
}

pub type TelemetryResult<T> = Result<T, TelemetryError>;
