use std::path::PathBuf;
use thiserror::Error;

/// Result type for report generation.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Everything that can abort a report run. None of these are retried: inputs are
/// static files collected by an earlier benchmark run.
#[derive(Debug, Error)]
pub enum ReportError {
    /// No snapshot exists for a required measurement key.
    #[error("no measurements found for {key} in {}", path.display())]
    NotFound { key: String, path: PathBuf },

    /// A record references a member missing from its presentation order.
    #[error("unknown {dimension} '{value}'")]
    UnknownDimensionValue { dimension: String, value: String },

    /// A raw snapshot, metadata record or tabular row could not be decoded.
    #[error("malformed record {}: {reason}", path.display())]
    MalformedRecord { path: PathBuf, reason: String },

    /// A pivot needs a cell the aggregated rows do not provide.
    #[error("missing cell for {subject} at ({distribution}, {benchmark_kind})")]
    MissingCell {
        distribution: String,
        benchmark_kind: String,
        subject: String,
    },

    /// The same (distribution, benchmark kind, subject) cell was observed twice.
    #[error("duplicate observation for {subject} at ({distribution}, {benchmark_kind})")]
    DuplicateObservation {
        distribution: String,
        benchmark_kind: String,
        subject: String,
    },

    /// Subjects compared in a single panel report throughput in different units.
    #[error("mixed throughput units in comparison '{case}'")]
    MixedThroughputUnits { case: String },

    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        ReportError::MalformedRecord {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
