use std::path::PathBuf;

use thiserror::Error;

/// Failures a benchmark render can surface to the user.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("could not load report data from {}: {reason}", path.display())]
    DataUnavailable { path: PathBuf, reason: String },
    #[error("report data is missing the required column '{0}'")]
    MissingColumn(&'static str),
    #[error("row {row}: column '{column}' has invalid value '{value}'")]
    InvalidValue {
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("company '{0}' not found in report data")]
    FocalNotFound(String),
    #[error("at most {max} peer companies can be selected, got {given}")]
    TooManyPeers { max: usize, given: usize },
    #[error("unknown {kind} '{value}' (expected one of: {expected})")]
    UnknownOption {
        kind: &'static str,
        value: String,
        expected: &'static str,
    },
}

impl BenchError {
    /// True for errors caused by the caller's selection rather than the data.
    pub fn is_selection_error(&self) -> bool {
        matches!(
            self,
            BenchError::FocalNotFound(_)
                | BenchError::TooManyPeers { .. }
                | BenchError::UnknownOption { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, BenchError>;
