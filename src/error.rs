// src/error.rs

use std::path::PathBuf;

use arrow::error::ArrowError;

/// Every failure the core can surface. None of these are transient, so the
/// core never retries; the caller decides what to show or ask for.
#[derive(Debug, thiserror::Error)]
pub enum AihError {
    /// Requested path does not exist. Recoverable by supplying a stream source.
    #[error("source not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    /// Malformed tabular content (ragged rows, undecodable bytes, no header).
    #[error("failed to parse `{origin}`: {reason}")]
    ParseFailure { origin: String, reason: String },

    /// The field separator must be one ASCII byte.
    #[error("invalid separator {0:?}: expected a single ASCII character")]
    InvalidSeparator(char),

    /// A column the preprocessor relies on is absent from its input table.
    #[error("table `{table}` has no column `{column}`")]
    MissingColumn { table: String, column: String },

    /// The reference table repeats a join key, so the merge would fan out.
    #[error("reference join key `{key}` occurs {occurrences} times (expected at most once)")]
    MergeCardinalityViolation { key: String, occurrences: usize },

    /// Year or month could not be turned into a calendar date.
    #[error("cannot derive admission date at row {row}: {reason}")]
    DateDerivationError { row: usize, reason: String },

    /// Scaling denominator is zero, missing or not a number.
    #[error("cannot scale column `{column}`: {reason}")]
    DegenerateScalingError { column: String, reason: String },

    /// Association needs at least two distinct columns.
    #[error("association needs at least two distinct columns, got {requested}")]
    InsufficientColumns { requested: usize },

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("column `{0}` is not categorical")]
    NotCategorical(String),

    #[error("column `{0}` is not numeric")]
    NotNumeric(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
}

impl AihError {
    pub(crate) fn parse_failure(origin: impl Into<String>, reason: impl ToString) -> Self {
        Self::ParseFailure {
            origin: origin.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn degenerate(column: &str, reason: impl Into<String>) -> Self {
        Self::DegenerateScalingError {
            column: column.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for every fallible core operation.
pub type Result<T> = std::result::Result<T, AihError>;
