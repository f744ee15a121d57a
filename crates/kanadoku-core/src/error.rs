use crate::symbols::SymbolSetError;
use crate::Difficulty;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for corpus operations
pub type Result<T> = std::result::Result<T, CorpusError>;

/// Fatal errors raised by generation, persistence and maintenance.
///
/// Duplicate candidates are not errors: the generator retries them locally and
/// only reports [`CorpusError::RetriesExhausted`] once its budget is spent.
/// Invariant violations found by the validator are reported as
/// [`crate::Violation`]s instead.
#[derive(Debug, Error)]
pub enum CorpusError {
    /// No id left in the tier's range
    #[error("{difficulty} id range exhausted: next id {next} exceeds max {max}")]
    RangeExhausted {
        difficulty: Difficulty,
        next: u32,
        max: u32,
    },

    /// The retry budget ran out before the target was reached
    #[error("{difficulty}: gave up with {generated}/{requested} records after {attempts} attempts")]
    RetriesExhausted {
        difficulty: Difficulty,
        attempts: usize,
        generated: usize,
        requested: usize,
    },

    /// Filler lines ran out before the pool reached its size
    #[error("{pool} pool cannot be filled: {have} of {size} lines after {attempts} attempts")]
    PoolExhausted {
        pool: &'static str,
        have: usize,
        size: usize,
        attempts: usize,
    },

    /// Record lines alone exceed the pool size
    #[error("{pool} pool overflow: {lines} record lines exceed pool size {size}")]
    PoolOverflow {
        pool: &'static str,
        lines: usize,
        size: usize,
    },

    /// A required input file is missing, empty or structurally wrong
    #[error("malformed input {}: {reason}", .path.display())]
    MalformedInput { path: PathBuf, reason: String },

    /// Filesystem failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON encoding or decoding failure
    #[error("JSON error in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// A seed symbol set is not a valid bijection
    #[error("invalid symbol set: {0}")]
    SymbolSet(#[from] SymbolSetError),

    /// The id range table is not contiguous
    #[error("invalid tier table: {0}")]
    TierTable(String),
}

impl CorpusError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
