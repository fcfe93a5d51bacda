use thiserror::Error;

use crate::run::RunPhase;

/// Convenience result type for crossref operations.
pub type CrossrefResult<T> = Result<T, CrossrefError>;

/// Error type returned by ingest and run functions.
///
/// Only fatal conditions appear here. Per-row anomalies (short rows,
/// undecodable rows, missing identifiers) are absorbed into
/// [`crate::ingest::IngestStats`] counters and never abort a run.
#[derive(Debug, Error)]
pub enum CrossrefError {
    /// Underlying I/O error before streaming starts (e.g. file not found).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The required identifier column is absent from the source header.
    ///
    /// Fatal before any batch is read: silently indexing the wrong column
    /// would be worse than stopping.
    #[error("identifier column '{column}' not found in header. headers={headers:?}")]
    Schema {
        /// Configured identifier column name.
        column: String,
        /// Header as actually read from the source.
        headers: Vec<String>,
    },

    /// The source failed mid-stream (truncated or unreadable).
    ///
    /// Carries how many rows were already processed so the caller can judge
    /// whether a partial rerun is worthwhile. A partial index is never
    /// presented as complete.
    #[error("source read failed during {phase} after {rows_processed} rows: {source}")]
    SourceRead {
        /// Phase the run was in when the read failed.
        phase: RunPhase,
        /// Rows successfully processed before the failure.
        rows_processed: u64,
        /// Underlying reader error.
        #[source]
        source: csv::Error,
    },

    /// The caller cancelled the run via its [`crate::ingest::CancelToken`].
    #[error("run cancelled during {phase} after {rows_processed} rows")]
    Cancelled {
        /// Phase the run was in when the cancel flag was observed.
        phase: RunPhase,
        /// Rows successfully processed before cancellation.
        rows_processed: u64,
    },
}

impl CrossrefError {
    /// Rows already processed when the failure occurred, if the error
    /// carries partial-progress information.
    pub fn rows_processed(&self) -> Option<u64> {
        match self {
            CrossrefError::SourceRead { rows_processed, .. }
            | CrossrefError::Cancelled { rows_processed, .. } => Some(*rows_processed),
            _ => None,
        }
    }
}
