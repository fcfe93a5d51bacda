//! Run configuration.
//!
//! A [`RunConfig`] is built once by the caller (CLI / environment parsing is
//! the caller's concern) and passed immutably into the pipeline. No part of
//! the core reads global mutable state.

use serde::Serialize;

/// Immutable configuration for one ingest-and-match run.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    /// Rows per batch during chunked ingest.
    ///
    /// Bounds peak transient memory: at most one batch of projected rows is
    /// alive beyond the index itself.
    pub chunk_size: usize,
    /// Name of the source column holding the recording identifier (ISRC).
    ///
    /// Resolved case-insensitively against the header, with a substring
    /// fallback, because the external dataset's schema shifts between drops.
    pub identifier_column: String,
    /// Share/ownership columns to retain per row. Columns absent from the
    /// header are omitted from the projection; only the identifier column is
    /// required.
    pub share_columns: Vec<String>,
    /// Drop source rows whose normalized identifier is empty.
    ///
    /// When `false`, such rows are still projected and counted, but they are
    /// never indexed (an empty key cannot be probed).
    pub drop_missing_identifiers: bool,
    /// When `false`, the source is loaded in a single unbounded batch
    /// instead of chunking. Intended for small inputs and tests; index
    /// contents are identical either way.
    pub memory_efficient: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            chunk_size: 500_000,
            identifier_column: "ISRC".to_string(),
            share_columns: vec![
                "UnclaimedRightSharePercentage".to_string(),
                "RightSharePercentage".to_string(),
                "RightShareTypes".to_string(),
                "ResourceTitle".to_string(),
                "DisplayArtistName".to_string(),
            ],
            drop_missing_identifiers: true,
            memory_efficient: true,
        }
    }
}

impl RunConfig {
    /// Effective rows-per-batch for this configuration.
    ///
    /// The unbounded-load path is expressed as one batch covering the whole
    /// source, so the reader has a single code path.
    pub(crate) fn effective_chunk_size(&self) -> usize {
        if self.memory_efficient {
            self.chunk_size.max(1)
        } else {
            usize::MAX
        }
    }
}
