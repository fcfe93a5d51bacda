//! Run-level orchestration.
//!
//! One run moves through `Idle → Ingesting → Indexed → Matching → Done`,
//! with `Ingesting → Failed` on schema/read/cancel errors. There is no path
//! back to `Ingesting` once `Indexed` is reached: the index is sealed by the
//! ingest phase and only read afterwards.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::catalog::CatalogEntry;
use crate::config::RunConfig;
use crate::error::CrossrefResult;
use crate::index::build_index;
use crate::ingest::{CancelToken, IngestObserver, IngestStats};
use crate::matcher::{match_catalog, MatchReport};

/// Phase of a crossref run; fatal errors report the phase they occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunPhase {
    /// Created, nothing read yet.
    Idle,
    /// Streaming the source into the index.
    Ingesting,
    /// Index sealed, matching not started.
    Indexed,
    /// Probing the catalog against the index.
    Matching,
    /// Finished successfully.
    Done,
    /// Aborted by error or cancellation.
    Failed,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Idle => "idle",
            RunPhase::Ingesting => "ingesting",
            RunPhase::Indexed => "indexed",
            RunPhase::Matching => "matching",
            RunPhase::Done => "done",
            RunPhase::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Everything a completed run hands to the external report writer.
#[derive(Debug)]
pub struct RunOutcome {
    /// Match results + aggregate statistics.
    pub report: MatchReport,
    /// Ingest-side counters (data-quality signal for the caller).
    pub ingest_stats: IngestStats,
}

/// Execute one complete ingest-and-match run.
///
/// The catalog is an already-resolved, finite sequence supplied by the
/// caller; retry/backoff against whatever API produced it is not this
/// crate's concern. Cancellation (via `cancel`) fails the run rather than
/// returning a partial result.
pub fn run(
    config: &RunConfig,
    source: impl AsRef<Path>,
    catalog: &[CatalogEntry],
    observer: Option<&dyn IngestObserver>,
    cancel: &CancelToken,
) -> CrossrefResult<RunOutcome> {
    // Ingesting → Indexed. build_index reports failures to the observer
    // with the phase before returning them.
    let ingest = build_index(source, config, observer, cancel)?;

    // Indexed → Matching → Done. Matching is a pure read of the sealed
    // index and cannot fail.
    let report = match_catalog(&ingest.index, catalog, &ingest.share_columns);

    Ok(RunOutcome {
        report,
        ingest_stats: ingest.stats,
    })
}
