//! Observer hooks for ingest progress and outcomes.
//!
//! Progress is coarse by design: one callback per batch boundary, plus a
//! final stats callback (or a failure callback with the phase). Implementors
//! can log, feed a progress bar, or trigger alerts.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::CrossrefError;
use crate::run::RunPhase;

/// Coarse progress emitted at each batch boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based batch ordinal.
    pub batch: u64,
    /// Cumulative raw rows read from the source.
    pub rows_read: u64,
    /// Cumulative rows absorbed into the index.
    pub rows_indexed: u64,
    /// Elapsed wall time since ingest started.
    pub elapsed: Duration,
}

/// Final counters for one ingest, reported on completion and surfaced in the
/// run outcome so callers can judge data quality without the run failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Raw data rows read from the source.
    pub rows_read: u64,
    /// Rows inserted into the index (non-empty identifier).
    pub rows_indexed: u64,
    /// Rows whose normalized identifier was empty.
    pub rows_missing_identifier: u64,
    /// Rows padded or truncated to the header width.
    pub malformed_rows: u64,
    /// Rows skipped for invalid UTF-8.
    pub undecodable_rows: u64,
    /// Distinct identifiers in the finished index.
    pub distinct_identifiers: u64,
    /// Batches absorbed.
    pub batches: u64,
    /// Ingest wall time in milliseconds.
    pub elapsed_ms: u64,
}

/// Observer interface for ingest outcomes.
pub trait IngestObserver: Send + Sync {
    /// Called once per absorbed batch.
    fn on_batch(&self, _progress: &BatchProgress) {}

    /// Called when ingest completes and the index is sealed.
    fn on_complete(&self, _stats: &IngestStats) {}

    /// Called when the run fails, with the phase it failed in.
    fn on_failure(&self, _phase: RunPhase, _error: &CrossrefError) {}
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestObserver for CompositeObserver {
    fn on_batch(&self, progress: &BatchProgress) {
        for o in &self.observers {
            o.on_batch(progress);
        }
    }

    fn on_complete(&self, stats: &IngestStats) {
        for o in &self.observers {
            o.on_complete(stats);
        }
    }

    fn on_failure(&self, phase: RunPhase, error: &CrossrefError) {
        for o in &self.observers {
            o.on_failure(phase, error);
        }
    }
}

/// Logs ingest events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestObserver for StdErrObserver {
    fn on_batch(&self, progress: &BatchProgress) {
        eprintln!(
            "[ingest][batch {}] rows_read={} rows_indexed={} elapsed={:.1?}",
            progress.batch, progress.rows_read, progress.rows_indexed, progress.elapsed
        );
    }

    fn on_complete(&self, stats: &IngestStats) {
        eprintln!(
            "[ingest][ok] rows_read={} rows_indexed={} distinct={} malformed={} undecodable={} elapsed_ms={}",
            stats.rows_read,
            stats.rows_indexed,
            stats.distinct_identifiers,
            stats.malformed_rows,
            stats.undecodable_rows,
            stats.elapsed_ms
        );
    }

    fn on_failure(&self, phase: RunPhase, error: &CrossrefError) {
        eprintln!("[ingest][failed][{phase}] err={error}");
    }
}

/// Appends ingest events to a local log file.
///
/// Useful for multi-hour ingests where stderr is not tail-friendly.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestObserver for FileObserver {
    fn on_batch(&self, progress: &BatchProgress) {
        self.append_line(&format!(
            "{} batch={} rows_read={} rows_indexed={}",
            unix_ts(),
            progress.batch,
            progress.rows_read,
            progress.rows_indexed
        ));
    }

    fn on_complete(&self, stats: &IngestStats) {
        self.append_line(&format!(
            "{} ok rows_read={} rows_indexed={} distinct={}",
            unix_ts(),
            stats.rows_read,
            stats.rows_indexed,
            stats.distinct_identifiers
        ));
    }

    fn on_failure(&self, phase: RunPhase, error: &CrossrefError) {
        self.append_line(&format!("{} fail phase={phase} err={error}", unix_ts()));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
