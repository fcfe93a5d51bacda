//! The identifier index and its build phase.
//!
//! The index is owned by the ingest phase and sealed by an explicit
//! [`IndexBuilder::finish`] before the matcher can see it: the builder type
//! holds the only mutable handle, so a partially built index can never be
//! probed. Lookups are O(1) average-case against a hash map keyed by
//! normalized identifier; the O(n) scan over the source is paid once per
//! run, not once per queried identifier.
//!
//! Duplicate identifiers in the source follow a fixed, documented policy:
//! **last write wins in file order**. Batches are absorbed sequentially and
//! rows inserted in file order (parallelism is confined to order-preserving
//! projection inside a batch), so the policy is deterministic and
//! independent of chunk size.

use std::io::Read;
use std::path::Path;
use std::time::Instant;

use rustc_hash::FxHashMap;

use crate::config::RunConfig;
use crate::error::CrossrefResult;
use crate::ingest::{
    Batch, BatchProgress, CancelToken, ChunkedReader, IngestObserver, IngestStats, ProjectedRow,
};
use crate::run::RunPhase;

/// Mapping from normalized identifier to its projected row.
///
/// Footprint is proportional to the count of distinct qualifying
/// identifiers, not to raw file size: only projected fields are retained.
pub type IsrcIndex = FxHashMap<String, ProjectedRow>;

/// Incremental index builder; the mutable half of the index lifecycle.
#[derive(Debug)]
pub struct IndexBuilder {
    index: IsrcIndex,
    rows_read: u64,
    rows_indexed: u64,
    rows_missing_identifier: u64,
    malformed_rows: u64,
    undecodable_rows: u64,
    batches: u64,
    started: Instant,
}

impl IndexBuilder {
    /// Create an empty builder; starts the ingest clock.
    pub fn new() -> Self {
        Self {
            index: IsrcIndex::default(),
            rows_read: 0,
            rows_indexed: 0,
            rows_missing_identifier: 0,
            malformed_rows: 0,
            undecodable_rows: 0,
            batches: 0,
            started: Instant::now(),
        }
    }

    /// Absorb one batch, in file order. Consumes the batch; its backing
    /// storage is reclaimable as soon as this returns.
    pub fn absorb(&mut self, batch: Batch) {
        self.batches += 1;
        self.rows_read += batch.rows_read;
        self.rows_missing_identifier += batch.missing_identifier_rows;
        self.malformed_rows += batch.malformed_rows;
        self.undecodable_rows += batch.undecodable_rows;

        for row in batch.rows {
            if row.isrc.is_empty() {
                // Kept only because drop_missing_identifiers is off; an
                // empty key cannot be probed, so it is never indexed.
                continue;
            }
            self.rows_indexed += 1;
            self.index.insert(row.isrc.clone(), row);
        }
    }

    /// Rows absorbed into the index so far.
    pub fn rows_indexed(&self) -> u64 {
        self.rows_indexed
    }

    /// Raw rows read so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Progress snapshot for the batch just absorbed.
    fn progress(&self) -> BatchProgress {
        BatchProgress {
            batch: self.batches,
            rows_read: self.rows_read,
            rows_indexed: self.rows_indexed,
            elapsed: self.started.elapsed(),
        }
    }

    /// Seal the index: the terminal "ingest complete" transition.
    ///
    /// Consumes the builder, so no further mutation is possible; the matcher
    /// only ever receives a finished index.
    pub fn finish(self) -> (IsrcIndex, IngestStats) {
        let stats = IngestStats {
            rows_read: self.rows_read,
            rows_indexed: self.rows_indexed,
            rows_missing_identifier: self.rows_missing_identifier,
            malformed_rows: self.malformed_rows,
            undecodable_rows: self.undecodable_rows,
            distinct_identifiers: self.index.len() as u64,
            batches: self.batches,
            elapsed_ms: self.started.elapsed().as_millis() as u64,
        };
        (self.index, stats)
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a completed ingest: the sealed index, the share column names
/// resolved from the header (for labeling downstream), and final counters.
#[derive(Debug)]
pub struct IngestOutput {
    /// Sealed, read-only identifier index.
    pub index: IsrcIndex,
    /// Share column names actually present in the source, projection order.
    pub share_columns: Vec<String>,
    /// Final ingest counters.
    pub stats: IngestStats,
}

/// Build the identifier index from a source file.
///
/// Opens the TSV, resolves the projection from the header, folds every batch
/// into an [`IndexBuilder`], and seals it. Progress is reported to the
/// observer at batch boundaries; fatal errors are reported via
/// `on_failure` before being returned.
pub fn build_index(
    path: impl AsRef<Path>,
    config: &RunConfig,
    observer: Option<&dyn IngestObserver>,
    cancel: &CancelToken,
) -> CrossrefResult<IngestOutput> {
    let reader = match ChunkedReader::from_path(path, config, cancel.clone()) {
        Ok(r) => r,
        Err(e) => {
            if let Some(obs) = observer {
                obs.on_failure(RunPhase::Ingesting, &e);
            }
            return Err(e);
        }
    };
    drive(reader, observer)
}

/// [`build_index`] over any byte source (in-memory inputs, tests).
pub fn build_index_from_reader<R: Read>(
    rdr: R,
    config: &RunConfig,
    observer: Option<&dyn IngestObserver>,
    cancel: &CancelToken,
) -> CrossrefResult<IngestOutput> {
    let reader = match ChunkedReader::from_reader(rdr, config, cancel.clone()) {
        Ok(r) => r,
        Err(e) => {
            if let Some(obs) = observer {
                obs.on_failure(RunPhase::Ingesting, &e);
            }
            return Err(e);
        }
    };
    drive(reader, observer)
}

fn drive<R: Read>(
    mut reader: ChunkedReader<R>,
    observer: Option<&dyn IngestObserver>,
) -> CrossrefResult<IngestOutput> {
    let share_columns = reader.projection().share_columns().to_vec();
    let mut builder = IndexBuilder::new();

    // Strictly sequential: batch N+1 is not read until batch N has been
    // absorbed and dropped.
    for batch in &mut reader {
        match batch {
            Ok(batch) => {
                builder.absorb(batch);
                if let Some(obs) = observer {
                    obs.on_batch(&builder.progress());
                }
            }
            Err(e) => {
                if let Some(obs) = observer {
                    obs.on_failure(RunPhase::Ingesting, &e);
                }
                return Err(e);
            }
        }
    }

    let (index, stats) = builder.finish();
    if let Some(obs) = observer {
        obs.on_complete(&stats);
    }
    Ok(IngestOutput {
        index,
        share_columns,
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::{build_index_from_reader, IndexBuilder};
    use crate::config::RunConfig;
    use crate::ingest::{Batch, CancelToken, ProjectedRow, ShareValue};

    fn row(isrc: &str, share: f64) -> ProjectedRow {
        ProjectedRow {
            isrc: isrc.to_string(),
            shares: vec![ShareValue::Number(share)],
        }
    }

    fn batch_of(rows: Vec<ProjectedRow>) -> Batch {
        let n = rows.len() as u64;
        Batch {
            rows,
            rows_read: n,
            malformed_rows: 0,
            undecodable_rows: 0,
            missing_identifier_rows: 0,
        }
    }

    #[test]
    fn last_write_wins_across_batches() {
        let mut builder = IndexBuilder::new();
        builder.absorb(batch_of(vec![row("A1", 10.0)]));
        builder.absorb(batch_of(vec![row("A1", 90.0)]));
        let (index, stats) = builder.finish();

        assert_eq!(index.len(), 1);
        assert_eq!(index["A1"].shares, vec![ShareValue::Number(90.0)]);
        assert_eq!(stats.rows_indexed, 2);
        assert_eq!(stats.distinct_identifiers, 1);
    }

    #[test]
    fn kept_empty_identifiers_are_never_indexed() {
        let mut builder = IndexBuilder::new();
        builder.absorb(batch_of(vec![row("", 1.0), row("B2", 2.0)]));
        let (index, stats) = builder.finish();

        assert_eq!(index.len(), 1);
        assert_eq!(stats.rows_indexed, 1);
    }

    #[test]
    fn index_contents_do_not_depend_on_chunk_size() {
        let input = "ISRC\tShare\na1\t1\nA2\t2\na1\t3\nb9\t4\nc5\t5\n";
        let base = RunConfig {
            identifier_column: "ISRC".to_string(),
            share_columns: vec!["Share".to_string()],
            ..RunConfig::default()
        };

        let small = build_index_from_reader(
            input.as_bytes(),
            &RunConfig {
                chunk_size: 2,
                ..base.clone()
            },
            None,
            &CancelToken::new(),
        )
        .unwrap();
        let large = build_index_from_reader(
            input.as_bytes(),
            &RunConfig {
                chunk_size: 100_000,
                ..base.clone()
            },
            None,
            &CancelToken::new(),
        )
        .unwrap();
        let unbounded = build_index_from_reader(
            input.as_bytes(),
            &RunConfig {
                memory_efficient: false,
                ..base
            },
            None,
            &CancelToken::new(),
        )
        .unwrap();

        assert_eq!(small.index, large.index);
        assert_eq!(small.index, unbounded.index);
        // Last write wins: a1 appears twice, third row overwrites the first.
        assert_eq!(small.index["A1"].shares, vec![ShareValue::Number(3.0)]);
        assert_eq!(small.stats.distinct_identifiers, 4);
    }
}
