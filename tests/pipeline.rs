use std::sync::Mutex;

use isrc_crossref::ingest::{BatchProgress, FileObserver, IngestObserver, IngestStats};
use isrc_crossref::{
    build_index, run, CancelToken, CatalogEntry, CrossrefError, RunConfig, RunPhase,
};

fn fixture_config(chunk_size: usize) -> RunConfig {
    RunConfig {
        chunk_size,
        identifier_column: "ISRC".to_string(),
        share_columns: vec!["UnclaimedRightSharePercentage".to_string()],
        ..RunConfig::default()
    }
}

#[derive(Default)]
struct RecordingObserver {
    batches: Mutex<Vec<BatchProgress>>,
    completed: Mutex<Option<IngestStats>>,
    failures: Mutex<Vec<RunPhase>>,
}

impl IngestObserver for RecordingObserver {
    fn on_batch(&self, progress: &BatchProgress) {
        self.batches.lock().unwrap().push(*progress);
    }

    fn on_complete(&self, stats: &IngestStats) {
        *self.completed.lock().unwrap() = Some(*stats);
    }

    fn on_failure(&self, phase: RunPhase, _error: &CrossrefError) {
        self.failures.lock().unwrap().push(phase);
    }
}

#[test]
fn run_drives_ingest_and_match() {
    let catalog = vec![
        CatalogEntry::new("Yellow", "Parachutes", Some("USRC17607839".to_string())),
        CatalogEntry::new("Unreleased", "None", None),
    ];
    let observer = RecordingObserver::default();

    let outcome = run(
        &fixture_config(2),
        "tests/fixtures/unclaimed_sample.tsv",
        &catalog,
        Some(&observer),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(outcome.report.stats.matched_count, 1);
    assert_eq!(outcome.report.stats.unverifiable_entries, 1);
    assert_eq!(outcome.ingest_stats.distinct_identifiers, 3);

    // 6 data rows at chunk size 2: three batch callbacks, then completion.
    let batches = observer.batches.lock().unwrap();
    assert_eq!(batches.len(), 3);
    assert_eq!(batches.last().unwrap().rows_read, 6);
    let completed = observer.completed.lock().unwrap();
    assert_eq!(completed.unwrap().rows_read, 6);
    assert!(observer.failures.lock().unwrap().is_empty());
}

#[test]
fn schema_failure_is_reported_with_phase() {
    let observer = RecordingObserver::default();
    let config = RunConfig {
        identifier_column: "NoSuchColumn".to_string(),
        // Substring fallback must not save a genuinely absent column.
        ..fixture_config(2)
    };

    let err = run(
        &config,
        "tests/fixtures/unclaimed_sample.tsv",
        &[],
        Some(&observer),
        &CancelToken::new(),
    )
    .unwrap_err();

    assert!(matches!(err, CrossrefError::Schema { .. }));
    assert_eq!(*observer.failures.lock().unwrap(), vec![RunPhase::Ingesting]);
    assert!(observer.batches.lock().unwrap().is_empty());
}

/// Cancels the shared token as soon as the first batch lands.
struct CancellingObserver {
    token: CancelToken,
    inner: RecordingObserver,
}

impl IngestObserver for CancellingObserver {
    fn on_batch(&self, progress: &BatchProgress) {
        self.token.cancel();
        self.inner.on_batch(progress);
    }

    fn on_complete(&self, stats: &IngestStats) {
        self.inner.on_complete(stats);
    }

    fn on_failure(&self, phase: RunPhase, error: &CrossrefError) {
        self.inner.on_failure(phase, error);
    }
}

#[test]
fn cancellation_fails_the_run_at_the_next_batch_boundary() {
    let token = CancelToken::new();
    let observer = CancellingObserver {
        token: token.clone(),
        inner: RecordingObserver::default(),
    };

    let err = run(
        &fixture_config(2),
        "tests/fixtures/unclaimed_sample.tsv",
        &[],
        Some(&observer),
        &token,
    )
    .unwrap_err();

    match err {
        CrossrefError::Cancelled {
            phase,
            rows_processed,
        } => {
            assert_eq!(phase, RunPhase::Ingesting);
            assert_eq!(rows_processed, 2);
        }
        other => panic!("expected cancellation, got {other:?}"),
    }
    // One batch landed, then the run failed; it never completed.
    assert_eq!(observer.inner.batches.lock().unwrap().len(), 1);
    assert!(observer.inner.completed.lock().unwrap().is_none());
    assert_eq!(
        *observer.inner.failures.lock().unwrap(),
        vec![RunPhase::Ingesting]
    );
}

#[test]
fn file_observer_appends_progress_lines() {
    let path = std::env::temp_dir().join(format!(
        "isrc-crossref-observer-{}.log",
        std::process::id()
    ));
    let _ = std::fs::remove_file(&path);

    let observer = FileObserver::new(&path);
    build_index(
        "tests/fixtures/unclaimed_sample.tsv",
        &fixture_config(2),
        Some(&observer),
        &CancelToken::new(),
    )
    .unwrap();

    let log = std::fs::read_to_string(&path).unwrap();
    assert!(log.lines().any(|l| l.contains("batch=1")));
    assert!(log.lines().any(|l| l.contains("ok rows_read=6")));
    let _ = std::fs::remove_file(&path);
}
