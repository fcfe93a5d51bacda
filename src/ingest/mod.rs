//! Streaming ingest of the reference dataset.
//!
//! The pipeline, leaves first:
//!
//! - [`record`]: decode one raw record, repairing shape problems
//! - [`projection`]: header resolution + per-row projection
//! - [`reader`]: chunked batch iterator with cancellation support
//! - [`observability`]: observer hooks for progress and outcomes
//!
//! Most callers should use [`crate::index::build_index`], which drives the
//! whole ingest and returns a sealed index.

pub mod observability;
pub mod projection;
pub mod record;
pub mod reader;

pub use observability::{
    BatchProgress, CompositeObserver, FileObserver, IngestObserver, IngestStats, StdErrObserver,
};
pub use projection::{normalize_isrc, ProjectedRow, Projection, ShareValue};
pub use reader::{Batch, CancelToken, ChunkedReader};
