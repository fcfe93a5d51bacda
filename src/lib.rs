//! `isrc-crossref` cross-references an artist catalog against a very large
//! reference table of unclaimed recordings, under a fixed memory budget.
//!
//! The reference table (tens of millions of rows of tab-delimited text)
//! never fits in memory on a workstation, so it is streamed in fixed-size
//! batches, each row projected down to a recording identifier (ISRC) plus a
//! handful of share/ownership fields, and folded into an in-memory
//! [`index::IsrcIndex`]. A small catalog is then probed against the sealed
//! index and the results summarized.
//!
//! The primary entrypoint is [`run::run`], which drives the whole pipeline;
//! [`index::build_index`] and [`matcher::match_catalog`] expose the two
//! phases separately.
//!
//! ## Quick example
//!
//! ```no_run
//! use isrc_crossref::{run, CancelToken, CatalogEntry, RunConfig};
//!
//! # fn main() -> Result<(), isrc_crossref::CrossrefError> {
//! let config = RunConfig::default();
//! let catalog = vec![
//!     CatalogEntry::new("Yellow", "Parachutes", Some("GBAYE0000527".to_string())),
//!     CatalogEntry::new("Clocks", "A Rush of Blood", None),
//! ];
//!
//! let outcome = run(
//!     &config,
//!     "data/unclaimedmusicalworkrightshares.tsv",
//!     &catalog,
//!     None,
//!     &CancelToken::new(),
//! )?;
//! println!(
//!     "matched {} of {} (rate {:.2})",
//!     outcome.report.stats.matched_count,
//!     outcome.report.stats.entries_with_identifier,
//!     outcome.report.stats.match_rate,
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Observing progress
//!
//! Large ingests report coarse progress at batch boundaries through an
//! [`ingest::IngestObserver`]:
//!
//! ```no_run
//! use isrc_crossref::ingest::StdErrObserver;
//! use isrc_crossref::{run, CancelToken, RunConfig};
//!
//! # fn main() -> Result<(), isrc_crossref::CrossrefError> {
//! let observer = StdErrObserver;
//! let outcome = run(
//!     &RunConfig::default(),
//!     "data/unclaimedmusicalworkrightshares.tsv",
//!     &[],
//!     Some(&observer),
//!     &CancelToken::new(),
//! )?;
//! eprintln!("{}", outcome.report.to_json().unwrap_or_default());
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`ingest`]: chunked streaming reader, projection, observability
//! - [`index`]: identifier index + incremental build phase
//! - [`matcher`]: catalog join + statistics
//! - [`run`]: run-level orchestration and phases
//! - [`catalog`], [`config`], [`error`]: supporting types

pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod matcher;
pub mod run;

pub use catalog::CatalogEntry;
pub use config::RunConfig;
pub use error::{CrossrefError, CrossrefResult};
pub use index::{build_index, build_index_from_reader, IndexBuilder, IngestOutput, IsrcIndex};
pub use ingest::CancelToken;
pub use matcher::{match_catalog, MatchReport, MatchResult, MatchStats};
pub use run::{run, RunOutcome, RunPhase};
