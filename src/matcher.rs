//! Catalog cross-referencing against a sealed index.
//!
//! The matcher only reads: it receives the index after the ingest phase has
//! sealed it, so no locking is required by construction. Matching is a pure
//! function of (index, catalog) and therefore idempotent.

use serde::Serialize;

use crate::catalog::CatalogEntry;
use crate::index::IsrcIndex;
use crate::ingest::{normalize_isrc, ProjectedRow, ShareValue};

/// One catalog entry found in the reference dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    /// The catalog entry that matched.
    pub entry: CatalogEntry,
    /// The projected reference row it matched.
    pub row: ProjectedRow,
}

/// Aggregate statistics over one matching pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchStats {
    /// All catalog entries received, with or without identifier.
    pub total_catalog_entries: u64,
    /// Entries carrying a non-empty identifier.
    pub entries_with_identifier: u64,
    /// Entries whose identifier was found in the index.
    pub matched_count: u64,
    /// Entries lacking an identifier. Never counted as non-matches.
    pub unverifiable_entries: u64,
    /// `matched_count / entries_with_identifier`; `0.0` when no entry
    /// carries an identifier.
    pub match_rate: f64,
    /// Mean of the unclaimed-share column over matched rows, when such a
    /// column was projected and held numeric values.
    pub mean_unclaimed_share: Option<f64>,
}

/// Matching output handed to the external report writer.
#[derive(Debug, Clone, Serialize)]
pub struct MatchReport {
    /// Share column names, aligned with every `row.shares` in `results`.
    pub share_columns: Vec<String>,
    /// One result per matching catalog occurrence, in catalog order.
    pub results: Vec<MatchResult>,
    /// Aggregate statistics.
    pub stats: MatchStats,
}

impl MatchReport {
    /// Render the report as pretty JSON for downstream consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Join the catalog against a sealed index.
///
/// Each catalog occurrence is evaluated independently: a duplicated
/// identifier in the catalog (multiple releases of the same recording) can
/// produce multiple results. Probes use the same normalization as ingest,
/// so case differences between catalog and source never cost a match.
pub fn match_catalog(
    index: &IsrcIndex,
    catalog: &[CatalogEntry],
    share_columns: &[String],
) -> MatchReport {
    let mut results = Vec::new();
    let mut entries_with_identifier = 0u64;
    let mut unverifiable = 0u64;

    for entry in catalog {
        let key = match entry.isrc.as_deref().map(normalize_isrc) {
            Some(key) if !key.is_empty() => key,
            _ => {
                unverifiable += 1;
                continue;
            }
        };
        entries_with_identifier += 1;
        if let Some(row) = index.get(&key) {
            results.push(MatchResult {
                entry: entry.clone(),
                row: row.clone(),
            });
        }
    }

    let matched_count = results.len() as u64;
    let match_rate = if entries_with_identifier == 0 {
        0.0
    } else {
        matched_count as f64 / entries_with_identifier as f64
    };

    let mean_unclaimed_share = share_columns
        .iter()
        .position(|c| c.to_ascii_lowercase().contains("unclaimed"))
        .and_then(|idx| share_mean(&results, idx));

    MatchReport {
        share_columns: share_columns.to_vec(),
        results,
        stats: MatchStats {
            total_catalog_entries: catalog.len() as u64,
            entries_with_identifier,
            matched_count,
            unverifiable_entries: unverifiable,
            match_rate,
            mean_unclaimed_share,
        },
    }
}

/// Mean of one share column over matched rows, ignoring null and
/// non-numeric values. `None` when no numeric value is present.
pub fn share_mean(results: &[MatchResult], column_idx: usize) -> Option<f64> {
    let mut sum = 0.0;
    let mut n = 0u64;
    for result in results {
        if let Some(ShareValue::Number(v)) = result.row.shares.get(column_idx) {
            sum += v;
            n += 1;
        }
    }
    if n == 0 { None } else { Some(sum / n as f64) }
}
