//! Header resolution and row projection.
//!
//! Column names are resolved to positions exactly once, from the header,
//! before the first data batch. Per-row work is index lookups only.

use csv::StringRecord;
use serde::Serialize;

use crate::config::RunConfig;
use crate::error::{CrossrefError, CrossrefResult};

/// Normalize a raw identifier for indexing and probing: trim surrounding
/// whitespace and uppercase. ISRCs are ASCII codes; the reference dataset
/// mixes cases between drops, so lookups must be case-insensitive-safe.
pub fn normalize_isrc(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// One retained share/ownership value.
///
/// The external dataset's column types are not declared anywhere, and drift
/// between drops. Values parse opportunistically: empty cells become `Null`,
/// numeric cells become `Number`, everything else stays `Text`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ShareValue {
    /// Empty cell.
    Null,
    /// Numeric cell (share percentages, durations).
    Number(f64),
    /// Anything else, trimmed.
    Text(String),
}

impl ShareValue {
    fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return ShareValue::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => ShareValue::Number(n),
            Err(_) => ShareValue::Text(trimmed.to_owned()),
        }
    }
}

/// The minimal per-row record retained by the index.
///
/// `shares` aligns positionally with [`Projection::share_columns`]; the
/// column names are stored once on the projection, not repeated per row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectedRow {
    /// Normalized identifier. Empty when the source row had none.
    pub isrc: String,
    /// Retained share/ownership values, in [`Projection::share_columns`] order.
    pub shares: Vec<ShareValue>,
}

/// Resolved projection: which source columns feed a [`ProjectedRow`].
///
/// Built once per run from the header via [`Projection::resolve`].
#[derive(Debug, Clone)]
pub struct Projection {
    identifier_idx: usize,
    share_idxs: Vec<usize>,
    share_columns: Vec<String>,
    width: usize,
}

impl Projection {
    /// Resolve the configured columns against the source header.
    ///
    /// The identifier column is matched case-insensitively by name, falling
    /// back to a case-insensitive substring match (the dataset has shipped
    /// the ISRC column under several exact spellings). Its absence is a
    /// fatal [`CrossrefError::Schema`]. Share columns absent from the header
    /// are omitted from the projection.
    pub fn resolve(headers: &StringRecord, config: &RunConfig) -> CrossrefResult<Self> {
        let wanted = config.identifier_column.to_ascii_lowercase();
        let identifier_idx = headers
            .iter()
            .position(|h| h.eq_ignore_ascii_case(&config.identifier_column))
            .or_else(|| {
                headers
                    .iter()
                    .position(|h| h.to_ascii_lowercase().contains(&wanted))
            })
            .ok_or_else(|| CrossrefError::Schema {
                column: config.identifier_column.clone(),
                headers: headers.iter().map(str::to_owned).collect(),
            })?;

        let mut share_idxs = Vec::with_capacity(config.share_columns.len());
        let mut share_columns = Vec::with_capacity(config.share_columns.len());
        for name in &config.share_columns {
            if let Some(idx) = headers.iter().position(|h| h.eq_ignore_ascii_case(name)) {
                share_idxs.push(idx);
                // Record the header's own spelling so downstream labels
                // match the source.
                share_columns.push(headers[idx].to_owned());
            }
        }

        Ok(Self {
            identifier_idx,
            share_idxs,
            share_columns,
            width: headers.len(),
        })
    }

    /// Project one decoded row (already padded/truncated to header width).
    ///
    /// The identifier is normalized here; empty-identifier policy is applied
    /// by the reader, which also keeps the counters.
    pub fn project(&self, fields: &[String]) -> ProjectedRow {
        let isrc = fields
            .get(self.identifier_idx)
            .map(|f| normalize_isrc(f))
            .unwrap_or_default();
        let shares = self
            .share_idxs
            .iter()
            .map(|&idx| {
                fields
                    .get(idx)
                    .map(|f| ShareValue::parse(f))
                    .unwrap_or(ShareValue::Null)
            })
            .collect();
        ProjectedRow { isrc, shares }
    }

    /// Resolved share column names, in projection order (header spelling).
    pub fn share_columns(&self) -> &[String] {
        &self.share_columns
    }

    /// Number of columns declared by the header.
    pub fn width(&self) -> usize {
        self.width
    }
}
