//! Per-record decode and shape policy.
//!
//! The reference dataset is known to contain short rows, and occasionally
//! rows with stray extra fields or broken encoding. Shape problems are
//! repaired (pad/truncate) and counted; encoding problems skip the row and
//! are counted. Neither is ever fatal to the run.

use csv::ByteRecord;

/// Outcome of decoding one raw record against the header width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedRecord {
    /// Field count matched the header; all fields decoded.
    Clean(Vec<String>),
    /// Short row padded with empty trailing fields, or long row truncated.
    /// Counted as malformed, but still usable.
    Reshaped(Vec<String>),
    /// At least one field was not valid UTF-8; the row is skipped.
    Undecodable,
}

/// Decode a raw record into `width` string fields.
///
/// - fewer fields than `width`: missing trailing fields become empty strings
/// - more fields than `width`: the excess is dropped
/// - any invalid-UTF-8 field: the whole row is [`ParsedRecord::Undecodable`]
pub fn parse_record(record: &ByteRecord, width: usize) -> ParsedRecord {
    let mut fields = Vec::with_capacity(width);
    for raw in record.iter().take(width) {
        match std::str::from_utf8(raw) {
            Ok(s) => fields.push(s.to_owned()),
            Err(_) => return ParsedRecord::Undecodable,
        }
    }

    if record.len() == width {
        ParsedRecord::Clean(fields)
    } else {
        fields.resize(width, String::new());
        ParsedRecord::Reshaped(fields)
    }
}
