//! Zero-copy routing record parser.
//!
//! # Record Format
//!
//! ```text
//! source | destination | claim_id | status_code
//! ```
//!
//! - Surrounding whitespace is trimmed before splitting.
//! - Blank lines are returned as [`ParsedLine::Blank`].
//! - Lines that do not split into exactly four fields are returned as
//!   [`ParsedLine::Malformed`]. There is no escaping, so a field containing
//!   the delimiter always lands here.
//!
//! Fields are opaque; an empty field is still a field.

use crate::model::PartitionKey;

/// The delimiter used when no config overrides it.
pub const DEFAULT_DELIMITER: char = '|';

/// Number of fields in a routing record.
pub const FIELD_COUNT: usize = 4;

/// One routing record, borrowing its fields from the input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteRecord<'a> {
    pub source: &'a str,
    pub destination: &'a str,
    pub claim_id: &'a str,
    pub status_code: &'a str,
}

impl RouteRecord<'_> {
    /// Owned partition key for this record.
    #[must_use]
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::new(self.claim_id, self.status_code)
    }
}

/// The result of parsing a single input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedLine<'a> {
    /// Empty after trimming.
    Blank,
    /// Wrong number of fields.
    Malformed {
        /// Number of fields found.
        fields: usize,
    },
    /// A well-formed routing record.
    Record(RouteRecord<'a>),
}

/// Parse one line of routing input.
#[must_use]
pub fn parse_line(line: &str, delimiter: char) -> ParsedLine<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return ParsedLine::Blank;
    }

    let mut fields = trimmed.split(delimiter);
    match (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) {
        (Some(source), Some(destination), Some(claim_id), Some(status_code), None) => {
            ParsedLine::Record(RouteRecord {
                source,
                destination,
                claim_id,
                status_code,
            })
        }
        _ => ParsedLine::Malformed {
            fields: trimmed.split(delimiter).count(),
        },
    }
}
