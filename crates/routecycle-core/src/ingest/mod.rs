//! Record ingestion: routing text stream → partitioned graphs.
//!
//! The whole stream is consumed before anything is returned. Blank and
//! malformed lines are counted and skipped; only I/O failures (including
//! invalid UTF-8) abort ingestion.

pub mod parser;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, instrument, trace};

use crate::config::IngestConfig;
use crate::error::ErrorCode;
use crate::model::PartitionedGraphs;

pub use parser::{DEFAULT_DELIMITER, FIELD_COUNT, ParsedLine, RouteRecord, parse_line};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that abort ingestion.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The input file could not be opened.
    #[error("failed to open {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading the stream failed part way through.
    #[error("failed to read input at line {line}")]
    Read {
        line: usize,
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::InputUnreadable
    }

    /// The underlying I/O error.
    #[must_use]
    pub const fn io_error(&self) -> &io::Error {
        match self {
            Self::Open { source, .. } | Self::Read { source, .. } => source,
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Line counters collected during ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Physical lines read.
    pub lines: usize,
    /// Lines empty after trimming.
    pub blank: usize,
    /// Lines with the wrong field count.
    pub malformed: usize,
    /// Records turned into edges.
    pub records: usize,
}

/// The result of ingesting one stream.
#[derive(Debug, Clone, Default)]
pub struct Ingested {
    pub graphs: PartitionedGraphs,
    pub stats: IngestStats,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Ingest routing records from `reader`.
///
/// Lines end at `\n`, `\r\n` or a bare `\r`.
///
/// # Errors
///
/// Returns [`IngestError::Read`] if the stream fails or is not UTF-8.
#[instrument(skip_all, fields(delimiter = %config.delimiter))]
pub fn ingest_reader<R: BufRead>(reader: R, config: &IngestConfig) -> Result<Ingested, IngestError> {
    let mut out = Ingested::default();

    for chunk in reader.split(b'\n') {
        let mut chunk = chunk.map_err(|source| IngestError::Read {
            line: out.stats.lines + 1,
            source,
        })?;
        if chunk.last() == Some(&b'\r') {
            chunk.pop();
        }

        for raw in chunk.split(|&b| b == b'\r') {
            let line_no = out.stats.lines + 1;
            let line = std::str::from_utf8(raw).map_err(|err| IngestError::Read {
                line: line_no,
                source: io::Error::new(io::ErrorKind::InvalidData, err),
            })?;
            out.stats.lines = line_no;
            ingest_line(&mut out, line, line_no, config.delimiter);
        }
    }

    debug!(
        lines = out.stats.lines,
        records = out.stats.records,
        malformed = out.stats.malformed,
        partitions = out.graphs.len(),
        "ingestion complete"
    );
    Ok(out)
}

fn ingest_line(out: &mut Ingested, line: &str, line_no: usize, delimiter: char) {
    match parse_line(line, delimiter) {
        ParsedLine::Blank => out.stats.blank += 1,
        ParsedLine::Malformed { fields } => {
            trace!(line = line_no, fields, "skipping malformed record");
            out.stats.malformed += 1;
        }
        ParsedLine::Record(record) => {
            out.graphs
                .add_edge(record.partition_key(), record.source, record.destination);
            out.stats.records += 1;
        }
    }
}

/// Open `path` and ingest it.
///
/// # Errors
///
/// Returns [`IngestError::Open`] if the file cannot be opened, or
/// [`IngestError::Read`] if reading fails.
#[instrument(skip(config), fields(path = %path.display()))]
pub fn ingest_path(path: &Path, config: &IngestConfig) -> Result<Ingested, IngestError> {
    let file = File::open(path).map_err(|source| IngestError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    ingest_reader(BufReader::new(file), config)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::model::PartitionKey;

    fn ingest_str(input: &str) -> Ingested {
        ingest_reader(Cursor::new(input), &IngestConfig::default())
            .unwrap_or_else(|err| panic!("ingest failed: {err}"))
    }

    #[test]
    fn groups_edges_by_partition_key() {
        let ingested = ingest_str("A|B|C1|S1\nB|C|C1|S1\nC|A|C1|S1\nX|Y|C2|S2\n");

        assert_eq!(ingested.graphs.len(), 2);
        let c1 = ingested
            .graphs
            .get(&PartitionKey::new("C1", "S1"))
            .unwrap_or_else(|| panic!("C1,S1 missing"));
        assert_eq!(c1.edge_count(), 3);
        assert_eq!(c1.destinations("C"), vec!["A"]);
        assert_eq!(ingested.stats.records, 4);
    }

    #[test]
    fn skips_blank_and_malformed_lines() {
        let ingested = ingest_str("\n  \nA|B|C1\nA|B|C1|S1|x\nA|B|C1|S1\n");

        assert_eq!(
            ingested.stats,
            IngestStats {
                lines: 5,
                blank: 2,
                malformed: 2,
                records: 1,
            }
        );
        assert_eq!(ingested.graphs.edge_count(), 1);
    }

    #[test]
    fn only_malformed_lines_yield_no_partitions() {
        let ingested = ingest_str("nope\na|b\n\n");
        assert!(ingested.graphs.is_empty());
    }

    #[test]
    fn last_line_without_newline_is_read() {
        let ingested = ingest_str("A|B|C1|S1\nB|A|C1|S1");
        assert_eq!(ingested.stats.records, 2);
    }

    #[test]
    fn bare_carriage_returns_end_lines() {
        let ingested = ingest_str("A|B|C1|S1\rB|A|C1|S1\r");
        assert_eq!(
            ingested.stats,
            IngestStats {
                lines: 2,
                blank: 0,
                malformed: 0,
                records: 2,
            }
        );
    }

    #[test]
    fn mixed_line_endings() {
        let ingested = ingest_str("A|B|C1|S1\r\nB|C|C1|S1\rC|A|C1|S1\n\r\n");
        assert_eq!(ingested.stats.records, 3);
        assert_eq!(ingested.stats.blank, 1);
        assert_eq!(ingested.stats.lines, 4);
    }

    #[test]
    fn status_code_is_part_of_the_key() {
        let ingested = ingest_str("A|B|C1|S1\nB|A|C1|S2\n");
        assert_eq!(ingested.graphs.len(), 2);
    }

    #[test]
    fn invalid_utf8_is_a_read_error() {
        let bytes: &[u8] = b"A|B|C1|S1\n\xff\xfe|B|C1|S1\n";
        let err = ingest_reader(Cursor::new(bytes), &IngestConfig::default())
            .err()
            .unwrap_or_else(|| panic!("expected read error"));

        assert!(matches!(err, IngestError::Read { line: 2, .. }));
        assert_eq!(err.io_error().kind(), io::ErrorKind::InvalidData);
        assert_eq!(err.code(), ErrorCode::InputUnreadable);
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let err = ingest_path(
            Path::new("/definitely/not/here.psv"),
            &IngestConfig::default(),
        )
        .err()
        .unwrap_or_else(|| panic!("expected open error"));

        assert!(matches!(err, IngestError::Open { .. }));
        assert_eq!(err.io_error().kind(), io::ErrorKind::NotFound);
    }
}
