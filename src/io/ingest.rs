//! CSV ingest.
//!
//! This module turns raw bytes (plain or gzip-compressed CSV) into a `RawTable`:
//! a header map plus untyped string records. Typing and filtering happen later in
//! `analytics::filter`, so this layer never drops rows for semantic reasons.
//!
//! Design goals:
//! - **Tolerant tokenizing** (bad records are collected as row errors, not fatal)
//! - **Normalized headers** (BOM stripped, lowercase) so schema checks are reliable
//! - **Separation of concerns**: no analytics here

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use csv::StringRecord;
use flate2::read::GzDecoder;

use crate::domain::RowError;
use crate::error::{AnalyticsError, AppError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// An in-memory table of string cells, keyed by normalized header name.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    headers: HashMap<String, usize>,
    header_names: Vec<String>,
    records: Vec<StringRecord>,
    /// 1-based source line each record starts on.
    lines: Vec<usize>,
    /// Records the CSV reader could not tokenize.
    pub row_errors: Vec<RowError>,
}

impl RawTable {
    /// Build a table from already-split rows (used by the synthetic generator and tests).
    pub fn from_rows<S: AsRef<str>>(header_names: &[S], rows: Vec<Vec<String>>) -> Self {
        let header_record = StringRecord::from(header_names.iter().map(|h| h.as_ref()).collect::<Vec<_>>());
        let (headers, header_names) = build_header_map(&header_record);
        Self {
            headers,
            header_names,
            lines: (0..rows.len()).map(|idx| idx + 2).collect(),
            records: rows.into_iter().map(StringRecord::from).collect(),
            row_errors: Vec::new(),
        }
    }

    /// Parse CSV from any reader. Gzip must already be unwrapped.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AnalyticsError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let header_record = reader
            .headers()
            .map_err(|e| AnalyticsError::Csv(format!("failed to read headers: {e}")))?
            .clone();
        let (headers, header_names) = build_header_map(&header_record);

        let mut records = Vec::new();
        let mut lines = Vec::new();
        let mut row_errors = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            // Fallback when the reader has no position: header is line 1, one line per record.
            let fallback = idx + 2;
            match result {
                Ok(record) => {
                    lines.push(record.position().map_or(fallback, |p| p.line() as usize));
                    records.push(record);
                }
                Err(e) => row_errors.push(RowError {
                    line: e.position().map_or(fallback, |p| p.line() as usize),
                    region: None,
                    message: format!("CSV parse error: {e}"),
                }),
            }
        }

        if !row_errors.is_empty() {
            log::warn!("{} record(s) could not be tokenized", row_errors.len());
        }
        log::info!("Read {} record(s) with {} column(s)", records.len(), header_names.len());

        Ok(Self {
            headers,
            header_names,
            records,
            lines,
            row_errors,
        })
    }

    /// Parse CSV bytes, transparently gunzipping when the payload has the gzip magic.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AnalyticsError> {
        if is_gzip(bytes) {
            log::debug!("Payload is gzip-compressed ({} bytes)", bytes.len());
            Self::from_reader(GzDecoder::new(bytes))
        } else {
            Self::from_reader(bytes)
        }
    }

    /// Open a CSV (or `.csv.gz`) file from disk.
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let file = File::open(path)
            .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
        let mut reader = BufReader::new(file);
        let mut bytes = Vec::new();
        reader
            .read_to_end(&mut bytes)
            .map_err(|e| AppError::new(2, format!("Failed to read CSV '{}': {e}", path.display())))?;
        Ok(Self::from_bytes(&bytes)?)
    }

    /// Column index for a (normalized) header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.get(name).copied()
    }

    /// Like `column`, but a missing column is a schema error.
    pub fn require_column(&self, name: &str) -> Result<usize, AnalyticsError> {
        self.column(name).ok_or_else(|| AnalyticsError::schema(name))
    }

    pub fn header_names(&self) -> &[String] {
        &self.header_names
    }

    pub fn records(&self) -> &[StringRecord] {
        &self.records
    }

    /// Source line of record `idx`.
    pub fn line(&self, idx: usize) -> usize {
        self.lines.get(idx).copied().unwrap_or(idx + 2)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Trimmed cell value; empty cells read as `None`.
pub fn cell(record: &StringRecord, idx: usize) -> Option<&str> {
    record.get(idx).map(str::trim).filter(|s| !s.is_empty())
}

fn is_gzip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[..2] == GZIP_MAGIC
}

fn build_header_map(headers: &StringRecord) -> (HashMap<String, usize>, Vec<String>) {
    let names: Vec<String> = headers.iter().map(normalize_header_name).collect();
    let map = names
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.clone(), idx))
        .collect();
    (map, names)
}

fn normalize_header_name(name: &str) -> String {
    // Excel and other tools sometimes emit UTF-8 CSVs with a BOM prefix on the
    // first header. If we don't strip it, schema validation will incorrectly
    // report missing columns.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    const CSV: &str = "\u{feff}State,date,place_type\nSP,2020-03-01,state\nRJ,2020-03-01,city\n";

    #[test]
    fn headers_are_normalized() {
        let table = RawTable::from_bytes(CSV.as_bytes()).unwrap();
        assert_eq!(table.header_names(), &["state", "date", "place_type"]);
        assert_eq!(table.column("state"), Some(0));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn gzip_payload_is_detected() {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(CSV.as_bytes()).unwrap();
        let gz = enc.finish().unwrap();

        let table = RawTable::from_bytes(&gz).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(cell(&table.records()[1], 0), Some("RJ"));
    }

    #[test]
    fn missing_column_is_a_schema_error() {
        let table = RawTable::from_bytes(CSV.as_bytes()).unwrap();
        let err = table.require_column("last_available_deaths").unwrap_err();
        assert_eq!(err, AnalyticsError::schema("last_available_deaths"));
    }

    #[test]
    fn empty_cells_read_as_none() {
        let table = RawTable::from_rows(&["a", "b"], vec![vec!["x".to_string(), "  ".to_string()]]);
        let rec = &table.records()[0];
        assert_eq!(cell(rec, 0), Some("x"));
        assert_eq!(cell(rec, 1), None);
        assert_eq!(cell(rec, 7), None);
    }

    #[test]
    fn line_numbers_survive_unparseable_and_multiline_records() {
        let mut bytes = b"state,date,note\n".to_vec();
        bytes.extend_from_slice(b"SP,2020-03-01,\xff\n");
        bytes.extend_from_slice(b"RJ,2020-03-01,\"two\nlines\"\n");
        bytes.extend_from_slice(b"AM,bad-date,x\n");

        let table = RawTable::from_bytes(&bytes).unwrap();
        assert_eq!(table.row_errors.len(), 1);
        assert_eq!(table.row_errors[0].line, 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.line(0), 3);
        assert_eq!(table.line(1), 5);
    }
}
