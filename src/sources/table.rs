//! CSV decoding for the two shapes of input: headed tables and headerless
//! grids.
//!
//! Cells are decoded lossily: bytes that are not UTF-8 become U+FFFD and the
//! affected rows are counted, so one badly encoded cell does not reject a
//! whole source.

use csv::{ByteRecord, ReaderBuilder, StringRecord};
use std::borrow::Cow;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// A headed table with ragged rows allowed.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    headers: StringRecord,
    rows: Vec<StringRecord>,
    lossy_rows: usize,
}

impl Table {
    /// Decodes CSV bytes whose first row holds the column names.
    ///
    /// `name` is only used in diagnostics.
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let (headers, _) = decode(reader.byte_headers().map_err(|e| Error::csv(name, e))?);

        let mut rows = Vec::new();
        let mut lossy_rows = 0;
        for result in reader.byte_records() {
            let (row, lossy) = decode(&result.map_err(|e| Error::csv(name, e))?);
            lossy_rows += usize::from(lossy);
            rows.push(row.into_iter().collect::<StringRecord>());
        }

        if lossy_rows > 0 {
            warn!(table = name, lossy_rows, "Rows with non-UTF-8 bytes decoded lossily");
        }
        debug!(table = name, columns = headers.len(), rows = rows.len(), "Table decoded");
        Ok(Self {
            name: name.to_string(),
            headers: headers.into_iter().collect(),
            rows,
            lossy_rows,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rows(&self) -> &[StringRecord] {
        &self.rows
    }

    /// Rows that held bytes outside UTF-8.
    pub fn lossy_rows(&self) -> usize {
        self.lossy_rows
    }

    /// Index of the column whose trimmed header equals `header`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingColumn`] when no header matches.
    pub fn column(&self, header: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h.trim() == header.trim())
            .ok_or_else(|| Error::missing_column(&self.name, header))
    }
}

/// Returns the trimmed cell at `index`, treating short rows as blank.
pub fn cell(record: &StringRecord, index: usize) -> &str {
    record.get(index).map(str::trim).unwrap_or("")
}

/// Converts raw fields to strings; the flag is set when any field needed a
/// replacement character.
fn decode(record: &ByteRecord) -> (Vec<String>, bool) {
    let mut lossy = false;
    let fields = record
        .iter()
        .map(|field| match String::from_utf8_lossy(field) {
            Cow::Borrowed(s) => s.to_string(),
            Cow::Owned(s) => {
                lossy = true;
                s
            }
        })
        .collect();
    (fields, lossy)
}

/// Number of empty lines starting at `offset`, where a record read begins.
///
/// The csv reader skips empty lines silently. A `\n` directly after the `\r`
/// that ended the previous record belongs to that record.
fn blank_lines_at(bytes: &[u8], offset: usize) -> usize {
    let mut pos = offset;
    if offset > 0 && bytes.get(offset - 1) == Some(&b'\r') && bytes.get(offset) == Some(&b'\n') {
        pos += 1;
    }

    let mut lines = 0;
    while let Some(&b) = bytes.get(pos) {
        match b {
            b'\n' => {
                lines += 1;
                pos += 1;
            }
            b'\r' => {
                lines += 1;
                pos += 1;
                if bytes.get(pos) == Some(&b'\n') {
                    pos += 1;
                }
            }
            _ => break,
        }
    }
    lines
}

/// Decodes headerless CSV bytes into a grid of raw cells, one `Vec` per
/// source line.
///
/// Empty lines are kept as empty rows so that row indices match the line
/// layout of the export.
pub fn read_grid(name: &str, bytes: &[u8]) -> Result<Vec<Vec<String>>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut grid = Vec::new();
    let mut record = ByteRecord::new();
    let mut lossy_rows = 0;
    let mut blank_rows = 0;
    while reader
        .read_byte_record(&mut record)
        .map_err(|e| Error::csv(name, e))?
    {
        let offset = record
            .position()
            .map_or(0, |p| usize::try_from(p.byte()).unwrap_or(bytes.len()));
        let blanks = blank_lines_at(bytes, offset);
        blank_rows += blanks;
        grid.extend(std::iter::repeat_with(Vec::new).take(blanks));

        let (row, lossy) = decode(&record);
        lossy_rows += usize::from(lossy);
        grid.push(row);
    }

    if lossy_rows > 0 {
        warn!(grid = name, lossy_rows, "Rows with non-UTF-8 bytes decoded lossily");
    }
    debug!(grid = name, rows = grid.len(), blank_rows, "Grid decoded");
    Ok(grid)
}
