//! Streaming CSV parsing into raw rows
//!
//! Input is fed in fixed-size byte windows. Only complete records (ending
//! at a newline outside a quoted field) are parsed; the partial tail is carried to
//! the next call together with the detected encoding, delimiter and header.

use csv::ReaderBuilder;

use super::delimiter::{sniff_delimiter, CANDIDATE_DELIMITERS};
use super::encoding::{decode, detect_encoding, strip_bom, TextEncoding};
use crate::error::{EngineError, Result};
use crate::normalize::{CellValue, RawRow};

/// Default byte window for chunked ingestion
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// A fully parsed carrier file
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Header names in file order, trimmed and made unique
    pub headers: Vec<String>,
    /// Non-blank data rows; `rows[0]` is canonical row 1
    ///
    /// Blank lines are dropped before numbering, so row numbers count data
    /// records rather than physical lines of the file.
    pub rows: Vec<RawRow>,
    pub delimiter: u8,
    pub encoding: TextEncoding,
}

/// Incremental parser state carried between chunks
#[derive(Debug, Default)]
pub struct ChunkedParser {
    pending: Vec<u8>,
    bom_checked: bool,
    saw_content: bool,
    encoding: Option<TextEncoding>,
    delimiter: Option<u8>,
    headers: Option<Vec<String>>,
    rows_emitted: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldState {
    Start,
    Unquoted,
    Quoted,
    /// A quote inside a quoted field: closes it unless another quote follows
    QuoteInQuoted,
}

/// Byte offset just past the last newline that ends a record
///
/// Follows the csv reader's quoting rules: a quote opens a quoted field only
/// at the start of a field, `""` inside one is a literal quote, and a quote
/// anywhere else is plain text. Until the delimiter is known, any candidate
/// delimiter starts a new field.
fn last_record_boundary(bytes: &[u8], delimiter: Option<u8>) -> Option<usize> {
    let is_delimiter = |b: u8| match delimiter {
        Some(d) => b == d,
        None => CANDIDATE_DELIMITERS.contains(&b),
    };

    let mut state = FieldState::Start;
    let mut boundary = None;
    for (i, &b) in bytes.iter().enumerate() {
        state = match (state, b) {
            (FieldState::Quoted, b'"') => FieldState::QuoteInQuoted,
            (FieldState::Quoted, _) => FieldState::Quoted,
            (FieldState::QuoteInQuoted, b'"') => FieldState::Quoted,
            (FieldState::Start, b'"') => FieldState::Quoted,
            (_, b'\n') => {
                boundary = Some(i + 1);
                FieldState::Start
            }
            (_, b'\r') => FieldState::Start,
            (_, b) if is_delimiter(b) => FieldState::Start,
            _ => FieldState::Unquoted,
        };
    }
    boundary
}

/// Trim header names, name blank ones by position and suffix duplicates (`Amount`, `Amount_2`)
fn unique_headers<'a>(fields: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    for (i, field) in fields.enumerate() {
        let base = match field.trim() {
            "" => format!("column_{}", i + 1),
            name => name.to_string(),
        };
        let mut name = base.clone();
        let mut n = 2;
        while headers.contains(&name) {
            name = format!("{}_{}", base, n);
            n += 1;
        }
        headers.push(name);
    }
    headers
}

impl ChunkedParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip sniffing and use a known delimiter
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
            ..Self::default()
        }
    }

    pub fn headers(&self) -> Option<&[String]> {
        self.headers.as_deref()
    }

    pub fn delimiter(&self) -> Option<u8> {
        self.delimiter
    }

    pub fn encoding(&self) -> Option<TextEncoding> {
        self.encoding
    }

    /// Data rows produced so far
    pub fn rows_emitted(&self) -> usize {
        self.rows_emitted
    }

    /// Consume one byte window and return the data rows it completed
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<RawRow>> {
        self.pending.extend_from_slice(chunk);
        let scanned = if self.bom_checked {
            &self.pending[..]
        } else {
            strip_bom(&self.pending)
        };
        let skipped = self.pending.len() - scanned.len();
        match last_record_boundary(scanned, self.delimiter).map(|cut| cut + skipped) {
            Some(cut) => {
                let complete: Vec<u8> = self.pending.drain(..cut).collect();
                self.parse_block(&complete)
            }
            None => Ok(Vec::new()),
        }
    }

    /// Flush the trailing partial line and enforce the structural checks
    ///
    /// Fails when the input was empty, had no header row, or had no data rows.
    pub fn finish(&mut self) -> Result<Vec<RawRow>> {
        let rest = std::mem::take(&mut self.pending);
        let rows = self.parse_block(&rest)?;

        if !self.saw_content {
            return Err(EngineError::EmptyInput);
        }
        if self.headers.is_none() {
            return Err(EngineError::MissingHeader);
        }
        if self.rows_emitted == 0 {
            return Err(EngineError::NoDataRows);
        }
        Ok(rows)
    }

    fn parse_block(&mut self, block: &[u8]) -> Result<Vec<RawRow>> {
        let block = if self.bom_checked {
            block
        } else {
            if block.is_empty() {
                return Ok(Vec::new());
            }
            self.bom_checked = true;
            strip_bom(block)
        };

        if block.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Vec::new());
        }
        self.saw_content = true;

        let encoding = *self.encoding.get_or_insert_with(|| detect_encoding(block));
        let (text, used) = decode(block, encoding);
        if used != encoding {
            log::warn!("input is not valid UTF-8; decoding remainder as Windows-1252");
        }
        self.encoding = Some(used);

        let delimiter = *self.delimiter.get_or_insert_with(|| {
            let d = sniff_delimiter(&text);
            log::debug!("detected delimiter {:?}", d as char);
            d
        });

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|f| f.trim().is_empty()) {
                continue;
            }

            let headers = match &self.headers {
                Some(h) => h,
                None => {
                    self.headers = Some(unique_headers(record.iter()));
                    continue;
                }
            };

            let row: RawRow = headers
                .iter()
                .enumerate()
                .map(|(i, h)| {
                    let cell = record.get(i).map(CellValue::from_raw).unwrap_or(CellValue::Empty);
                    (h.clone(), cell)
                })
                .collect();
            rows.push(row);
        }

        self.rows_emitted += rows.len();
        Ok(rows)
    }

    /// Assemble the final parsed file from collected rows
    pub fn into_parsed(self, rows: Vec<RawRow>) -> Result<ParsedFile> {
        Ok(ParsedFile {
            headers: self.headers.ok_or(EngineError::MissingHeader)?,
            rows,
            delimiter: self.delimiter.unwrap_or(b','),
            encoding: self.encoding.unwrap_or(TextEncoding::Utf8),
        })
    }
}

/// Parse a whole in-memory file using the default byte window
pub fn parse_csv(bytes: &[u8]) -> Result<ParsedFile> {
    parse_csv_chunked(bytes, DEFAULT_CHUNK_SIZE)
}

/// Parse a whole in-memory file, feeding it `chunk_size` bytes at a time
pub fn parse_csv_chunked(bytes: &[u8], chunk_size: usize) -> Result<ParsedFile> {
    let mut parser = ChunkedParser::new();
    let mut rows = Vec::new();
    for chunk in bytes.chunks(chunk_size.max(1)) {
        rows.extend(parser.feed(chunk)?);
    }
    rows.extend(parser.finish()?);

    log::debug!(
        "parsed {} rows x {} columns",
        rows.len(),
        parser.headers().map_or(0, |h| h.len())
    );
    parser.into_parsed(rows)
}
