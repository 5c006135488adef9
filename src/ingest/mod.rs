//! Carrier file ingestion: encoding, delimiter and chunked CSV parsing

mod delimiter;
mod encoding;
mod reader;

pub use delimiter::{sniff_delimiter, CANDIDATE_DELIMITERS};
pub use encoding::{decode, detect_encoding, strip_bom, TextEncoding};
pub use reader::{parse_csv, parse_csv_chunked, ChunkedParser, ParsedFile, DEFAULT_CHUNK_SIZE};

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::Result;

/// Parse from any reader, holding at most one byte window of raw input at a time
pub fn load_from_reader<R: Read>(mut reader: R, chunk_size: usize) -> Result<ParsedFile> {
    let mut parser = ChunkedParser::new();
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut rows = Vec::new();

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        rows.extend(parser.feed(&buf[..n])?);
    }
    rows.extend(parser.finish()?);
    parser.into_parsed(rows)
}

/// Read and parse a carrier file from disk
pub fn load_file<P: AsRef<Path>>(path: P, chunk_size: usize) -> Result<ParsedFile> {
    load_from_reader(File::open(path)?, chunk_size)
}
