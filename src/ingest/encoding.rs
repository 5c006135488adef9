//! Text encoding detection for carrier exports
//!
//! Exports arrive as UTF-8 (sometimes with a BOM) or as Windows-1252 from
//! Excel. Anything that is not valid UTF-8 is decoded as Windows-1252.

use serde::{Deserialize, Serialize};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    Utf8,
    Windows1252,
}

/// Remove a leading UTF-8 byte-order mark, if present
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Classify a byte sample
///
/// A sample that is valid UTF-8 except for a sequence cut off at the very
/// end (a chunk boundary) still counts as UTF-8.
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    if bytes.starts_with(UTF8_BOM) || bytes.is_ascii() {
        return TextEncoding::Utf8;
    }
    match std::str::from_utf8(bytes) {
        Ok(_) => TextEncoding::Utf8,
        Err(e) if e.error_len().is_none() => TextEncoding::Utf8,
        Err(_) => TextEncoding::Windows1252,
    }
}

/// Decode bytes under `encoding`, falling back to Windows-1252 if UTF-8 turns out invalid
///
/// Returns the text and the encoding actually used.
pub fn decode(bytes: &[u8], encoding: TextEncoding) -> (String, TextEncoding) {
    if encoding == TextEncoding::Utf8 {
        if let Ok(text) = std::str::from_utf8(bytes) {
            return (text.to_string(), TextEncoding::Utf8);
        }
    }
    let (text, _) = encoding_rs::WINDOWS_1252.decode_without_bom_handling(bytes);
    (text.into_owned(), TextEncoding::Windows1252)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_utf8_and_bom() {
        assert_eq!(detect_encoding(b"a,b\n1,2\n"), TextEncoding::Utf8);
        assert_eq!(detect_encoding("caf\u{e9}".as_bytes()), TextEncoding::Utf8);
        assert_eq!(detect_encoding(&[0xEF, 0xBB, 0xBF, b'a']), TextEncoding::Utf8);
    }

    #[test]
    fn test_detect_truncated_utf8_is_still_utf8() {
        let bytes = "caf\u{e9}".as_bytes();
        assert_eq!(detect_encoding(&bytes[..bytes.len() - 1]), TextEncoding::Utf8);
    }

    #[test]
    fn test_detect_and_decode_windows_1252() {
        // "Café" with é as the single byte 0xE9
        let bytes = [b'C', b'a', b'f', 0xE9, b'\n'];
        assert_eq!(detect_encoding(&bytes), TextEncoding::Windows1252);
        let (text, used) = decode(&bytes, TextEncoding::Windows1252);
        assert_eq!(text, "Caf\u{e9}\n");
        assert_eq!(used, TextEncoding::Windows1252);
    }

    #[test]
    fn test_decode_falls_back_when_utf8_invalid() {
        let (text, used) = decode(&[b'$', 0x80], TextEncoding::Utf8);
        assert_eq!(used, TextEncoding::Windows1252);
        assert_eq!(text, "$\u{20ac}");
    }

    #[test]
    fn test_strip_bom() {
        assert_eq!(strip_bom(&[0xEF, 0xBB, 0xBF, b'x']), b"x");
        assert_eq!(strip_bom(b"x"), b"x");
    }
}
