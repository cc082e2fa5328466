//! Text recovery reader for legacy scenario files.
//!
//! Parameter files exported from NAADSM use an `xdf:` namespace prefix
//! without ever declaring it, and were written in more than one text
//! encoding. Both defects are repaired here and never surfaced to callers;
//! any other parse error propagates unchanged.

use std::fs;
use std::path::Path;

use crate::error::{ParseError, Result};

use super::{Element, parse_document};

/// Declaration inserted in front of the first `xmlns:` occurrence when the
/// undeclared-`xdf` defect is detected.
const XDF_DECLARATION: &str = r#"xmlns:xdf="http://xml.gsfc.nasa.gov/XDF" "#;

/// Candidate encodings tried, in order, when re-decoding raw bytes.
const CANDIDATE_ENCODINGS: [Encoding; 3] = [Encoding::Utf16, Encoding::Utf8, Encoding::UsAscii];

#[derive(Debug, Clone, Copy)]
enum Encoding {
    Utf16,
    Utf8,
    UsAscii,
}

/// Load and parse an XML file, applying the namespace recovery path
/// if needed.
pub fn load_document(path: &Path) -> Result<Element> {
    let bytes = fs::read(path)?;
    parse_bytes(&bytes)
}

/// Parse raw document bytes, applying the namespace recovery path if needed.
pub fn parse_bytes(bytes: &[u8]) -> Result<Element> {
    let text = decode_direct(bytes)?;
    match parse_document(&text) {
        Ok(root) => Ok(root),
        Err(ParseError::UnboundPrefix(_)) => {
            // Known defect: an xdf: prefix with no declaration. Re-decode the
            // raw bytes, splice in a synthetic declaration and parse again.
            let text = decode_candidates(bytes)?;
            let patched = patch_namespace(&text);
            parse_document(&patched)
        }
        Err(e) => Err(e),
    }
}

/// Insert the synthetic `xdf` declaration immediately before the first
/// `xmlns:` occurrence. A document with no `xmlns:` at all is left untouched
/// and will fail the re-parse the same way the original parse did.
fn patch_namespace(text: &str) -> String {
    text.replacen("xmlns:", &format!("{XDF_DECLARATION}xmlns:"), 1)
}

/// First decode attempt: honor a UTF-16 byte-order mark, else expect UTF-8.
/// Bytes that fit neither fall through to the candidate list.
fn decode_direct(bytes: &[u8]) -> Result<String> {
    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return decode_utf16(bytes);
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(strip_bom(text).to_string()),
        Err(_) => decode_candidates(bytes),
    }
}

/// Try the candidate encodings in order and keep the first success.
fn decode_candidates(bytes: &[u8]) -> Result<String> {
    for encoding in CANDIDATE_ENCODINGS {
        let decoded = match encoding {
            Encoding::Utf16 => decode_utf16(bytes),
            Encoding::Utf8 => std::str::from_utf8(bytes)
                .map(|t| strip_bom(t).to_string())
                .map_err(|_| ParseError::Encoding),
            Encoding::UsAscii => {
                if bytes.is_ascii() {
                    Ok(String::from_utf8_lossy(bytes).into_owned())
                } else {
                    Err(ParseError::Encoding)
                }
            }
        };
        if let Ok(text) = decoded {
            return Ok(text);
        }
    }
    Err(ParseError::Encoding)
}

fn decode_utf16(bytes: &[u8]) -> Result<String> {
    let (body, big_endian) = if bytes.starts_with(&[0xFF, 0xFE]) {
        (&bytes[2..], false)
    } else if bytes.starts_with(&[0xFE, 0xFF]) {
        (&bytes[2..], true)
    } else {
        // No byte-order mark: assume little-endian, as the legacy exports did.
        (bytes, false)
    };
    if body.len() % 2 != 0 {
        return Err(ParseError::Encoding);
    }
    let units: Vec<u16> = body
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    String::from_utf16(&units).map_err(|_| ParseError::Encoding)
}

fn strip_bom(text: &str) -> &str {
    text.strip_prefix('\u{FEFF}').unwrap_or(text)
}
