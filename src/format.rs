//! Fragment format identification and header parsing.
//!
//! Classifies one inbound fragment's raw text into exactly one scheme using
//! a cheap syntactic test on its header, without parsing the full grammar.
//! Also hosts the header parsers for the two slot-based schemes; their
//! errors are scheme-local and treated as transient by the collector.

use serde::{Deserialize, Serialize};

use crate::error::{QrError, Result};

/// Encodings a BBQr header may declare (hex, base32, zlib+base32).
pub const KNOWN_ENCODINGS: [char; 3] = ['H', '2', 'Z'];

/// File types a BBQr header may declare.
pub const KNOWN_FILE_TYPES: [char; 7] = ['P', 'T', 'J', 'C', 'U', 'B', 'X'];

/// A fragmentation scheme, auto-detected from fragment content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scheme {
    /// Simple-indexed `p<i>of<n> ` fragments (Specter format).
    Specter,
    /// Fountain-coded `UR:` fragments wrapping a CBOR typed envelope.
    Ur,
    /// Structured `B$` container fragments (BBQr format).
    Bbqr,
    /// No fragmentation; the whole text is one complete payload.
    SingleShot,
}

impl Scheme {
    /// Classify a fragment's raw text. Rules are checked in order and the
    /// first match wins; anything unrecognized (including empty input)
    /// falls through to [`Scheme::SingleShot`]. Never panics.
    pub fn identify(text: &str) -> Scheme {
        if specter_prefix(text) {
            Scheme::Specter
        } else if text.get(..3).is_some_and(|p| p.eq_ignore_ascii_case("ur:")) {
            Scheme::Ur
        } else if text.starts_with("B$") {
            Scheme::Bbqr
        } else {
            Scheme::SingleShot
        }
    }
}

/// Parsed `p<i>of<n>` header of a Specter fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecterHeader {
    /// 1-based position of this fragment.
    pub index: usize,
    /// Declared total number of fragments.
    pub total: usize,
}

/// Parsed 8-character header of a BBQr fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BbqrHeader {
    /// Payload encoding tag (one of [`KNOWN_ENCODINGS`]).
    pub encoding: char,
    /// Payload file-type tag (one of [`KNOWN_FILE_TYPES`]).
    pub file_type: char,
    /// Declared total number of fragments.
    pub total: usize,
    /// 0-based position of this fragment.
    pub index: usize,
}

/// Match the `p<digits>of<digits><space>` prefix, case-insensitive.
///
/// Shape only: range validation lives in [`parse_specter`], so a header
/// with an out-of-range index still classifies as Specter and its range
/// error surfaces inside the Specter path as a transient parse error
/// instead of reclassifying the fragment.
fn specter_prefix(text: &str) -> bool {
    let bytes = text.as_bytes();
    if bytes.first().is_none_or(|b| !b.eq_ignore_ascii_case(&b'p')) {
        return false;
    }
    let mut pos = 1;
    if !skip_digits(bytes, &mut pos) {
        return false;
    }
    if bytes.len() < pos + 2
        || !bytes[pos].eq_ignore_ascii_case(&b'o')
        || !bytes[pos + 1].eq_ignore_ascii_case(&b'f')
    {
        return false;
    }
    pos += 2;
    if !skip_digits(bytes, &mut pos) {
        return false;
    }
    bytes.get(pos) == Some(&b' ')
}

/// Parse a Specter fragment into its header and body.
///
/// The body is everything after the single space terminating the header.
pub fn parse_specter(text: &str) -> Result<(SpecterHeader, &str)> {
    let bytes = text.as_bytes();
    if bytes.first().is_none_or(|b| !b.eq_ignore_ascii_case(&b'p')) {
        return Err(QrError::parse("specter header", "missing 'p' prefix"));
    }

    let mut pos = 1;
    let index = take_digits(bytes, &mut pos)
        .ok_or_else(|| QrError::parse("specter header", "missing fragment index"))?;

    if bytes.len() < pos + 2
        || !bytes[pos].eq_ignore_ascii_case(&b'o')
        || !bytes[pos + 1].eq_ignore_ascii_case(&b'f')
    {
        return Err(QrError::parse("specter header", "missing 'of' separator"));
    }
    pos += 2;

    let total = take_digits(bytes, &mut pos)
        .ok_or_else(|| QrError::parse("specter header", "missing fragment total"))?;

    if bytes.get(pos) != Some(&b' ') {
        return Err(QrError::parse("specter header", "missing space after header"));
    }

    if index == 0 || total == 0 || index > total {
        return Err(QrError::parse(
            "specter header",
            format!("index {index} out of range for total {total}"),
        ));
    }

    Ok((SpecterHeader { index, total }, &text[pos + 1..]))
}

fn take_digits(bytes: &[u8], pos: &mut usize) -> Option<usize> {
    let start = *pos;
    if !skip_digits(bytes, pos) {
        return None;
    }
    // Digits only, so this cannot fail short of overflow.
    std::str::from_utf8(&bytes[start..*pos]).ok()?.parse().ok()
}

fn skip_digits(bytes: &[u8], pos: &mut usize) -> bool {
    let start = *pos;
    while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
        *pos += 1;
    }
    *pos > start
}

/// Parse a BBQr fragment into its header and body.
///
/// The header is fixed at 8 characters: `B$`, encoding tag, file-type tag,
/// then total and index as two base-36 digits each.
pub fn parse_bbqr(text: &str) -> Result<(BbqrHeader, &str)> {
    if !text.starts_with("B$") {
        return Err(QrError::parse("bbqr header", "missing 'B$' prefix"));
    }
    let Some(header) = text.get(..8).filter(|h| h.is_ascii()) else {
        return Err(QrError::parse("bbqr header", "header shorter than 8 ascii characters"));
    };

    let encoding = header.as_bytes()[2] as char;
    let file_type = header.as_bytes()[3] as char;

    if !KNOWN_ENCODINGS.contains(&encoding) {
        return Err(QrError::parse("bbqr header", format!("unknown encoding '{encoding}'")));
    }
    if !KNOWN_FILE_TYPES.contains(&file_type) {
        return Err(QrError::parse("bbqr header", format!("unknown file type '{file_type}'")));
    }

    let total = base36(&header[4..6])
        .ok_or_else(|| QrError::parse("bbqr header", "invalid base-36 total"))?;
    let index = base36(&header[6..8])
        .ok_or_else(|| QrError::parse("bbqr header", "invalid base-36 index"))?;

    if total == 0 || index >= total {
        return Err(QrError::parse(
            "bbqr header",
            format!("index {index} out of range for total {total}"),
        ));
    }

    Ok((BbqrHeader { encoding, file_type, total, index }, &text[8..]))
}

fn base36(s: &str) -> Option<usize> {
    usize::from_str_radix(s, 36).ok()
}
