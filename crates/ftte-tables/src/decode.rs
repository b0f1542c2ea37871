//! Adaptive text decoding for table bytes.
//!
//! Inventory exports come from a tool chain that has produced UTF-8 and
//! Latin-1 files over the years, sometimes with a UTF-8 BOM glued to the
//! first header name. Decoding tries an ordered candidate list and keeps
//! the first encoding that decodes without error; the chosen encoding is
//! reported so a run log shows which variant a table was.

use std::borrow::Cow;

use crate::TableError;

/// Candidate encodings, tried in order.
///
/// Latin-1 is total over bytes, so with the default list decoding cannot
/// fail; the error path exists for narrowed candidate lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    Utf8,
    Latin1,
}

pub const DEFAULT_CANDIDATES: [Candidate; 2] = [Candidate::Utf8, Candidate::Latin1];

impl Candidate {
    pub fn name(self) -> &'static str {
        match self {
            Candidate::Utf8 => "utf-8",
            Candidate::Latin1 => "latin-1",
        }
    }

    /// Decode strictly: `None` means this candidate cannot represent the bytes.
    fn decode(self, bytes: &[u8]) -> Option<Cow<'_, str>> {
        match self {
            Candidate::Utf8 => match std::str::from_utf8(bytes) {
                Ok(text) => Some(Cow::Borrowed(text)),
                Err(_) => None,
            },
            // Every byte maps to U+00xx, same as the upstream tool's reader.
            Candidate::Latin1 => Some(encoding_rs::mem::decode_latin1(bytes)),
        }
    }
}

/// A decoded table body plus the encoding that produced it.
#[derive(Debug)]
pub struct DecodedTable<'a> {
    pub text: Cow<'a, str>,
    pub encoding: &'static str,
}

/// Decode table bytes with the default candidate list.
pub fn decode_table<'a>(table: &str, bytes: &'a [u8]) -> Result<DecodedTable<'a>, TableError> {
    decode_with(table, bytes, &DEFAULT_CANDIDATES)
}

/// Decode table bytes with an explicit candidate list, first success wins.
pub fn decode_with<'a>(
    table: &str,
    bytes: &'a [u8],
    candidates: &[Candidate],
) -> Result<DecodedTable<'a>, TableError> {
    for candidate in candidates {
        if let Some(text) = candidate.decode(bytes) {
            return Ok(DecodedTable {
                text,
                encoding: candidate.name(),
            });
        }
    }
    Err(TableError::Undecodable {
        table: table.to_string(),
    })
}

/// Infer the field delimiter from the header line: `;` if it occurs there,
/// else `,`.
pub fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text.lines().next().unwrap_or("");
    if first_line.contains(';') {
        b';'
    } else {
        b','
    }
}
