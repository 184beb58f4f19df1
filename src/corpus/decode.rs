//! Byte-to-text decoding ladder for corpus files
//!
//! Corpus files come from spreadsheets saved with whatever encoding the
//! author's machine used. Decoding tries a fixed list of encodings in order
//! and never fails: if every candidate rejects the input, the bytes are
//! decoded as UTF-8 with U+FFFD substituted for invalid sequences.

use encoding_rs::SHIFT_JIS;
use serde::Serialize;
use std::fmt;

/// Encodings the ladder can settle on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    Utf8,
    /// Windows code page 932 (Shift_JIS with vendor extensions)
    Cp932,
    /// ISO-8859-1, every byte maps to the code point of the same value
    Latin1,
    /// UTF-8 with replacement characters; the last resort
    Utf8Lossy,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Cp932 => write!(f, "cp932"),
            TextEncoding::Latin1 => write!(f, "latin-1"),
            TextEncoding::Utf8Lossy => write!(f, "utf-8 (lossy)"),
        }
    }
}

/// Which candidate list to walk before falling back to lossy UTF-8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// UTF-8, then CP932
    #[default]
    Standard,
    /// UTF-8, then CP932, then Latin-1 (used by the corpus check tool)
    Strict,
}

impl DecodePolicy {
    /// Candidate encodings in the order they are attempted
    pub fn candidates(self) -> &'static [TextEncoding] {
        match self {
            DecodePolicy::Standard => &[TextEncoding::Utf8, TextEncoding::Cp932],
            DecodePolicy::Strict => &[
                TextEncoding::Utf8,
                TextEncoding::Cp932,
                TextEncoding::Latin1,
            ],
        }
    }
}

/// What the ladder did with one input
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeReport {
    /// Size of the input before null stripping
    pub byte_len: usize,
    /// Number of 0x00 bytes removed before decoding
    pub nulls_stripped: usize,
    /// Encoding that produced the text
    pub encoding: TextEncoding,
    /// Candidates that rejected the input, in the order tried
    pub rejected: Vec<TextEncoding>,
}

impl DecodeReport {
    /// True when no candidate accepted the input and replacement characters may be present
    pub fn used_lossy_fallback(&self) -> bool {
        self.encoding == TextEncoding::Utf8Lossy
    }
}

/// Remove every embedded null byte, returning the cleaned bytes and how many were dropped
pub fn strip_nulls(bytes: &[u8]) -> (Vec<u8>, usize) {
    let cleaned: Vec<u8> = bytes.iter().copied().filter(|&b| b != 0).collect();
    let stripped = bytes.len() - cleaned.len();
    (cleaned, stripped)
}

/// Strict decode with a single encoding; `None` when the bytes are not valid in it
fn try_decode(encoding: TextEncoding, bytes: &[u8]) -> Option<String> {
    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_owned),
        TextEncoding::Cp932 => SHIFT_JIS
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned()),
        TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        TextEncoding::Utf8Lossy => Some(String::from_utf8_lossy(bytes).into_owned()),
    }
}

/// Strip nulls and walk the ladder for `policy`
pub fn decode(bytes: &[u8], policy: DecodePolicy) -> (String, DecodeReport) {
    let (cleaned, nulls_stripped) = strip_nulls(bytes);
    let mut rejected = Vec::new();

    for &encoding in policy.candidates() {
        if let Some(text) = try_decode(encoding, &cleaned) {
            return (
                text,
                DecodeReport {
                    byte_len: bytes.len(),
                    nulls_stripped,
                    encoding,
                    rejected,
                },
            );
        }
        tracing::debug!(%encoding, "Corpus bytes rejected by candidate encoding");
        rejected.push(encoding);
    }

    let text = String::from_utf8_lossy(&cleaned).into_owned();
    (
        text,
        DecodeReport {
            byte_len: bytes.len(),
            nulls_stripped,
            encoding: TextEncoding::Utf8Lossy,
            rejected,
        },
    )
}
