//! Base64 payload detection.
//!
//! A loose base64 regex alone is not enough: plain English text can
//! accidentally satisfy it. A candidate is only accepted if it decodes
//! to mostly-printable text that re-encodes to the same characters.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use std::sync::LazyLock;

/// Full-string base64 pattern.
static WHOLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9+/]+={0,2}$").unwrap());

/// Embedded run of base64-alphabet characters.
static SEGMENT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z0-9+/]{12,}").unwrap());

/// Minimum length for a whole-string candidate.
const MIN_WHOLE_LEN: usize = 8;

/// Minimum fraction of printable bytes in an accepted decode.
const MIN_PRINTABLE_RATIO: f64 = 0.85;

/// A detected payload: the matched substring and its decoded text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base64Payload {
    /// The substring that decoded successfully
    pub candidate: String,
    /// Its decoded text
    pub decoded: String,
}

/// Find a round-trippable base64 payload in `raw`.
///
/// The whole trimmed string is tried first; failing that, embedded runs
/// of at least twelve base64 characters are tried in order and the
/// first accepted one wins. `None` means `raw` is ordinary text and
/// must be left alone.
pub fn find_payload(raw: &str) -> Option<Base64Payload> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if trimmed.len() >= MIN_WHOLE_LEN && WHOLE_REGEX.is_match(trimmed) {
        if let Some(decoded) = decode_candidate(trimmed) {
            return Some(Base64Payload {
                candidate: trimmed.to_string(),
                decoded,
            });
        }
    }

    for segment in SEGMENT_REGEX.find_iter(trimmed) {
        let candidate = segment.as_str();
        if let Some(decoded) = decode_candidate(candidate) {
            return Some(Base64Payload {
                candidate: candidate.to_string(),
                decoded,
            });
        }
    }

    None
}

/// Validate and decode a single candidate.
///
/// Acceptance requires valid base64, valid UTF-8, a printable-byte
/// ratio of at least [`MIN_PRINTABLE_RATIO`], and that re-encoding the
/// decoded text reproduces the candidate up to trailing `=` padding.
fn decode_candidate(candidate: &str) -> Option<String> {
    let bytes = STANDARD.decode(pad(candidate).as_bytes()).ok()?;
    if bytes.is_empty() {
        return None;
    }

    let printable = bytes.iter().filter(|b| is_text_byte(**b)).count();
    if (printable as f64) / (bytes.len() as f64) < MIN_PRINTABLE_RATIO {
        return None;
    }

    let decoded = String::from_utf8(bytes).ok()?;
    let reencoded = STANDARD.encode(decoded.as_bytes());
    if reencoded.trim_end_matches('=') == candidate.trim_end_matches('=') {
        Some(decoded)
    } else {
        None
    }
}

/// Pad a candidate to a multiple of four with `=`.
///
/// A remainder of one would need three padding characters, which no
/// valid base64 string has; the decode rejects it downstream.
fn pad(candidate: &str) -> String {
    match candidate.len() % 4 {
        0 => candidate.to_string(),
        rem => format!("{candidate}{}", "=".repeat(4 - rem)),
    }
}

/// Tab, LF, CR and the visible ASCII range.
fn is_text_byte(byte: u8) -> bool {
    matches!(byte, 9 | 10 | 13 | 32..=126)
}
