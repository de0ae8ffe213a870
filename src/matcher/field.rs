//! Field selection: allow-list matching and the heuristic fallback.

use crate::codec::{self, Operation};
use crate::config::TransformConfig;
use crate::path;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Pattern recognizing HTML-ish tags like `<p>` or `</div>`.
static HTML_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").unwrap());

/// Plain text at or below this length is left alone in heuristic mode
/// unless it carries an HTML tag.
const HEURISTIC_MIN_LEN: usize = 10;

/// Decide whether the value at `key` / `field_path` should be
/// transformed.
///
/// The exclude list is checked by the caller before this runs and
/// always wins over the allow-list.
pub fn should_transform(
    key: &str,
    value: &Value,
    field_path: &str,
    operation: Operation,
    config: &TransformConfig,
) -> bool {
    if !config.fields.is_empty() {
        return matches_allow_list(key, field_path, &config.fields);
    }
    heuristic_match(value, operation)
}

/// Allow-list matching: a single-segment entry matches its key at any
/// depth; a multi-segment entry must equal the whole normalized path.
/// There is no prefix matching.
fn matches_allow_list(key: &str, field_path: &str, fields: &[String]) -> bool {
    let candidate = path::normalize(field_path);
    fields.iter().any(|field| {
        let segments = path::normalize(field);
        match segments.as_slice() {
            [single] => single == key,
            _ => !segments.is_empty() && segments == candidate,
        }
    })
}

/// Heuristic mode, used only when no allow-list is configured. Only
/// string values are candidates.
fn heuristic_match(value: &Value, operation: Operation) -> bool {
    let Value::String(text) = value else {
        return false;
    };

    match operation {
        Operation::Encode => {
            codec::find_payload(text).is_none()
                && (text.len() > HEURISTIC_MIN_LEN || HTML_TAG_REGEX.is_match(text))
        }
        Operation::Decode => codec::find_payload(text).is_some(),
    }
}
