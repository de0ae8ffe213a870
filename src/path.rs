//! Structural field path handling.

use regex::Regex;
use std::sync::LazyLock;

/// Regex for array index segments like `[0]`.
static INDEX_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\d+\]").unwrap());

/// Normalize a traversal path into its comparable segments.
///
/// Array indices are erased, so `a[3].b` and `a[7].b` both normalize to
/// `["a", "b"]`.
pub fn normalize(path: &str) -> Vec<String> {
    INDEX_REGEX
        .replace_all(path, "")
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Extend a dotted traversal path with an object key.
pub fn child(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

/// Extend a traversal path with an array index.
pub fn indexed(path: &str, index: usize) -> String {
    format!("{path}[{index}]")
}
