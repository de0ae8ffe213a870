//! Configuration types for the payload transform agent.

use crate::path;
use serde::{Deserialize, Serialize};

/// Main configuration for the transform agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Configuration version
    pub version: String,
    /// Engine settings
    pub settings: Settings,
    /// Field allow-list: dotted field paths. A single-segment entry
    /// matches its key at any depth; a multi-segment entry must match
    /// the whole normalized path. An empty list enables heuristic mode.
    pub fields: Vec<String>,
    /// Keys and paths that are never transformed. Wins over `fields`.
    pub exclude: Vec<String>,
    /// Route prefixes controlling where transformation applies.
    pub routes: RouteRules,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            settings: Settings::default(),
            fields: vec![],
            exclude: vec![],
            routes: RouteRules::default(),
        }
    }
}

/// Engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Maximum nesting depth accepted from a payload tree. Deeper
    /// input is rejected rather than silently truncated.
    pub max_tree_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self { max_tree_depth: 64 }
    }
}

/// Route include/exclude prefixes.
///
/// Exclude prefixes win. A non-empty include list restricts
/// transformation to matching routes; with neither, every route is
/// transformed.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RouteRules {
    /// Route prefixes to transform (empty = all)
    pub include: Vec<String>,
    /// Route prefixes to skip entirely
    pub exclude: Vec<String>,
}

/// Partial configuration accepted by the update operation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigUpdate {
    pub version: Option<String>,
    pub settings: Option<Settings>,
    pub fields: Option<Vec<String>>,
    pub exclude: Option<Vec<String>>,
    pub routes: Option<RouteRules>,
}

impl TransformConfig {
    /// Produce a new configuration with `update` shallow-merged in.
    ///
    /// Sections present in the update replace their counterparts
    /// wholesale; absent sections are retained. The live configuration
    /// is never mutated in place.
    pub fn merged(&self, update: ConfigUpdate) -> Self {
        Self {
            version: update.version.unwrap_or_else(|| self.version.clone()),
            settings: update.settings.unwrap_or_else(|| self.settings.clone()),
            fields: update.fields.unwrap_or_else(|| self.fields.clone()),
            exclude: update.exclude.unwrap_or_else(|| self.exclude.clone()),
            routes: update.routes.unwrap_or_else(|| self.routes.clone()),
        }
    }

    /// True when `key` or the normalized `field_path` is excluded.
    pub fn is_excluded(&self, key: &str, field_path: &str) -> bool {
        if self.exclude.is_empty() {
            return false;
        }
        let candidate = path::normalize(field_path);
        self.exclude
            .iter()
            .any(|entry| entry == key || path::normalize(entry) == candidate)
    }
}
