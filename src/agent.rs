//! Transform agent implementation.
//!
//! The agent owns the live configuration and exposes the boundary
//! entry points: request-body and query-string decoding on the way in,
//! response-body encoding on the way out. Every entry point is
//! fail-open for codec-level trouble; only the tree depth guard
//! rejects a payload.

use crate::codec::{self, Operation};
use crate::config::{ConfigUpdate, TransformConfig};
use crate::matcher;
use crate::transformer::{self, TransformError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Payload transform agent.
///
/// Wraps the engine with process-wide configuration and counters.
/// Configuration updates replace the whole config atomically; every
/// call captures its own snapshot up front, so a concurrent update is
/// never observed mid-transform.
pub struct TransformAgent {
    /// Live configuration, replaced wholesale on update
    config: RwLock<Arc<TransformConfig>>,
    /// Metrics: total transform calls seen
    requests_total: AtomicU64,
    /// Metrics: calls that ran the engine (route not exempt)
    requests_transformed: AtomicU64,
    /// Metrics: payloads rejected by the depth guard
    transform_errors: AtomicU64,
}

/// Point-in-time metrics snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgentMetrics {
    pub requests_total: u64,
    pub requests_transformed: u64,
    pub transform_errors: u64,
}

impl TransformAgent {
    /// Create a new transform agent from configuration.
    pub fn new(config: TransformConfig) -> Self {
        info!(
            fields = config.fields.len(),
            excluded = config.exclude.len(),
            heuristic_mode = config.fields.is_empty(),
            "Transform agent initialized"
        );

        Self {
            config: RwLock::new(Arc::new(config)),
            requests_total: AtomicU64::new(0),
            requests_transformed: AtomicU64::new(0),
            transform_errors: AtomicU64::new(0),
        }
    }

    /// Create from a YAML configuration string.
    pub fn from_yaml(yaml: &str) -> Result<Self, AgentError> {
        let config: TransformConfig = serde_yaml::from_str(yaml)?;
        Ok(Self::new(config))
    }

    /// Create from a JSON configuration string.
    pub fn from_json(json: &str) -> Result<Self, AgentError> {
        let config: TransformConfig = serde_json::from_str(json)?;
        Ok(Self::new(config))
    }

    /// Snapshot of the live configuration.
    pub async fn config(&self) -> Arc<TransformConfig> {
        self.config.read().await.clone()
    }

    /// Apply a partial configuration update atomically.
    ///
    /// The merged result replaces the live config as one new instance;
    /// in-flight calls keep the snapshot they captured at entry.
    pub async fn update_config(&self, update: ConfigUpdate) {
        let mut live = self.config.write().await;
        let merged = live.merged(update);
        info!(
            fields = merged.fields.len(),
            excluded = merged.exclude.len(),
            "Applied configuration update"
        );
        *live = Arc::new(merged);
    }

    /// Decode an inbound request body.
    pub async fn decode_request(&self, route: &str, body: &Value) -> Result<Value, TransformError> {
        self.transform_body(route, body, Operation::Decode).await
    }

    /// Encode an outbound response body.
    pub async fn encode_response(&self, route: &str, body: &Value) -> Result<Value, TransformError> {
        self.transform_body(route, body, Operation::Encode).await
    }

    /// Decode an inbound query string into parameters.
    ///
    /// Parameters are decoded per the same field rules as body keys;
    /// a route exemption returns them merely parsed.
    pub async fn decode_query_params(
        &self,
        route: &str,
        query: Option<&str>,
    ) -> HashMap<String, Vec<String>> {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let config = self.config.read().await.clone();

        let params = parse_query_string(query);
        if !matcher::route_applies(route, &config.routes) {
            debug!(route, "Route exempt from query transformation");
            return params;
        }

        self.requests_transformed.fetch_add(1, Ordering::Relaxed);
        params
            .into_iter()
            .map(|(key, values)| {
                if config.is_excluded(&key, &key) {
                    return (key, values);
                }
                let decoded = values
                    .iter()
                    .map(|raw| decode_param(&key, raw, &config))
                    .collect();
                (key, decoded)
            })
            .collect()
    }

    /// Point-in-time metrics.
    pub fn metrics(&self) -> AgentMetrics {
        AgentMetrics {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_transformed: self.requests_transformed.load(Ordering::Relaxed),
            transform_errors: self.transform_errors.load(Ordering::Relaxed),
        }
    }

    async fn transform_body(
        &self,
        route: &str,
        body: &Value,
        operation: Operation,
    ) -> Result<Value, TransformError> {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        let config = self.config.read().await.clone();

        if !matcher::route_applies(route, &config.routes) {
            debug!(route, "Route exempt from transformation");
            return Ok(body.clone());
        }

        match transformer::transform(body, operation, &config) {
            Ok(transformed) => {
                self.requests_transformed.fetch_add(1, Ordering::Relaxed);
                Ok(transformed)
            }
            Err(err) => {
                self.transform_errors.fetch_add(1, Ordering::Relaxed);
                warn!(route, error = %err, "Payload rejected");
                Err(err)
            }
        }
    }
}

/// Decode one query parameter value if the field rules select it.
fn decode_param(key: &str, raw: &str, config: &TransformConfig) -> String {
    let value = Value::String(raw.to_string());
    if !matcher::should_transform(key, &value, key, Operation::Decode, config) {
        return raw.to_string();
    }
    match codec::decode_value(&value) {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Parse query string into parameter map.
fn parse_query_string(query: Option<&str>) -> HashMap<String, Vec<String>> {
    let mut params: HashMap<String, Vec<String>> = HashMap::new();

    if let Some(qs) = query {
        for part in qs.split('&') {
            if let Some((k, v)) = part.split_once('=') {
                let key = urlencoding::decode(k)
                    .unwrap_or_else(|_| k.into())
                    .to_string();
                let value = urlencoding::decode(v)
                    .unwrap_or_else(|_| v.into())
                    .to_string();
                params.entry(key).or_default().push(value);
            } else if !part.is_empty() {
                let key = urlencoding::decode(part)
                    .unwrap_or_else(|_| part.into())
                    .to_string();
                params.entry(key).or_default().push(String::new());
            }
        }
    }

    params
}

/// Transform agent errors.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
