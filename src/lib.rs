//! Transit-safe payload transformation for JSON API boundaries.
//!
//! This agent transparently re-encodes selected fields of outgoing JSON
//! responses and decodes the same fields on incoming requests, so that
//! rich learner-authored text (HTML snippets, free text, answer
//! choices) survives transit through intermediate proxies and filters
//! unmangled:
//!
//! - Recursive walk of arbitrary JSON trees with structural path
//!   tracking
//! - Heuristic detection of encoded payloads (round-trip validated
//!   base64, printable-text ratio)
//! - Layered decoding bounded at five nested layers
//! - Field allow-list with depth wildcards, exclude list, route
//!   include/exclude prefixes
//! - Fail-open: a codec failure keeps the original data
//!
//! ## Configuration Example
//!
//! ```yaml
//! fields:
//!   - learnerTextResponse
//!   - questions.scoring.rubrics.rubricQuestion
//! exclude:
//!   - id
//! routes:
//!   exclude:
//!     - /health
//! ```

pub mod agent;
pub mod codec;
pub mod config;
pub mod matcher;
pub mod path;
pub mod transformer;

pub use agent::{AgentError, AgentMetrics, TransformAgent};
pub use codec::Operation;
pub use config::{ConfigUpdate, TransformConfig};
pub use transformer::{transform, TransformError};
