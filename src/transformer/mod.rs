//! Payload tree transformation.

mod tree;

pub use tree::{transform, TransformError};
