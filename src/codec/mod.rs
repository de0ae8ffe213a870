//! Transit-layer codec: single-layer encode, layered decode.

mod detector;

pub use detector::{find_payload, Base64Payload};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::debug;

/// Marker prefix of a pre-compressed envelope. Recognized on decode,
/// never produced by [`encode_value`].
pub const COMPRESSED_PREFIX: &str = "comp:";

/// Maximum number of encoding layers peeled by a single decode.
pub const MAX_DECODE_DEPTH: usize = 5;

/// Direction of a transform pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// Outbound: wrap matched fields for transit
    Encode,
    /// Inbound: recover matched fields from transit form
    Decode,
}

/// Encode a value to one transport layer.
///
/// Strings are encoded directly; any other value is serialized to JSON
/// first so the decode side can recover the structure.
pub fn encode_value(value: &Value) -> Value {
    let encoded = match value {
        Value::String(text) => STANDARD.encode(text.as_bytes()),
        other => STANDARD.encode(other.to_string().as_bytes()),
    };
    Value::String(encoded)
}

/// Decode a value, peeling up to [`MAX_DECODE_DEPTH`] encoding layers.
///
/// Non-strings pass through untouched, as does any string in which no
/// payload is detected. This function never errors: a malformed
/// envelope falls back to the original value.
pub fn decode_value(value: &Value) -> Value {
    let Value::String(raw) = value else {
        return value.clone();
    };

    if let Some(body) = raw.strip_prefix(COMPRESSED_PREFIX) {
        return match decode_envelope(body) {
            Some(decoded) => decoded,
            None => {
                debug!("malformed compressed envelope, keeping original value");
                value.clone()
            }
        };
    }

    let (text, peeled) = decode_layers(raw);
    if peeled {
        parse_or_string(text)
    } else {
        value.clone()
    }
}

/// Peel nested encoding layers until no further payload is detected,
/// the decoded text stops changing, or the depth bound is reached.
///
/// Returns the final text and whether any layer was removed. Hitting
/// the depth bound is not an error; the best-effort partial result is
/// returned.
fn decode_layers(raw: &str) -> (String, bool) {
    let mut current = raw.to_string();
    let mut peeled = false;

    for _ in 0..MAX_DECODE_DEPTH {
        match find_payload(&current) {
            Some(payload) if payload.decoded != current => {
                current = payload.decoded;
                peeled = true;
            }
            _ => break,
        }
    }

    (current, peeled)
}

/// Decode the body of a `comp:` envelope: one unconditional base64
/// layer, then the generic layered loop.
fn decode_envelope(body: &str) -> Option<Value> {
    let bytes = STANDARD.decode(body.as_bytes()).ok()?;
    let text = String::from_utf8(bytes).ok()?;
    let (decoded, _) = decode_layers(&text);
    Some(parse_or_string(decoded))
}

/// Recover structure that the encode side stringified, falling back to
/// the plain string.
fn parse_or_string(text: String) -> Value {
    match serde_json::from_str(&text) {
        Ok(value) => value,
        Err(_) => Value::String(text),
    }
}
