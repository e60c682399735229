//! Serialization of personalization state to transport-safe strings.
//!
//! Encoding is strict; decoding is deliberately lenient. A missing, empty,
//! or corrupt stored blob decodes to an empty map so callers treat "no prior
//! config" and "corrupt config" identically — a mangled cookie must reset
//! personalization to defaults, never crash the request.

mod envelope;

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::config::ConfigMap;

pub use envelope::Envelope;

/// Encode-side failure. Decoding never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecError(String);

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "config encode error: {}", self.0)
    }
}

impl std::error::Error for CodecError {}

/// Serialize a value to its stored string form.
pub fn encode<T: Serialize>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(|e| CodecError(e.to_string()))
}

/// Decode a stored string into a config map.
///
/// Empty, malformed, and non-object input all yield an empty map.
pub fn decode(raw: &str) -> ConfigMap {
    if raw.is_empty() {
        return ConfigMap::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => ConfigMap::new(),
    }
}

/// Decode a stored string into a typed value, treating failure as absence.
pub fn decode_as<T: serde::de::DeserializeOwned>(raw: &str) -> Option<T> {
    serde_json::from_str(raw).ok()
}
