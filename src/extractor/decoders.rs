//! Response body decoders

use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Turns a response body into JSON
pub trait Decoder: Send + Sync + std::fmt::Debug {
    /// Decode `body`
    fn decode(&self, body: &str) -> Result<Value>;
}

// ============================================================================
// JSON Decoder
// ============================================================================

/// Plain JSON bodies. An empty body decodes to an empty object.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl Decoder for JsonDecoder {
    fn decode(&self, body: &str) -> Result<Value> {
        if body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        serde_json::from_str(body)
            .map_err(|e| Error::decode(format!("Failed to parse JSON: {e}")))
    }
}

// ============================================================================
// JSONL Decoder
// ============================================================================

/// JSON Lines bodies, decoded to an array
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonlDecoder;

impl Decoder for JsonlDecoder {
    fn decode(&self, body: &str) -> Result<Value> {
        let mut records = Vec::new();

        for (line_num, line) in body.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value = serde_json::from_str(line).map_err(|e| {
                Error::decode(format!("Failed to parse JSONL at line {}: {e}", line_num + 1))
            })?;
            records.push(value);
        }

        Ok(Value::Array(records))
    }
}
