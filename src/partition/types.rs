//! Partition types and traits

use crate::error::Result;
use crate::http::RequestConfig;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One partition of a stream, as key/value pairs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamSlice(Map<String, Value>);

impl StreamSlice {
    /// The empty slice used by unpartitioned streams
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Get a value
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Whether the slice carries no values
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The slice as a JSON object
    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }
}

impl From<Map<String, Value>> for StreamSlice {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Slices in read order, produced on demand
pub type Slices<'a> = Box<dyn Iterator<Item = Result<StreamSlice>> + Send + 'a>;

/// Splits a stream into slices
pub trait PartitionRouter: Send + Sync + std::fmt::Debug {
    /// All slices, in read order. Nothing past the last slice taken is built.
    fn stream_slices(&self) -> Slices<'_>;

    /// Add the options a slice contributes to its requests
    fn request_options(&self, _slice: &StreamSlice, _request: &mut RequestConfig) -> Result<()> {
        Ok(())
    }
}
