//! Configured catalog types

use crate::types::{DestinationSyncMode, SyncMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The set of streams a read should cover
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredCatalog {
    /// Configured streams, in read order
    pub streams: Vec<ConfiguredStream>,
}

impl ConfiguredCatalog {
    /// Catalog selecting a single stream in full refresh mode
    pub fn single(name: impl Into<String>) -> Self {
        Self {
            streams: vec![ConfiguredStream {
                stream: AirbyteStream::new(name),
                sync_mode: SyncMode::FullRefresh,
                destination_sync_mode: DestinationSyncMode::Overwrite,
            }],
        }
    }

    /// Name of the first configured stream
    pub fn first_stream_name(&self) -> Option<&str> {
        self.streams.first().map(|s| s.stream.name.as_str())
    }
}

/// A stream selected for reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiguredStream {
    /// Stream description
    pub stream: AirbyteStream,
    /// How the source reads it
    #[serde(default)]
    pub sync_mode: SyncMode,
    /// How a destination would write it
    #[serde(default)]
    pub destination_sync_mode: DestinationSyncMode,
}

/// Stream description inside a catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AirbyteStream {
    /// Stream name
    pub name: String,
    /// Declared JSON schema
    #[serde(default)]
    pub json_schema: Value,
    /// Sync modes the stream supports
    #[serde(default)]
    pub supported_sync_modes: Vec<SyncMode>,
}

impl AirbyteStream {
    /// Describe a stream by name only
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            json_schema: Value::Object(serde_json::Map::new()),
            supported_sync_modes: vec![SyncMode::FullRefresh],
        }
    }
}
