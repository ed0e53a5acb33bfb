//! Sources

use super::factory::ComponentFactory;
use super::stream::SourceStream;
use crate::builder::TestReadLimits;
use crate::error::{Error, Result, ResultExt};
use crate::manifest::resolve_manifest;
use crate::protocol::{ConfiguredCatalog, Message, MessageSink};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde_json::Value;
use tracing::{debug, info, warn};

/// A configured connector
#[async_trait]
pub trait Source: Send + Sync {
    /// The manifest after reference resolution
    fn resolved_manifest(&self) -> Result<&Value>;

    /// Every stream the source declares
    fn streams(&self) -> Result<Vec<Box<dyn SourceStream>>>;

    /// Read the catalog's streams in order.
    ///
    /// A stream failing mid-read is reported to `sink` as a `TRACE` message
    /// and ends the read; failures before any stream starts are returned.
    async fn read(&self, catalog: &ConfiguredCatalog, sink: &mut dyn MessageSink) -> Result<()> {
        let streams = self.streams()?;

        for configured in &catalog.streams {
            let name = configured.stream.name.as_str();
            let stream = streams
                .iter()
                .find(|s| s.name() == name)
                .ok_or_else(|| Error::StreamNotFound {
                    stream: name.to_string(),
                })?;

            info!(stream = name, "Reading stream");
            match stream.read(sink).await {
                Ok(flow) if flow.is_break() => {
                    info!(stream = name, "Read stopped by consumer");
                    return Ok(());
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(stream = name, error = %e, "Stream read failed");
                    let flow = sink.emit(Message::trace_from_error(e.to_string(), &e));
                    debug!(stream = name, stopped = flow.is_break(), "Reported stream failure");
                    return Ok(());
                }
            }
        }
        Ok(())
    }
}

/// Source built from a declarative manifest
#[derive(Debug)]
pub struct ManifestSource {
    manifest: Value,
    factory: ComponentFactory,
    resolved: OnceCell<Value>,
}

impl ManifestSource {
    /// Create a source from a raw manifest and the connector config
    pub fn new(manifest: Value, config: Value) -> Self {
        Self {
            manifest,
            factory: ComponentFactory::new(config),
            resolved: OnceCell::new(),
        }
    }

    /// Bound every stream's retriever by `limits`
    #[must_use]
    pub fn with_limits(mut self, limits: TestReadLimits) -> Self {
        self.factory = self.factory.with_limits(limits);
        self
    }

    /// The component factory
    pub fn factory(&self) -> &ComponentFactory {
        &self.factory
    }
}

#[async_trait]
impl Source for ManifestSource {
    fn resolved_manifest(&self) -> Result<&Value> {
        self.resolved.get_or_try_init(|| resolve_manifest(&self.manifest))
    }

    fn streams(&self) -> Result<Vec<Box<dyn SourceStream>>> {
        let streams = self
            .resolved_manifest()?
            .get("streams")
            .and_then(Value::as_array)
            .ok_or_else(|| Error::invalid_component("DeclarativeSource", "streams must be a list"))?;

        streams
            .iter()
            .enumerate()
            .map(|(i, node)| {
                let stream = self
                    .factory
                    .create_stream(node)
                    .with_context(|| format!("Failed to build stream {i}"))?;
                Ok(Box::new(stream) as Box<dyn SourceStream>)
            })
            .collect()
    }
}
