//! Streams

use crate::error::Result;
use crate::protocol::{Message, MessageSink};
use crate::retriever::Retriever;
use async_trait::async_trait;
use serde_json::Value;
use std::ops::ControlFlow;
use tracing::debug;

/// Log prefix marking the start of a new slice
pub const SLICE_PREFIX: &str = "slice:";

/// A stream a source exposes
#[async_trait]
pub trait SourceStream: Send + Sync + std::fmt::Debug {
    /// Stream name
    fn name(&self) -> &str;

    /// The declarative stream behind this one, if it is one
    fn as_declarative(&self) -> Option<&DeclarativeStream>;

    /// Read every slice into `sink`. Returns `Break` when the sink asked to
    /// stop.
    async fn read(&self, sink: &mut dyn MessageSink) -> Result<ControlFlow<()>>;
}

/// A stream defined by a manifest
#[derive(Debug)]
pub struct DeclarativeStream {
    name: String,
    primary_key: Value,
    retriever: Box<dyn Retriever>,
}

impl DeclarativeStream {
    /// Create a stream around `retriever`
    pub fn new(name: impl Into<String>, retriever: Box<dyn Retriever>) -> Self {
        Self {
            name: name.into(),
            primary_key: Value::Null,
            retriever,
        }
    }

    /// Set the primary key
    #[must_use]
    pub fn with_primary_key(mut self, primary_key: Value) -> Self {
        self.primary_key = primary_key;
        self
    }

    /// Primary key as written in the manifest
    pub fn primary_key(&self) -> &Value {
        &self.primary_key
    }

    /// The retriever
    pub fn retriever(&self) -> &dyn Retriever {
        self.retriever.as_ref()
    }
}

#[async_trait]
impl SourceStream for DeclarativeStream {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_declarative(&self) -> Option<&DeclarativeStream> {
        Some(self)
    }

    async fn read(&self, sink: &mut dyn MessageSink) -> Result<ControlFlow<()>> {
        for slice in self.retriever.stream_slices() {
            let slice = slice?;
            if !slice.is_empty() {
                let marker = format!("{SLICE_PREFIX}{}", serde_json::to_string(&slice)?);
                if sink.emit(Message::info(marker)).is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }

            debug!(stream = %self.name, ?slice, "Reading slice");
            if self
                .retriever
                .read_records(&self.name, &slice, sink)
                .await?
                .is_break()
            {
                return Ok(ControlFlow::Break(()));
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}
