//! Retriever trait

use crate::error::Result;
use crate::http::HttpRequester;
use crate::partition::{Slices, StreamSlice};
use crate::protocol::MessageSink;
use async_trait::async_trait;
use std::ops::ControlFlow;

/// Fetches the records of a stream, one slice at a time
#[async_trait]
pub trait Retriever: Send + Sync + std::fmt::Debug {
    /// Slices to read, in order
    fn stream_slices(&self) -> Slices<'_>;

    /// Read every page of `slice`, pushing request/response logs and records
    /// into `sink`. Returns `Break` when the sink asked to stop.
    async fn read_records(
        &self,
        stream: &str,
        slice: &StreamSlice,
        sink: &mut dyn MessageSink,
    ) -> Result<ControlFlow<()>>;

    /// The HTTP requester, when this retriever talks HTTP
    fn requester(&self) -> Option<&HttpRequester>;
}
