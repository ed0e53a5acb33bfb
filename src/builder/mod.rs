//! Connector builder
//!
//! The three commands a connector developer runs against a manifest while
//! building it: `resolve_manifest`, `list_streams` and `test_read`.
//!
//! # Overview
//!
//! - `handle_request` - parse a request config and dispatch its command
//! - `MessageGrouper` - fold a read's messages into a [`StreamRead`]
//! - `TestReadLimits` - caps on records, slices and pages

mod grouper;
mod handler;
mod limits;
mod types;

pub use grouper::{group, group_stream, MessageGrouper};
pub use handler::{
    handle_connector_builder_request, handle_request, list_streams, read_stream,
    resolve_manifest, BuilderRequest, Command, LIST_STREAMS_ERROR, NOT_DECLARATIVE_STREAM,
    NOT_HTTP_RETRIEVER, RESOLVE_MANIFEST_ERROR,
};
pub use limits::{
    get_limits, TestReadLimits, DEFAULT_MAX_PAGES_PER_SLICE, DEFAULT_MAX_RECORDS,
    DEFAULT_MAX_SLICES,
};
pub use types::{HttpRequest, HttpResponse, StreamRead, StreamReadPage, StreamReadSlice};
