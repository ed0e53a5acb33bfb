//! Declarative sources
//!
//! Builds runnable streams from a resolved manifest.
//!
//! # Overview
//!
//! - `ComponentFactory` - dispatches resolved component nodes on their type
//! - `DeclarativeStream` - a named stream over a retriever
//! - `ManifestSource` - the manifest, its cached resolution and its streams
//!
//! Supported components:
//! - Requesters: `HttpRequester`
//! - Auth: `NoAuth`, `ApiKeyAuthenticator`, `BearerAuthenticator`, `BasicHttpAuthenticator`
//! - Pagination: `NoPagination`, `DefaultPaginator` with `CursorPagination`,
//!   `OffsetIncrement` or `PageIncrement`
//! - Partitioning: `ListPartitionRouter`, `DatetimeBasedCursor` windows
//! - Selection: `RecordSelector`, `DpathExtractor`, `RecordFilter`,
//!   `JsonDecoder`, `JsonlDecoder`, `AddFields`, `RemoveFields`

mod factory;
mod models;
mod source;
mod stream;

pub use factory::ComponentFactory;
pub use source::{ManifestSource, Source};
pub use stream::{DeclarativeStream, SourceStream, SLICE_PREFIX};

#[cfg(test)]
mod tests;
