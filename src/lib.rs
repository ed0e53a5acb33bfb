//! # Connector Builder
//!
//! Backend for building declarative API connectors interactively: resolve a
//! manifest, list its streams, and run bounded test reads whose output is
//! grouped by slice and page.
//!
//! ## Features
//!
//! - **Manifest Resolution**: `#/` references, `$ref` merges, `$parameters`
//!   propagation and implicit component types
//! - **Bounded Test Reads**: hard caps on records, slices and pages per slice,
//!   with retries disabled
//! - **Message Grouping**: request/response/slice markers folded into a
//!   `StreamRead` report with an inferred schema
//! - **Declarative Components**: HTTP requester, authenticators, paginators,
//!   partition routers, record selection and transformations
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use connector_builder::builder::handle_request;
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> connector_builder::Result<()> {
//!     let config = json!({
//!         "__command": "list_streams",
//!         "__injected_declarative_manifest": manifest,
//!     });
//!     let message = handle_request(config, None).await?;
//!     println!("{}", serde_json::to_string(&message)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Builder Commands                         │
//! │  resolve_manifest      list_streams      test_read → StreamRead │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │ Manifest │ Retriever │   Paginate    │ Partition │  Extractor  │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Refs     │ Simple    │ Cursor        │ List      │ Dpath       │
//! │ Params   │ Bounded   │ Offset        │ DateTime  │ Filter      │
//! │ Types    │           │ Page Number   │           │ Transform   │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Manifest loading and reference resolution
pub mod manifest;

/// Template interpolation
pub mod template;

/// Protocol messages, catalogs and sinks
pub mod protocol;

/// Authentication implementations
pub mod auth;

/// HTTP client with retry and rate limiting
pub mod http;

/// Pagination strategies
pub mod pagination;

/// Partition routing
pub mod partition;

/// Response decoding, record selection and transformations
pub mod extractor;

/// Record retrievers, plain and bounded
pub mod retriever;

/// Declarative components built from a manifest
pub mod declarative;

/// Schema inference from JSON data
pub mod schema;

/// Connector builder commands
pub mod builder;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

pub use builder::{handle_request, StreamRead, TestReadLimits};
pub use manifest::{load_manifest, resolve_manifest};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
