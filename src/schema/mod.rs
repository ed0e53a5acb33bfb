//! Schema inference module
//!
//! Infers the JSON schema of a test read's records, one record at a time.
//!
//! # Features
//!
//! - **Type Inference**: Infers types from JSON values
//! - **Incremental Merging**: Widens the schema as records arrive
//! - **Nullable Fields**: Every property admits `null`
//! - **Nested Object Support**: Handles nested objects and arrays recursively

mod inference;
mod types;

pub use inference::SchemaInferrer;
pub use types::{JsonSchema, JsonType, JsonTypeOrArray, SchemaProperty, SCHEMA_DRAFT};

#[cfg(test)]
mod tests;
