//! Record extraction
//!
//! Supports: JSON, JSONL decoding; dpath field extraction; record filters;
//! AddFields / RemoveFields transformations
//!
//! # Overview
//!
//! A response body goes through the [`RecordSelector`]: the decoder parses
//! it, the [`DpathExtractor`] pulls out the record array, the optional
//! [`RecordFilter`] drops records, and transformations reshape the rest.

mod decoders;
mod dpath;
mod selector;
mod transformations;

pub use decoders::{Decoder, JsonDecoder, JsonlDecoder};
pub use dpath::DpathExtractor;
pub use selector::{RecordFilter, RecordSelector};
pub use transformations::{AddFields, AddedField, RecordTransformation, RemoveFields};
