//! Declarative manifest handling
//!
//! # Overview
//!
//! A manifest is a YAML/JSON document describing a source as a tree of typed
//! components. Before components can be built the manifest is resolved:
//!
//! - references (`#/definitions/x`, `*ref(definitions.x)`, `$ref`) are
//!   replaced by independent copies of their targets
//! - components without a `type` get the implicit type of their field
//! - `$parameters` flow down into every component below the one declaring
//!   them, without overwriting fields a component sets itself

mod loader;
mod references;
mod resolver;
mod types;

pub use loader::{load_manifest, load_manifest_from_str};
pub use references::{is_reference, lookup, parse_reference, ReferenceStack};
pub use resolver::resolve_manifest;
pub use types::{
    default_type, is_schema_type, Parameters, PARAMETERS_KEY, REF_KEY, ROOT_TYPE, TYPE_KEY,
};

#[cfg(test)]
mod tests;
