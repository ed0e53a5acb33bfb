//! Manifest loading
//!
//! Manifests are authored in YAML; JSON is accepted as the YAML subset it is.

use crate::error::{Error, Result};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Load a manifest document from a file
pub fn load_manifest(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound {
                path: path.display().to_string(),
            }
        } else {
            Error::config(format!(
                "Failed to read manifest file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_manifest_from_str(&content)
}

/// Parse a manifest document from a YAML string
pub fn load_manifest_from_str(yaml: &str) -> Result<Value> {
    let manifest: Value = serde_yaml::from_str(yaml)?;
    if !manifest.is_object() {
        return Err(Error::config("Manifest must be a YAML mapping"));
    }
    Ok(manifest)
}
