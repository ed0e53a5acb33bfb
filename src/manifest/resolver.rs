//! Manifest resolution
//!
//! Resolution is a single recursive descent over the manifest. At every node
//! references are expanded first; mappings that are components then get their
//! `type` filled in and their parameters pushed into themselves and their
//! sub-components.

use super::references::ReferenceStack;
use super::types::{default_type, is_schema_type, Parameters, PARAMETERS_KEY, ROOT_TYPE, TYPE_KEY};
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Produce the fully resolved form of a manifest.
///
/// The input is left untouched and the output shares no structure with it,
/// so two places that referenced the same definition can be changed
/// independently.
pub fn resolve_manifest(manifest: &Value) -> Result<Value> {
    let Value::Object(root) = manifest else {
        return Err(Error::resolution("", "manifest root must be a mapping"));
    };

    let mut resolver = Resolver {
        refs: ReferenceStack::new(manifest),
    };
    let resolved = resolver.resolve_component(root, ROOT_TYPE, &Parameters::new(), "")?;
    Ok(Value::Object(resolved))
}

struct Resolver<'a> {
    refs: ReferenceStack<'a>,
}

impl Resolver<'_> {
    // ========================================================================
    // Components
    // ========================================================================

    fn resolve_mapping(
        &mut self,
        map: &Map<String, Value>,
        inherited: &Parameters,
        field_id: &str,
        path: &str,
    ) -> Result<Map<String, Value>> {
        match map.get(TYPE_KEY) {
            Some(ty) if is_schema_type(ty) => self.copy_mapping(map, path),
            Some(Value::String(ty)) => self.resolve_component(map, ty, inherited, path),
            Some(_) => self.copy_mapping(map, path),
            None => match default_type(field_id) {
                Some(ty) => self.resolve_component(map, ty, inherited, path),
                None => self.copy_mapping(map, path),
            },
        }
    }

    fn resolve_component(
        &mut self,
        map: &Map<String, Value>,
        ty: &str,
        inherited: &Parameters,
        path: &str,
    ) -> Result<Map<String, Value>> {
        let mut params = inherited.clone();
        if let Some(own) = map.get(PARAMETERS_KEY) {
            let params_path = format!("{path}/{PARAMETERS_KEY}");
            match self.copy_node(own, &params_path)? {
                Value::Object(own) => params.extend(own),
                _ => {
                    return Err(Error::resolution(
                        params_path,
                        "$parameters must be a mapping",
                    ))
                }
            }
        }

        let mut out = Map::new();
        out.insert(TYPE_KEY.to_string(), Value::String(ty.to_string()));

        for (key, value) in map {
            if key == PARAMETERS_KEY || key == TYPE_KEY {
                continue;
            }
            let field_path = format!("{path}/{key}");
            let resolved = self.resolve_field(ty, key, value, &params, &field_path)?;
            out.insert(key.clone(), resolved);
        }

        // Parameters fill in fields the component does not set itself
        for (key, value) in &params {
            if out.contains_key(key) {
                continue;
            }
            let field_path = format!("{path}/{PARAMETERS_KEY}/{key}");
            let resolved = self.resolve_field(ty, key, value, &params, &field_path)?;
            out.insert(key.clone(), resolved);
        }

        if !params.is_empty() {
            out.insert(PARAMETERS_KEY.to_string(), Value::Object(params));
        }
        Ok(out)
    }

    fn resolve_field(
        &mut self,
        parent_type: &str,
        key: &str,
        value: &Value,
        params: &Parameters,
        path: &str,
    ) -> Result<Value> {
        let depth = self.refs.depth();
        let expanded = self.refs.expand(value, path)?;

        let resolved = match expanded.as_ref() {
            Value::Object(map) => {
                let field_id = format!("{parent_type}.{key}");
                let child_params = without(params, key);
                Value::Object(self.resolve_mapping(map, &child_params, &field_id, path)?)
            }
            Value::Array(items) => {
                let field_id = format!("{parent_type}.{key}");
                let child_params = without(params, key);
                Value::Array(
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| {
                            let item_path = format!("{path}/{i}");
                            self.resolve_element(item, &child_params, &field_id, &item_path)
                        })
                        .collect::<Result<_>>()?,
                )
            }
            scalar => scalar.clone(),
        };

        self.refs.truncate(depth);
        Ok(resolved)
    }

    fn resolve_element(
        &mut self,
        item: &Value,
        params: &Parameters,
        field_id: &str,
        path: &str,
    ) -> Result<Value> {
        let depth = self.refs.depth();
        let expanded = self.refs.expand(item, path)?;

        let resolved = match expanded.as_ref() {
            Value::Object(map) => Value::Object(self.resolve_mapping(map, params, field_id, path)?),
            other => self.copy_node(other, path)?,
        };

        self.refs.truncate(depth);
        Ok(resolved)
    }

    // ========================================================================
    // Plain values
    // ========================================================================

    /// Copy a value, expanding references but nothing else
    fn copy_node(&mut self, node: &Value, path: &str) -> Result<Value> {
        let depth = self.refs.depth();
        let expanded = self.refs.expand(node, path)?;

        let copied = match expanded.as_ref() {
            Value::Object(map) => Value::Object(self.copy_mapping(map, path)?),
            Value::Array(items) => Value::Array(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| self.copy_node(item, &format!("{path}/{i}")))
                    .collect::<Result<_>>()?,
            ),
            scalar => scalar.clone(),
        };

        self.refs.truncate(depth);
        Ok(copied)
    }

    fn copy_mapping(&mut self, map: &Map<String, Value>, path: &str) -> Result<Map<String, Value>> {
        map.iter()
            .map(|(key, value)| Ok((key.clone(), self.copy_node(value, &format!("{path}/{key}"))?)))
            .collect()
    }
}

fn without(params: &Parameters, key: &str) -> Parameters {
    let mut params = params.clone();
    params.remove(key);
    params
}
