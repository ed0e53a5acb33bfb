//! Reference lookup and cycle tracking
//!
//! Two reference forms are recognized in string values:
//!
//! - `#/definitions/retriever` (pointer form, segments split on `/`)
//! - `*ref(definitions.retriever)` (dotted form)
//!
//! A mapping with a `$ref` key takes its content from the referenced
//! mapping, with its own sibling keys overriding.

use super::types::REF_KEY;
use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;
use std::sync::LazyLock;

static DOTTED_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\*ref\(([^()]+)\)$").expect("Invalid dotted reference regex"));

/// Whether a string is a reference to another manifest node
pub fn is_reference(s: &str) -> bool {
    s.starts_with("#/") || DOTTED_REF.is_match(s)
}

/// Split a reference into its lookup segments
pub fn parse_reference(reference: &str) -> Option<Vec<String>> {
    if let Some(pointer) = reference.strip_prefix("#/") {
        return Some(
            pointer
                .split('/')
                .map(|seg| seg.replace("~1", "/").replace("~0", "~"))
                .collect(),
        );
    }

    DOTTED_REF
        .captures(reference)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().split('.').map(str::to_string).collect())
}

/// Walk `segments` down from `root`. Arrays are indexed by number.
pub fn lookup<'v>(root: &'v Value, segments: &[String]) -> Option<&'v Value> {
    segments.iter().try_fold(root, |node, seg| match node {
        Value::Object(map) => map.get(seg),
        Value::Array(items) => seg.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// The references currently being expanded along one descent path.
///
/// A reference stays on the stack for as long as the resolver is inside
/// the node it produced; meeting it again before leaving is a cycle.
#[derive(Debug)]
pub struct ReferenceStack<'a> {
    manifest: &'a Value,
    active: Vec<String>,
}

impl<'a> ReferenceStack<'a> {
    /// Track references into `manifest`
    pub fn new(manifest: &'a Value) -> Self {
        Self {
            manifest,
            active: Vec::new(),
        }
    }

    /// Number of references currently entered
    pub fn depth(&self) -> usize {
        self.active.len()
    }

    /// Leave every reference entered after `depth`
    pub fn truncate(&mut self, depth: usize) {
        self.active.truncate(depth);
    }

    /// Enter a reference and return its target
    pub fn enter(&mut self, reference: &str, path: &str) -> Result<&'a Value> {
        if self.active.iter().any(|r| r == reference) {
            return Err(Error::circular_reference(path, reference));
        }

        let target = parse_reference(reference)
            .and_then(|segments| lookup(self.manifest, &segments))
            .ok_or_else(|| Error::undefined_reference(path, reference))?;

        self.active.push(reference.to_string());
        Ok(target)
    }

    /// Follow references at `node` until a concrete value is reached.
    ///
    /// Entered references are left on the stack; callers truncate once
    /// they are done with the returned value.
    pub fn expand<'n>(&mut self, node: &'n Value, path: &str) -> Result<Cow<'n, Value>>
    where
        'a: 'n,
    {
        match node {
            Value::String(s) if is_reference(s) => {
                let target = self.enter(s, path)?;
                self.expand(target, path)
            }
            Value::Object(map) => {
                let Some(reference) = map.get(REF_KEY) else {
                    return Ok(Cow::Borrowed(node));
                };
                let Some(reference) = reference.as_str() else {
                    return Err(Error::resolution(path, "$ref must be a string"));
                };

                let target = self.enter(reference, path)?;
                match self.expand(target, path)?.into_owned() {
                    Value::Object(mut merged) => {
                        for (key, value) in map {
                            if key != REF_KEY {
                                merged.insert(key.clone(), value.clone());
                            }
                        }
                        Ok(Cow::Owned(Value::Object(merged)))
                    }
                    other => Ok(Cow::Owned(other)),
                }
            }
            _ => Ok(Cow::Borrowed(node)),
        }
    }
}
