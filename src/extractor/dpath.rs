//! Field-path record extraction

use crate::error::{Error, Result};
use crate::template::{render, TemplateContext};
use jsonpath_rust::JsonPath;
use serde_json::Value;

/// Extracts records found at a field path of the decoded body.
///
/// Path segments are templates; a `*` segment matches every element of an
/// array or every value of an object.
#[derive(Debug, Clone, Default)]
pub struct DpathExtractor {
    field_path: Vec<String>,
}

impl DpathExtractor {
    /// Create an extractor for `field_path`
    pub fn new(field_path: Vec<String>) -> Self {
        Self { field_path }
    }

    /// Extract records from a decoded body
    pub fn extract(&self, body: &Value, ctx: &TemplateContext) -> Result<Vec<Value>> {
        let path = self
            .field_path
            .iter()
            .map(|segment| render(segment, ctx))
            .collect::<Result<Vec<_>>>()?;

        let found = if path.iter().any(|s| s == "*") {
            Some(find_with_wildcards(body, &path)?)
        } else {
            lookup(body, &path).cloned()
        };

        Ok(match found {
            Some(Value::Array(records)) => records,
            Some(Value::Null) | None => Vec::new(),
            Some(Value::Object(map)) if map.is_empty() => Vec::new(),
            Some(record) => vec![record],
        })
    }
}

fn lookup<'v>(body: &'v Value, path: &[String]) -> Option<&'v Value> {
    path.iter().try_fold(body, |node, segment| match node {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Resolve a wildcard path through jsonpath-rust
fn find_with_wildcards(body: &Value, path: &[String]) -> Result<Value> {
    let mut expr = String::from("$");
    for segment in path {
        if segment == "*" {
            expr.push_str("[*]");
        } else {
            expr.push_str(&format!("['{}']", segment.replace('\'', "\\'")));
        }
    }

    let jp = JsonPath::try_from(expr.as_str())
        .map_err(|e| Error::json_path(format!("Invalid field path {path:?}: {e}")))?;
    Ok(jp.find(body))
}
