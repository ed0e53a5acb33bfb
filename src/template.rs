//! Template interpolation for manifest components
//!
//! Handles `{{ variable }}` interpolation in component fields.
//! Supports nested access like `{{ config.api_key }}`, `{{ stream_slice.id }}`
//! and `{{ response._metadata.next }}`, plus `{{ not path }}` conditions.

use crate::error::{Error, Result};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Regex for matching template variables: {{ variable.path }}
static TEMPLATE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z0-9_]+)*)\s*\}\}").expect("Invalid template regex")
});

/// Regex for a template that is a single (optionally negated) expression
static CONDITION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\{\{\s*(not\s+)?([a-zA-Z_][a-zA-Z0-9_]*(?:\.[a-zA-Z0-9_]+)*)\s*\}\}\s*$")
        .expect("Invalid condition regex")
});

/// Context for template interpolation
#[derive(Debug, Clone, Default)]
pub struct TemplateContext {
    /// Connector configuration values
    pub config: Value,
    /// Component `$parameters`
    pub parameters: Value,
    /// Current stream slice (also reachable as `stream_partition`)
    pub stream_slice: Value,
    /// Token produced by the paginator for the next request
    pub next_page_token: Value,
    /// Decoded body of the last response
    pub response: Value,
    /// Headers of the last response
    pub headers: Value,
    /// Record under evaluation (record filters)
    pub record: Value,
}

impl TemplateContext {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create context with config values
    pub fn with_config(config: Value) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Set config values
    pub fn set_config(&mut self, config: Value) -> &mut Self {
        self.config = config;
        self
    }

    /// Set component parameters
    pub fn set_parameters(&mut self, parameters: Value) -> &mut Self {
        self.parameters = parameters;
        self
    }

    /// Set stream slice values
    pub fn set_stream_slice(&mut self, slice: Value) -> &mut Self {
        self.stream_slice = slice;
        self
    }

    /// Set the next page token
    pub fn set_next_page_token(&mut self, token: Value) -> &mut Self {
        self.next_page_token = token;
        self
    }

    /// Set the last response body and headers
    pub fn set_response(&mut self, body: Value, headers: Value) -> &mut Self {
        self.response = body;
        self.headers = headers;
        self
    }

    /// Set the record under evaluation
    pub fn set_record(&mut self, record: Value) -> &mut Self {
        self.record = record;
        self
    }

    /// Get a value by path (e.g., "config.api_key")
    pub fn get(&self, path: &str) -> Option<&Value> {
        let parts: Vec<&str> = path.split('.').collect();

        let root = match parts[0] {
            "config" => &self.config,
            "parameters" => &self.parameters,
            "stream_slice" | "stream_partition" => &self.stream_slice,
            "next_page_token" => &self.next_page_token,
            "response" => &self.response,
            "headers" => &self.headers,
            "record" => &self.record,
            _ => return None,
        };

        let value = get_nested_value(root, &parts[1..])?;
        if value.is_null() {
            None
        } else {
            Some(value)
        }
    }
}

/// Get a nested value from a JSON value by path
fn get_nested_value<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for part in path {
        current = match current {
            Value::Object(map) => map.get(*part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Render a template string with the given context
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String> {
    let mut result = template.to_string();
    let mut errors = Vec::new();

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        let full_match = &cap[0];
        let var_path = &cap[1];

        match ctx.get(var_path) {
            Some(value) => {
                result = result.replace(full_match, &value_to_string(value));
            }
            None => errors.push(var_path.to_string()),
        }
    }

    if errors.is_empty() {
        Ok(result)
    } else {
        Err(Error::undefined_var(errors.join(", ")))
    }
}

/// Render a template, leaving undefined variables in place
pub fn render_optional(template: &str, ctx: &TemplateContext) -> String {
    let mut result = template.to_string();

    for cap in TEMPLATE_REGEX.captures_iter(template) {
        if let Some(value) = ctx.get(&cap[1]) {
            result = result.replace(&cap[0], &value_to_string(value));
        }
    }

    result
}

/// Evaluate a template to a JSON value.
///
/// A template made of a single expression yields the referenced value with its
/// JSON type intact; anything else renders to a string. Returns `None` when a
/// referenced variable is undefined or null.
pub fn evaluate(template: &str, ctx: &TemplateContext) -> Option<Value> {
    if let Some(cap) = CONDITION_REGEX.captures(template) {
        if cap.get(1).is_none() {
            return ctx.get(&cap[2]).cloned();
        }
    }
    if !has_templates(template) {
        return Some(Value::String(template.to_string()));
    }
    render(template, ctx).ok().map(Value::String)
}

/// Evaluate a condition such as `{{ response.done }}` or `{{ not record.archived }}`
pub fn evaluate_condition(condition: &str, ctx: &TemplateContext) -> Result<bool> {
    if let Some(cap) = CONDITION_REGEX.captures(condition) {
        let negate = cap.get(1).is_some();
        let value = ctx.get(&cap[2]).is_some_and(is_truthy);
        return Ok(value != negate);
    }
    if has_templates(condition) {
        return Err(Error::template(format!(
            "unsupported condition expression: {condition}"
        )));
    }
    Ok(is_truthy(&Value::String(condition.trim().to_string())))
}

/// Truthiness of a JSON value, the way template conditions see it
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !(s.is_empty() || s.eq_ignore_ascii_case("false")),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Check if a string contains template variables
pub fn has_templates(s: &str) -> bool {
    TEMPLATE_REGEX.is_match(s)
}

/// Convert a JSON value to a string for template substitution
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

/// Render all string values in a JSON object/value
pub fn render_value(value: &Value, ctx: &TemplateContext) -> Result<Value> {
    match value {
        Value::String(s) if has_templates(s) => Ok(Value::String(render(s, ctx)?)),
        Value::Object(map) => {
            let mut new_map = serde_json::Map::new();
            for (k, v) in map {
                let new_key = if has_templates(k) {
                    render(k, ctx)?
                } else {
                    k.clone()
                };
                new_map.insert(new_key, render_value(v, ctx)?);
            }
            Ok(Value::Object(new_map))
        }
        Value::Array(arr) => arr
            .iter()
            .map(|v| render_value(v, ctx))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        _ => Ok(value.clone()),
    }
}
