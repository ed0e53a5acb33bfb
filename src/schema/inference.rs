//! Incremental schema inference from records

use super::types::{JsonSchema, JsonType, SchemaProperty};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Accumulates records and infers the schema they share.
///
/// Every inferred property is nullable: a field seen in one record may be
/// absent or `null` in the next page of the same API.
#[derive(Debug, Clone)]
pub struct SchemaInferrer {
    /// Maximum depth for nested objects
    max_depth: usize,
    /// Records accepted so far
    record_count: usize,
    /// Schema built so far; `None` until the first object record
    schema: Option<JsonSchema>,
}

impl Default for SchemaInferrer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaInferrer {
    /// Create a new schema inferrer with default settings
    pub fn new() -> Self {
        Self {
            max_depth: 10,
            record_count: 0,
            schema: None,
        }
    }

    /// Set maximum depth for nested objects
    #[must_use]
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Number of records accumulated
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    /// Fold one record into the schema. Non-object records are skipped.
    pub fn accumulate(&mut self, record: &Value) {
        let Value::Object(map) = record else {
            debug!("Skipping non-object record for schema inference");
            return;
        };

        self.record_count += 1;
        let fields = self.infer_fields(map, 0);
        let schema = self.schema.get_or_insert_with(JsonSchema::new);
        merge_fields(&mut schema.properties, fields);
    }

    /// Schema of everything accumulated, or `None` when no record was seen
    pub fn inferred_schema(&self) -> Option<Value> {
        self.schema.as_ref().map(JsonSchema::to_json)
    }

    /// Typed view of the schema built so far
    pub fn schema(&self) -> Option<&JsonSchema> {
        self.schema.as_ref()
    }

    fn infer_fields(&self, map: &Map<String, Value>, depth: usize) -> BTreeMap<String, SchemaProperty> {
        map.iter()
            .map(|(key, val)| (key.clone(), self.infer_property(val, depth)))
            .collect()
    }

    fn infer_property(&self, value: &Value, depth: usize) -> SchemaProperty {
        if depth >= self.max_depth {
            return SchemaProperty::nullable(JsonType::Object);
        }

        match value {
            Value::Array(items) => {
                let item = items
                    .iter()
                    .map(|item| self.infer_property(item, depth + 1))
                    .reduce(|a, b| merge_property(&a, &b));
                SchemaProperty::array(item)
            }
            Value::Object(map) => SchemaProperty::object(self.infer_fields(map, depth + 1)),
            other => SchemaProperty::nullable(JsonType::of(other)),
        }
    }
}

fn merge_fields(
    target: &mut BTreeMap<String, SchemaProperty>,
    fields: BTreeMap<String, SchemaProperty>,
) {
    for (key, prop) in fields {
        match target.get_mut(&key) {
            Some(existing) => *existing = merge_property(existing, &prop),
            None => {
                target.insert(key, prop);
            }
        }
    }
}

/// Merge two properties together
fn merge_property(a: &SchemaProperty, b: &SchemaProperty) -> SchemaProperty {
    let json_type = a.json_type.merge_with(&b.json_type);

    let properties = match json_type.primary_type() {
        Some(JsonType::Object) => match (&a.properties, &b.properties) {
            (Some(a_props), Some(b_props)) => {
                let mut merged = a_props.clone();
                merge_fields(&mut merged, b_props.clone());
                Some(merged)
            }
            (Some(props), None) | (None, Some(props)) => Some(props.clone()),
            (None, None) => None,
        },
        _ => None,
    };

    let items = match json_type.primary_type() {
        Some(JsonType::Array) => match (&a.items, &b.items) {
            (Some(a_items), Some(b_items)) => Some(Box::new(merge_property(a_items, b_items))),
            (Some(items), None) | (None, Some(items)) => Some(items.clone()),
            (None, None) => None,
        },
        _ => None,
    };

    SchemaProperty {
        json_type,
        properties,
        items,
    }
}
