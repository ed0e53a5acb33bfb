//! Record transformations

use crate::error::Result;
use crate::template::{evaluate, TemplateContext};
use serde_json::{Map, Value};

/// Reshapes a record in place
pub trait RecordTransformation: Send + Sync + std::fmt::Debug {
    /// Apply to one record
    fn transform(&self, record: &mut Value, ctx: &TemplateContext) -> Result<()>;
}

// ============================================================================
// AddFields
// ============================================================================

/// One field added by [`AddFields`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedField {
    /// Where the value goes
    pub path: Vec<String>,
    /// Template producing the value; `record` refers to the record itself
    pub value: String,
}

/// Sets fields computed from templates
#[derive(Debug, Clone, Default)]
pub struct AddFields {
    fields: Vec<AddedField>,
}

impl AddFields {
    /// Create the transformation
    pub fn new(fields: Vec<AddedField>) -> Self {
        Self { fields }
    }
}

impl RecordTransformation for AddFields {
    fn transform(&self, record: &mut Value, ctx: &TemplateContext) -> Result<()> {
        let mut ctx = ctx.clone();
        ctx.set_record(record.clone());

        for field in &self.fields {
            let Some(value) = evaluate(&field.value, &ctx) else {
                continue;
            };
            set_path(record, &field.path, value);
        }
        Ok(())
    }
}

fn set_path(record: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };

    let mut node = record;
    for segment in parents {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let Value::Object(map) = node else {
            return;
        };
        node = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
    }

    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    if let Value::Object(map) = node {
        map.insert(last.clone(), value);
    }
}

// ============================================================================
// RemoveFields
// ============================================================================

/// Deletes fields by path; missing fields are ignored
#[derive(Debug, Clone, Default)]
pub struct RemoveFields {
    field_pointers: Vec<Vec<String>>,
}

impl RemoveFields {
    /// Create the transformation
    pub fn new(field_pointers: Vec<Vec<String>>) -> Self {
        Self { field_pointers }
    }
}

impl RecordTransformation for RemoveFields {
    fn transform(&self, record: &mut Value, _ctx: &TemplateContext) -> Result<()> {
        for pointer in &self.field_pointers {
            let Some((last, parents)) = pointer.split_last() else {
                continue;
            };
            let parent = parents
                .iter()
                .try_fold(&mut *record, |node, segment| node.get_mut(segment.as_str()));
            if let Some(Value::Object(map)) = parent {
                map.remove(last);
            }
        }
        Ok(())
    }
}
