//! Schema inference tests

use super::*;
use pretty_assertions::assert_eq;
use serde_json::json;

fn infer(records: &[serde_json::Value]) -> Option<serde_json::Value> {
    let mut inferrer = SchemaInferrer::new();
    for record in records {
        inferrer.accumulate(record);
    }
    inferrer.inferred_schema()
}

#[test]
fn test_no_records_no_schema() {
    assert_eq!(infer(&[]), None);
}

#[test]
fn test_infer_simple_object() {
    let schema = infer(&[json!({"name": "John", "age": 30, "score": 1.5, "active": true})]);

    assert_eq!(
        schema,
        Some(json!({
            "$schema": SCHEMA_DRAFT,
            "type": "object",
            "properties": {
                "active": {"type": ["boolean", "null"]},
                "age": {"type": ["integer", "null"]},
                "name": {"type": ["string", "null"]},
                "score": {"type": ["number", "null"]}
            }
        }))
    );
}

#[test]
fn test_fields_from_later_records_are_added() {
    let mut inferrer = SchemaInferrer::new();
    inferrer.accumulate(&json!({"id": 1}));
    inferrer.accumulate(&json!({"id": 2, "name": "b"}));

    let schema = inferrer.schema().unwrap();
    assert_eq!(inferrer.record_count(), 2);
    assert!(schema.get_property("id").is_some());
    assert_eq!(
        schema.get_property("name").unwrap().primary_type(),
        Some(JsonType::String)
    );
}

#[test]
fn test_null_then_value_widens() {
    let mut inferrer = SchemaInferrer::new();
    inferrer.accumulate(&json!({"deleted_at": null}));
    inferrer.accumulate(&json!({"deleted_at": "2024-01-01"}));
    assert!(inferrer.schema().unwrap().get_property("deleted_at").unwrap().json_type.is_nullable());

    let schema = inferrer.inferred_schema().unwrap();
    assert_eq!(
        schema["properties"]["deleted_at"],
        json!({"type": ["string", "null"]})
    );
}

#[test]
fn test_integer_and_number_merge_to_number() {
    let schema = infer(&[json!({"v": 1}), json!({"v": 2.5})]).unwrap();
    assert_eq!(schema["properties"]["v"], json!({"type": ["number", "null"]}));
}

#[test]
fn test_incompatible_types_fall_back_to_string() {
    let schema = infer(&[json!({"v": {"a": 1}}), json!({"v": true})]).unwrap();
    assert_eq!(schema["properties"]["v"], json!({"type": ["string", "null"]}));
}

#[test]
fn test_nested_objects_and_arrays() {
    let schema = infer(&[
        json!({"user": {"id": 1}, "tags": []}),
        json!({"user": {"email": "a@b.c"}, "tags": ["x", "y"]}),
    ])
    .unwrap();

    assert_eq!(
        schema["properties"]["user"],
        json!({
            "type": ["object", "null"],
            "properties": {
                "email": {"type": ["string", "null"]},
                "id": {"type": ["integer", "null"]}
            }
        })
    );
    assert_eq!(
        schema["properties"]["tags"],
        json!({"type": ["array", "null"], "items": {"type": ["string", "null"]}})
    );
}

#[test]
fn test_non_object_records_skipped() {
    let mut inferrer = SchemaInferrer::new();
    inferrer.accumulate(&json!([1, 2]));
    inferrer.accumulate(&json!("text"));
    assert_eq!(inferrer.record_count(), 0);
    assert_eq!(inferrer.inferred_schema(), None);
}

#[test]
fn test_max_depth_stops_descent() {
    let mut inferrer = SchemaInferrer::new().with_max_depth(1);
    inferrer.accumulate(&json!({"a": {"b": {"c": 1}}}));
    let schema = inferrer.inferred_schema().unwrap();
    assert_eq!(
        schema["properties"]["a"],
        json!({
            "type": ["object", "null"],
            "properties": {"b": {"type": ["object", "null"]}}
        })
    );
}
