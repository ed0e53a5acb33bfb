//! Tests for manifest module

use super::*;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use test_case::test_case;

const SENDGRID_MANIFEST: &str = r##"
version: "0.30.3"
definitions:
  retriever:
    paginator:
      type: DefaultPaginator
      page_size: 2
      page_size_option:
        inject_into: request_parameter
        field_name: page_size
      page_token_option:
        inject_into: path
        type: RequestPath
      pagination_strategy:
        type: CursorPagination
        cursor_value: "{{ response._metadata.next }}"
        page_size: 2
    partition_router:
      type: ListPartitionRouter
      values: ["0", "1", "2", "3", "4", "5", "6", "7"]
      cursor_field: item_id
    requester:
      path: /v3/marketing/lists
      authenticator:
        type: BearerAuthenticator
        api_token: "{{ config.apikey }}"
      request_parameters:
        a_param: "10"
    record_selector:
      extractor:
        field_path: ["result"]
streams:
  - type: DeclarativeStream
    $parameters:
      name: stream_with_custom_requester
      primary_key: id
      url_base: https://api.sendgrid.com
    retriever: "#/definitions/retriever"
check:
  type: CheckStream
  stream_names: ["lists"]
spec:
  connection_specification:
    $schema: http://json-schema.org/draft-07/schema#
    type: object
    required: []
    properties: {}
    additionalProperties: true
  type: Spec
"##;

fn sendgrid_manifest() -> Value {
    load_manifest_from_str(SENDGRID_MANIFEST).unwrap()
}

/// Fields every component under the stream receives from its parameters
fn with_stream_params(component: Value) -> Value {
    let params = json!({
        "name": "stream_with_custom_requester",
        "primary_key": "id",
        "url_base": "https://api.sendgrid.com"
    });
    let mut component = component;
    let obj = component.as_object_mut().unwrap();
    for (key, value) in params.as_object().unwrap() {
        obj.insert(key.clone(), value.clone());
    }
    obj.insert("$parameters".to_string(), params);
    component
}

// ============================================================================
// Full Manifest Tests
// ============================================================================

#[test]
fn test_resolve_full_manifest() {
    let manifest = sendgrid_manifest();
    let resolved = resolve_manifest(&manifest).unwrap();

    let retriever = with_stream_params(json!({
        "type": "SimpleRetriever",
        "paginator": with_stream_params(json!({
            "type": "DefaultPaginator",
            "page_size": 2,
            "page_size_option": with_stream_params(json!({
                "type": "RequestOption",
                "inject_into": "request_parameter",
                "field_name": "page_size"
            })),
            "page_token_option": with_stream_params(json!({
                "type": "RequestPath",
                "inject_into": "path"
            })),
            "pagination_strategy": with_stream_params(json!({
                "type": "CursorPagination",
                "cursor_value": "{{ response._metadata.next }}",
                "page_size": 2
            }))
        })),
        "requester": with_stream_params(json!({
            "type": "HttpRequester",
            "path": "/v3/marketing/lists",
            "authenticator": with_stream_params(json!({
                "type": "BearerAuthenticator",
                "api_token": "{{ config.apikey }}"
            })),
            "request_parameters": {"a_param": "10"}
        })),
        "partition_router": with_stream_params(json!({
            "type": "ListPartitionRouter",
            "values": ["0", "1", "2", "3", "4", "5", "6", "7"],
            "cursor_field": "item_id"
        })),
        "record_selector": with_stream_params(json!({
            "type": "RecordSelector",
            "extractor": with_stream_params(json!({
                "type": "DpathExtractor",
                "field_path": ["result"]
            }))
        }))
    }));

    let expected = json!({
        "type": "DeclarativeSource",
        "version": "0.30.3",
        "definitions": manifest["definitions"].clone(),
        "streams": [with_stream_params(json!({
            "type": "DeclarativeStream",
            "retriever": retriever
        }))],
        "check": {"type": "CheckStream", "stream_names": ["lists"]},
        "spec": {
            "connection_specification": {
                "$schema": "http://json-schema.org/draft-07/schema#",
                "type": "object",
                "required": [],
                "properties": {},
                "additionalProperties": true
            },
            "type": "Spec"
        }
    });

    assert_eq!(resolved, expected);
}

#[test]
fn test_resolve_is_idempotent() {
    let once = resolve_manifest(&sendgrid_manifest()).unwrap();
    let twice = resolve_manifest(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn test_resolve_leaves_input_untouched() {
    let manifest = sendgrid_manifest();
    let before = manifest.clone();
    resolve_manifest(&manifest).unwrap();
    assert_eq!(manifest, before);
}

// ============================================================================
// Reference Tests
// ============================================================================

#[test]
fn test_shared_definition_is_copied_not_aliased() {
    let manifest = json!({
        "definitions": {"requester": {"type": "HttpRequester", "path": "/shared"}},
        "streams": [
            {"type": "DeclarativeStream", "$parameters": {"name": "a"},
             "retriever": {"type": "SimpleRetriever", "requester": "#/definitions/requester"}},
            {"type": "DeclarativeStream", "$parameters": {"name": "b"},
             "retriever": {"type": "SimpleRetriever", "requester": "#/definitions/requester"}}
        ]
    });

    let mut resolved = resolve_manifest(&manifest).unwrap();
    assert_eq!(resolved["streams"][0]["retriever"]["requester"]["name"], "a");
    assert_eq!(resolved["streams"][1]["retriever"]["requester"]["name"], "b");

    resolved["streams"][0]["retriever"]["requester"]["path"] = json!("/changed");
    assert_eq!(resolved["streams"][1]["retriever"]["requester"]["path"], "/shared");
    assert_eq!(resolved["definitions"]["requester"]["path"], "/shared");
}

#[test]
fn test_dotted_reference() {
    let manifest = json!({
        "definitions": {"base": "https://api.example.com"},
        "check": {"type": "CheckStream", "url_base": "*ref(definitions.base)"}
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    assert_eq!(resolved["check"]["url_base"], "https://api.example.com");
}

#[test]
fn test_ref_key_siblings_override_target() {
    let manifest = json!({
        "definitions": {"requester": {"type": "HttpRequester", "path": "/a", "http_method": "GET"}},
        "streams": [{
            "retriever": {"requester": {"$ref": "#/definitions/requester", "path": "/b"}}
        }]
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    let requester = &resolved["streams"][0]["retriever"]["requester"];
    assert_eq!(requester["path"], "/b");
    assert_eq!(requester["http_method"], "GET");
    assert!(requester.get("$ref").is_none());
}

#[test]
fn test_nested_references() {
    let manifest = json!({
        "definitions": {
            "base": "https://api.example.com",
            "requester": {"type": "HttpRequester", "url_base": "#/definitions/base"},
            "alias": "#/definitions/requester"
        },
        "streams": [{"retriever": {"requester": "#/definitions/alias"}}]
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    assert_eq!(
        resolved["streams"][0]["retriever"]["requester"]["url_base"],
        "https://api.example.com"
    );
}

#[test]
fn test_reference_into_array() {
    let manifest = json!({
        "definitions": {"paths": ["/first", "/second"]},
        "check": {"type": "CheckStream", "path": "#/definitions/paths/1"}
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    assert_eq!(resolved["check"]["path"], "/second");
}

#[test]
fn test_same_reference_twice_in_siblings_is_not_a_cycle() {
    let manifest = json!({
        "definitions": {"name": "shared"},
        "check": {"type": "CheckStream", "a": "#/definitions/name", "b": "#/definitions/name"}
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    assert_eq!(resolved["check"]["a"], "shared");
    assert_eq!(resolved["check"]["b"], "shared");
}

#[test]
fn test_circular_reference_fails() {
    let manifest = json!({
        "definitions": {
            "a": {"next": "#/definitions/b"},
            "b": {"next": "#/definitions/a"}
        },
        "check": {"type": "CheckStream", "loop": "#/definitions/a"}
    });

    let err = resolve_manifest(&manifest).unwrap_err();
    assert!(
        matches!(&err, Error::ManifestResolution { message, .. } if message.contains("circular")),
        "unexpected error: {err}"
    );
}

#[test]
fn test_self_reference_fails() {
    let manifest = json!({"definitions": {"a": "#/definitions/a"}});
    assert!(resolve_manifest(&manifest).is_err());
}

#[test]
fn test_undefined_reference_names_path() {
    let manifest = json!({
        "streams": [{"type": "DeclarativeStream", "retriever": "#/definitions/missing"}]
    });

    let err = resolve_manifest(&manifest).unwrap_err();
    match err {
        Error::ManifestResolution { path, message } => {
            assert_eq!(path, "/streams/0/retriever");
            assert!(message.contains("#/definitions/missing"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test_case(json!([1, 2]) ; "array root")]
#[test_case(json!("manifest") ; "string root")]
#[test_case(Value::Null ; "null root")]
fn test_non_mapping_root_fails(manifest: Value) {
    assert!(matches!(
        resolve_manifest(&manifest),
        Err(Error::ManifestResolution { .. })
    ));
}

// ============================================================================
// Type and Parameter Tests
// ============================================================================

#[test]
fn test_default_types_applied_to_list_elements() {
    let manifest = json!({
        "streams": [{"retriever": {"record_selector": {"extractor": {"field_path": []}}}}]
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    let stream = &resolved["streams"][0];
    assert_eq!(stream["type"], "DeclarativeStream");
    assert_eq!(stream["retriever"]["type"], "SimpleRetriever");
    assert_eq!(stream["retriever"]["record_selector"]["type"], "RecordSelector");
    assert_eq!(
        stream["retriever"]["record_selector"]["extractor"]["type"],
        "DpathExtractor"
    );
}

#[test]
fn test_unknown_field_without_type_is_plain_data() {
    let manifest = json!({
        "streams": [{"type": "DeclarativeStream", "$parameters": {"name": "s"},
                     "transformations": {"anything": 1}}]
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    assert_eq!(
        resolved["streams"][0]["transformations"],
        json!({"anything": 1})
    );
}

#[test]
fn test_component_fields_win_over_parameters() {
    let manifest = json!({
        "streams": [{
            "type": "DeclarativeStream",
            "$parameters": {"name": "outer", "path": "/from-params"},
            "retriever": {"requester": {"path": "/own"}}
        }]
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    let requester = &resolved["streams"][0]["retriever"]["requester"];
    assert_eq!(requester["path"], "/own");
    assert_eq!(requester["name"], "outer");
}

#[test]
fn test_inner_parameters_override_outer() {
    let manifest = json!({
        "streams": [{
            "type": "DeclarativeStream",
            "$parameters": {"name": "outer"},
            "retriever": {"$parameters": {"name": "inner"}, "requester": {}}
        }]
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    let stream = &resolved["streams"][0];
    assert_eq!(stream["name"], "outer");
    assert_eq!(stream["retriever"]["name"], "inner");
    assert_eq!(stream["retriever"]["requester"]["name"], "inner");
}

#[test]
fn test_parameter_named_like_field_is_not_passed_into_it() {
    let manifest = json!({
        "streams": [{
            "type": "DeclarativeStream",
            "$parameters": {"requester": "x", "name": "s"},
            "retriever": {"requester": {}}
        }]
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    let retriever = &resolved["streams"][0]["retriever"];
    assert_eq!(retriever["requester"]["type"], "HttpRequester");
    assert!(retriever["requester"]["$parameters"].get("requester").is_none());
}

#[test]
fn test_json_schema_is_not_a_component() {
    let manifest = json!({
        "streams": [{
            "type": "DeclarativeStream",
            "$parameters": {"name": "s"},
            "schema": {"type": "object", "properties": {"id": {"type": ["null", "string"]}}}
        }]
    });

    let resolved = resolve_manifest(&manifest).unwrap();
    assert_eq!(
        resolved["streams"][0]["schema"],
        json!({"type": "object", "properties": {"id": {"type": ["null", "string"]}}})
    );
}

#[test]
fn test_parameters_must_be_mapping() {
    let manifest = json!({"streams": [{"type": "DeclarativeStream", "$parameters": [1]}]});
    let err = resolve_manifest(&manifest).unwrap_err();
    assert!(err.to_string().contains("$parameters"));
}

// ============================================================================
// Reference Helper Tests
// ============================================================================

#[test_case("#/definitions/retriever", true ; "pointer")]
#[test_case("*ref(definitions.retriever)", true ; "dotted")]
#[test_case("https://api.example.com", false ; "url")]
#[test_case("{{ config.apikey }}", false ; "template")]
fn test_is_reference(s: &str, expected: bool) {
    assert_eq!(is_reference(s), expected);
}

#[test]
fn test_parse_pointer_unescapes() {
    assert_eq!(
        parse_reference("#/paths/~1users~0x").unwrap(),
        vec!["paths".to_string(), "/users~x".to_string()]
    );
}

#[test]
fn test_default_type_lookup() {
    assert_eq!(default_type("SimpleRetriever.paginator"), Some("NoPagination"));
    assert_eq!(default_type("DeclarativeSource.streams"), Some("DeclarativeStream"));
    assert_eq!(default_type("SimpleRetriever.unknown"), None);
}

// ============================================================================
// Loader Tests
// ============================================================================

#[test]
fn test_load_manifest_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("manifest.yaml");
    std::fs::write(&path, SENDGRID_MANIFEST).unwrap();

    let manifest = load_manifest(&path).unwrap();
    assert_eq!(manifest["version"], "0.30.3");
}

#[test]
fn test_load_manifest_missing_file() {
    let err = load_manifest("/nonexistent/manifest.yaml").unwrap_err();
    assert!(matches!(err, Error::FileNotFound { .. }));
}

#[test]
fn test_load_manifest_rejects_scalar() {
    assert!(load_manifest_from_str("just a string").is_err());
}
