//! Tests for declarative sources

use super::*;
use crate::builder::TestReadLimits;
use crate::error::{Error, Result};
use crate::protocol::{ConfiguredCatalog, Message};
use crate::template::TemplateContext;
use serde_json::{json, Value};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manifest(url_base: &str, retriever_extra: Value) -> Value {
    let mut retriever = json!({
        "requester": {
            "url_base": url_base,
            "path": "/items",
            "http_method": "GET",
            "authenticator": {
                "type": "BearerAuthenticator",
                "api_token": "{{ config.token }}"
            }
        },
        "record_selector": {"extractor": {"field_path": ["data"]}}
    });
    if let (Some(target), Value::Object(extra)) = (retriever.as_object_mut(), retriever_extra) {
        target.extend(extra);
    }

    json!({
        "version": "0.30.0",
        "streams": [{
            "type": "DeclarativeStream",
            "$parameters": {"name": "items", "primary_key": "id"},
            "retriever": retriever
        }]
    })
}

fn stream_node(manifest: &Value) -> Value {
    crate::manifest::resolve_manifest(manifest).unwrap()["streams"][0].clone()
}

fn log_lines(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Log { log } => Some(log.message.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Factory Tests
// ============================================================================

#[test]
fn test_factory_builds_stream_from_resolved_manifest() {
    let factory = ComponentFactory::new(json!({"token": "secret"}));
    let stream = factory
        .create_stream(&stream_node(&manifest("https://api.example.com", json!({}))))
        .unwrap();

    assert_eq!(stream.name(), "items");
    assert_eq!(stream.primary_key(), &json!("id"));

    let requester = stream.retriever().requester().unwrap();
    assert_eq!(requester.url_base(), "https://api.example.com");
    assert_eq!(requester.path(), "/items");
    assert_eq!(requester.max_retries(), 5);
}

#[test]
fn test_factory_with_limits_disables_retries() {
    let factory =
        ComponentFactory::new(json!({})).with_limits(TestReadLimits::default().with_max_slices(1));
    let stream = factory
        .create_stream(&stream_node(&manifest("https://api.example.com", json!({}))))
        .unwrap();

    assert_eq!(stream.retriever().requester().unwrap().max_retries(), 0);
    assert_eq!(factory.limits().unwrap().max_slices, 1);
}

#[test]
fn test_factory_client_config_reaches_requester() {
    let client_config = crate::http::HttpClientConfig::default()
        .with_timeout(std::time::Duration::from_secs(5))
        .with_max_retries(2)
        .without_rate_limit();
    let factory = ComponentFactory::new(json!({})).with_client_config(client_config);
    let stream = factory
        .create_stream(&stream_node(&manifest("https://api.example.com", json!({}))))
        .unwrap();

    assert_eq!(stream.retriever().requester().unwrap().max_retries(), 2);
}

#[test]
fn test_factory_rejects_unknown_component_types() {
    let factory = ComponentFactory::new(json!({}));
    let node = stream_node(&manifest(
        "https://api.example.com",
        json!({"paginator": {"type": "TimeTravelPaginator"}}),
    ));

    let err = factory.create_stream(&node).unwrap_err();
    assert!(
        matches!(err, Error::UnsupportedComponent { ref component_type } if component_type == "TimeTravelPaginator")
    );
}

#[test]
fn test_factory_rejects_unknown_retriever() {
    let factory = ComponentFactory::new(json!({}));
    let node = json!({
        "type": "DeclarativeStream",
        "name": "items",
        "retriever": {"type": "AsyncRetriever"}
    });
    assert!(matches!(
        factory.create_stream(&node),
        Err(Error::UnsupportedComponent { .. })
    ));
}

#[test]
fn test_factory_requires_stream_name() {
    let factory = ComponentFactory::new(json!({}));
    let node = json!({
        "type": "DeclarativeStream",
        "retriever": {"type": "SimpleRetriever"}
    });
    assert!(matches!(
        factory.create_stream(&node),
        Err(Error::InvalidComponent { .. })
    ));
}

#[test]
fn test_factory_api_key_authenticator() {
    let factory = ComponentFactory::new(json!({"api_key": "k-123"}));
    let auth = factory
        .create_authenticator(&json!({
            "type": "ApiKeyAuthenticator",
            "api_token": "Token {{ config.api_key }}",
            "inject_into": {
                "type": "RequestOption",
                "inject_into": "header",
                "field_name": "X-Api-Key"
            }
        }))
        .unwrap();

    assert_eq!(
        auth.config(),
        &crate::auth::AuthConfig::ApiKey {
            location: crate::auth::Location::Header,
            name: "X-Api-Key".to_string(),
            value: "Token k-123".to_string(),
        }
    );
}

#[test]
fn test_factory_missing_secret_renders_empty() {
    let factory = ComponentFactory::new(json!({}));
    let auth = factory
        .create_authenticator(&json!({
            "type": "BearerAuthenticator",
            "api_token": "{{ config.token }}"
        }))
        .unwrap();
    assert_eq!(
        auth.config(),
        &crate::auth::AuthConfig::Bearer {
            token: String::new()
        }
    );
}

#[test]
fn test_factory_list_router_from_config_template() {
    let factory = ComponentFactory::new(json!({"repos": ["a", "b"]}));
    let router = factory
        .create_partition_router(&json!({
            "type": "ListPartitionRouter",
            "values": "{{ config.repos }}",
            "cursor_field": "repo"
        }))
        .unwrap();

    let slices: Vec<_> = router.stream_slices().collect::<Result<_>>().unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[1].get("repo"), Some(&json!("b")));
}

#[test]
fn test_factory_rejects_multiple_partition_routers() {
    let factory = ComponentFactory::new(json!({}));
    let router = json!({"type": "ListPartitionRouter", "values": ["a"], "cursor_field": "x"});
    assert!(factory
        .create_partition_router(&json!([router.clone(), router]))
        .is_err());
}

#[test]
fn test_factory_datetime_windows() {
    let factory = ComponentFactory::new(json!({"start": "2024-01-01"}));
    let router = factory
        .create_datetime_router(&json!({
            "type": "DatetimeBasedCursor",
            "start_datetime": {"type": "MinMaxDatetime", "datetime": "{{ config.start }}", "datetime_format": "%Y-%m-%d"},
            "end_datetime": "2024-01-10",
            "datetime_format": "%Y-%m-%d",
            "step": "P5D",
            "cursor_granularity": "P1D"
        }))
        .unwrap();

    let slices: Vec<_> = router.stream_slices().collect::<Result<_>>().unwrap();
    assert_eq!(slices.len(), 2);
    assert_eq!(slices[0].get("start_time"), Some(&json!("2024-01-01")));
    assert_eq!(slices[0].get("end_time"), Some(&json!("2024-01-05")));
    assert_eq!(slices[1].get("end_time"), Some(&json!("2024-01-10")));
}

#[test]
fn test_factory_rejects_out_of_range_step() {
    let factory = ComponentFactory::new(json!({}));
    let err = factory
        .create_datetime_router(&json!({
            "type": "DatetimeBasedCursor",
            "start_datetime": "2024-01-01",
            "end_datetime": "2024-01-10",
            "datetime_format": "%Y-%m-%d",
            "step": "P99999999999999D"
        }))
        .unwrap_err();
    assert!(err.to_string().contains("Invalid ISO 8601 duration"));
}

#[test]
fn test_factory_page_size_from_template() {
    let factory = ComponentFactory::new(json!({"page_size": 25}));
    let paginator = factory
        .create_paginator(&json!({
            "type": "DefaultPaginator",
            "pagination_strategy": {
                "type": "OffsetIncrement",
                "page_size": "{{ config.page_size }}"
            },
            "page_size_option": {"type": "RequestOption", "inject_into": "request_parameter", "field_name": "limit"}
        }))
        .unwrap();

    let mut request = crate::http::RequestConfig::new();
    paginator
        .request_options(&crate::pagination::PaginationState::new(None), &mut request)
        .unwrap();
    assert_eq!(request.query.get("limit"), Some(&"25".to_string()));
}

#[test]
fn test_factory_transformations_apply_to_records() {
    let factory = ComponentFactory::new(json!({}));
    let transformation = factory
        .create_transformation(&json!({
            "type": "AddFields",
            "fields": [{"type": "AddedFieldDefinition", "path": ["source"], "value": "api"}]
        }))
        .unwrap();

    let mut record = json!({"id": 1});
    transformation
        .transform(&mut record, &TemplateContext::new())
        .unwrap();
    assert_eq!(record, json!({"id": 1, "source": "api"}));
}

// ============================================================================
// Source Tests
// ============================================================================

#[test]
fn test_source_caches_resolved_manifest() {
    let source = ManifestSource::new(manifest("https://api.example.com", json!({})), json!({}));
    let first = source.resolved_manifest().unwrap() as *const Value;
    let second = source.resolved_manifest().unwrap() as *const Value;
    assert_eq!(first, second);
    assert_eq!(source.resolved_manifest().unwrap()["type"], "DeclarativeSource");
}

#[test]
fn test_source_streams() {
    let source = ManifestSource::new(manifest("https://api.example.com", json!({})), json!({}));
    let streams = source.streams().unwrap();
    assert_eq!(streams.len(), 1);
    assert_eq!(streams[0].name(), "items");
    assert!(streams[0].as_declarative().is_some());
}

#[tokio::test]
async fn test_stream_read_emits_slice_markers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(header("Authorization", "Bearer secret"))
        .and(query_param("color", "red"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 1}]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let retriever = json!({
        "partition_router": {
            "type": "ListPartitionRouter",
            "values": ["red", "blue"],
            "cursor_field": "color",
            "request_option": {"inject_into": "request_parameter", "field_name": "color"}
        }
    });
    let source = ManifestSource::new(manifest(&server.uri(), retriever), json!({"token": "secret"}));

    let mut messages = Vec::new();
    source
        .read(&ConfiguredCatalog::single("items"), &mut messages)
        .await
        .unwrap();

    let logs = log_lines(&messages);
    assert_eq!(logs.len(), 6);
    assert_eq!(logs[0], r#"slice:{"color":"red"}"#);
    assert!(logs[1].starts_with("request:"));
    assert!(logs[2].starts_with("response:"));
    assert_eq!(logs[3], r#"slice:{"color":"blue"}"#);
    assert_eq!(messages.iter().filter(|m| m.is_record()).count(), 1);
}

#[tokio::test]
async fn test_source_read_failure_becomes_trace() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let source = ManifestSource::new(manifest(&server.uri(), json!({})), json!({}))
        .with_limits(TestReadLimits::default());
    let mut messages = Vec::new();
    source
        .read(&ConfiguredCatalog::single("items"), &mut messages)
        .await
        .unwrap();

    let last = messages.last().unwrap();
    assert!(last.is_trace());
    if let Message::Trace { trace } = last {
        assert!(trace.error.message.contains("401"));
    }
}

#[tokio::test]
async fn test_source_read_unknown_stream_fails() {
    let source = ManifestSource::new(manifest("https://api.example.com", json!({})), json!({}));
    let mut messages = Vec::new();
    let err = source
        .read(&ConfiguredCatalog::single("nope"), &mut messages)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::StreamNotFound { .. }));
    assert!(messages.is_empty());
}
