//! Tests for protocol module

use super::*;
use crate::error::Error;
use crate::types::LogLevel;
use serde_json::json;
use std::ops::ControlFlow;

// ============================================================================
// Message Tests
// ============================================================================

#[test]
fn test_message_predicates() {
    let msg = Message::record("users", json!({"id": 1}));
    assert!(msg.is_record());
    assert!(!msg.is_state());

    assert!(Message::state(json!({"cursor": "abc"})).is_state());
    assert!(Message::info("hello").is_log());
    assert!(Message::trace("boom", None, None).is_trace());
}

#[test]
fn test_record_serialization() {
    let msg = Message::record("resolve_manifest", json!({"manifest": {}}));
    let value = serde_json::to_value(&msg).unwrap();

    assert_eq!(value["type"], "RECORD");
    assert_eq!(value["record"]["stream"], "resolve_manifest");
    assert_eq!(value["record"]["data"], json!({"manifest": {}}));
    assert!(value["record"]["emitted_at"].is_i64());
}

#[test]
fn test_log_serialization() {
    let value = serde_json::to_value(Message::warn("careful")).unwrap();
    assert_eq!(
        value,
        json!({"type": "LOG", "log": {"level": "WARN", "message": "careful"}})
    );
}

#[test]
fn test_trace_from_error() {
    let err = Error::stream_listing("A declarative source should only contain streams of type DeclarativeStream");
    let msg = Message::trace_from_error("Error listing streams.", &err);

    let Message::Trace { trace } = &msg else {
        panic!("expected trace, got {msg:?}");
    };
    assert_eq!(trace.trace_type, "ERROR");
    assert_eq!(trace.error.message, "Error listing streams.");
    assert_eq!(
        trace.error.internal_message.as_deref(),
        Some("A declarative source should only contain streams of type DeclarativeStream")
    );
    assert!(trace.error.stack_trace.as_deref().unwrap().contains("StreamListing"));

    let value = serde_json::to_value(&msg).unwrap();
    assert_eq!(value["type"], "TRACE");
    assert_eq!(value["trace"]["type"], "ERROR");
    assert_eq!(value["trace"]["error"]["failure_type"], "system_error");
}

#[test]
fn test_error_details_detail_prefers_stack_trace() {
    let details = ErrorDetails {
        message: "m".to_string(),
        internal_message: Some("internal".to_string()),
        stack_trace: None,
        failure_type: FailureType::SystemError,
    };
    assert_eq!(details.detail(), "internal");

    let details = ErrorDetails {
        stack_trace: Some("trace".to_string()),
        ..details
    };
    assert_eq!(details.detail(), "trace");
}

#[test]
fn test_message_round_trip_from_wire() {
    let wire = r#"{"type":"LOG","log":{"level":"INFO","message":"request:{}"}}"#;
    let msg: Message = serde_json::from_str(wire).unwrap();
    assert_eq!(msg, Message::log(LogLevel::Info, "request:{}"));
}

// ============================================================================
// Catalog Tests
// ============================================================================

#[test]
fn test_catalog_deserialize_minimal() {
    let catalog: ConfiguredCatalog = serde_json::from_value(json!({
        "streams": [{
            "stream": {"name": "hashiras", "json_schema": {}, "supported_sync_modes": ["full_refresh"]},
            "sync_mode": "full_refresh",
            "destination_sync_mode": "append"
        }]
    }))
    .unwrap();

    assert_eq!(catalog.first_stream_name(), Some("hashiras"));
}

#[test]
fn test_catalog_single() {
    let catalog = ConfiguredCatalog::single("lists");
    assert_eq!(catalog.streams.len(), 1);
    assert_eq!(catalog.first_stream_name(), Some("lists"));
    assert!(ConfiguredCatalog::default().first_stream_name().is_none());
}

// ============================================================================
// Sink Tests
// ============================================================================

#[test]
fn test_vec_sink_collects() {
    let mut sink: Vec<Message> = Vec::new();
    assert_eq!(sink.emit(Message::info("a")), ControlFlow::Continue(()));
    assert_eq!(sink.emit(Message::info("b")), ControlFlow::Continue(()));
    assert_eq!(sink.len(), 2);
}
