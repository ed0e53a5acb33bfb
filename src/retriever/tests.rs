//! Tests for the retriever module

use super::*;
use crate::builder::TestReadLimits;
use crate::error::{Error, Result};
use crate::extractor::{DpathExtractor, RecordSelector};
use crate::http::{HttpClientConfig, HttpRequester, InjectInto, RequestOption};
use crate::pagination::{CursorPagination, DefaultPaginator, PageTokenOption};
use crate::partition::ListPartitionRouter;
use crate::protocol::{Message, MessageSink};
use crate::types::BackoffType;
use serde_json::{json, Value};
use std::ops::ControlFlow;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn requester(server: &MockServer) -> HttpRequester {
    let config = HttpClientConfig::default()
        .with_backoff(
            BackoffType::Constant,
            Duration::from_millis(1),
            Duration::from_millis(5),
        )
        .without_rate_limit();
    HttpRequester::new(server.uri(), "/items", json!({}), config).unwrap()
}

fn retriever(server: &MockServer) -> SimpleRetriever {
    let paginator = DefaultPaginator::new(Box::new(CursorPagination::new("{{ response.next }}")))
        .with_page_token_option(PageTokenOption::RequestOption(RequestOption::new(
            InjectInto::RequestParameter,
            "cursor",
        )));
    let router = ListPartitionRouter::new(vec![json!("a"), json!("b"), json!("c")], "item")
        .with_request_option(RequestOption::new(InjectInto::RequestParameter, "item"));

    SimpleRetriever::new(
        requester(server),
        RecordSelector::new(DpathExtractor::new(vec!["data".to_string()])),
    )
    .with_paginator(Box::new(paginator))
    .with_partition_router(Box::new(router))
}

/// Two pages per slice: two records then one
async fn mount_pages(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/items"))
        .and(query_param("cursor", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"id": 3}]})))
        .with_priority(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/items"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1}, {"id": 2}],
            "next": "p2"
        })))
        .mount(server)
        .await;
}

async fn read_all(retriever: &dyn Retriever, sink: &mut dyn MessageSink) -> Result<()> {
    for slice in retriever.stream_slices() {
        let slice = slice?;
        if retriever.read_records("items", &slice, sink).await?.is_break() {
            break;
        }
    }
    Ok(())
}

fn records(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| match m {
            Message::Record { record } => Some(record.data.clone()),
            _ => None,
        })
        .collect()
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
// Simple Retriever Tests
// ============================================================================

#[tokio::test]
async fn test_simple_retriever_reads_every_slice_and_page() {
    let server = MockServer::start().await;
    mount_pages(&server).await;

    let retriever = retriever(&server);
    let mut messages = Vec::new();
    read_all(&retriever, &mut messages).await.unwrap();

    assert_eq!(records(&messages).len(), 9);

    let logs = log_lines(&messages);
    assert_eq!(logs.len(), 12);
    assert!(logs[0].starts_with("request:"));
    assert!(logs[0].contains("item=a"));
    assert!(logs[1].starts_with("response:"));
    assert!(logs[2].contains("cursor=p2"));
}

#[tokio::test]
async fn test_simple_retriever_logs_then_fails_on_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let retriever = SimpleRetriever::new(requester(&server), RecordSelector::new(DpathExtractor::default()));
    let mut messages = Vec::new();
    let slice = retriever.stream_slices().next().unwrap().unwrap();
    let err = retriever
        .read_records("items", &slice, &mut messages)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 403, .. }));
    let logs = log_lines(&messages);
    assert_eq!(logs.len(), 2);
    assert!(logs[1].contains("forbidden"));
}

#[tokio::test]
async fn test_simple_retriever_stops_when_sink_breaks() {
    struct FirstRecordOnly(Vec<Message>);

    impl MessageSink for FirstRecordOnly {
        fn emit(&mut self, message: Message) -> ControlFlow<()> {
            let is_record = message.is_record();
            self.0.push(message);
            if is_record {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        }
    }

    let server = MockServer::start().await;
    mount_pages(&server).await;

    let retriever = retriever(&server);
    let mut sink = FirstRecordOnly(Vec::new());
    read_all(&retriever, &mut sink).await.unwrap();

    assert_eq!(records(&sink.0).len(), 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

// ============================================================================
// Test Read Retriever Tests
// ============================================================================

#[tokio::test]
async fn test_test_read_retriever_disables_retries() {
    let server = MockServer::start().await;
    let retriever = TestReadRetriever::new(retriever(&server), TestReadLimits::default());
    assert_eq!(retriever.requester().unwrap().max_retries(), 0);
    assert_eq!(retriever.limits(), &TestReadLimits::default());
}

#[tokio::test]
async fn test_test_read_retriever_does_not_retry_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let retriever = TestReadRetriever::new(retriever(&server), TestReadLimits::default());
    let mut messages = Vec::new();
    assert!(read_all(&retriever, &mut messages).await.is_err());
}

#[tokio::test]
async fn test_test_read_retriever_caps_slices_and_pages() {
    let server = MockServer::start().await;
    mount_pages(&server).await;

    let limits = TestReadLimits::default()
        .with_max_slices(2)
        .with_max_pages_per_slice(1);
    let retriever = TestReadRetriever::new(retriever(&server), limits);

    assert_eq!(retriever.stream_slices().count(), 2);

    let mut messages = Vec::new();
    read_all(&retriever, &mut messages).await.unwrap();
    assert_eq!(records(&messages).len(), 4);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_test_read_retriever_caps_records_across_slices() {
    let server = MockServer::start().await;
    mount_pages(&server).await;

    let limits = TestReadLimits::default().with_max_records(4);
    let retriever = TestReadRetriever::new(retriever(&server), limits);

    let mut messages = Vec::new();
    read_all(&retriever, &mut messages).await.unwrap();

    assert_eq!(records(&messages).len(), 4);
    assert_eq!(retriever.records_emitted(), 4);
    // slice a: 2 pages, slice b: first page only
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}
