//! Message grouping
//!
//! Folds the messages of a read into a [`StreamRead`]: request markers open
//! pages, slice markers open slices, records land in the open page and every
//! other log line is kept as is.

use super::limits::TestReadLimits;
use super::types::{HttpRequest, HttpResponse, StreamRead, StreamReadPage, StreamReadSlice};
use crate::declarative::SLICE_PREFIX;
use crate::error::Error;
use crate::http::{RequestSnapshot, ResponseSnapshot, REQUEST_PREFIX, RESPONSE_PREFIX};
use crate::protocol::{LogMessage, Message, MessageSink};
use crate::schema::SchemaInferrer;
use crate::types::LogLevel;
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::ops::ControlFlow;
use tracing::warn;

/// Whether the grouper still accepts messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Reading,
    Aborted,
}

/// Incremental [`StreamRead`] builder fed through [`MessageSink`]
#[derive(Debug)]
pub struct MessageGrouper {
    limits: TestReadLimits,
    phase: Phase,
    logs: Vec<LogMessage>,
    slices: Vec<StreamReadSlice>,
    current_slice: Option<StreamReadSlice>,
    current_page: Option<StreamReadPage>,
    records: usize,
    schema: SchemaInferrer,
}

impl MessageGrouper {
    /// Create an empty grouper
    pub fn new(limits: TestReadLimits) -> Self {
        Self {
            limits,
            phase: Phase::Reading,
            logs: Vec::new(),
            slices: Vec::new(),
            current_slice: None,
            current_page: None,
            records: 0,
            schema: SchemaInferrer::new(),
        }
    }

    /// Records accepted so far
    pub fn records(&self) -> usize {
        self.records
    }

    /// Close everything still open and build the report
    pub fn finish(mut self) -> StreamRead {
        self.close_slice();

        // Computed before the placeholder slice goes in
        let test_read_limit_reached = self.slices.len() >= self.limits.max_slices
            || self
                .slices
                .iter()
                .any(|slice| slice.pages.len() >= self.limits.max_pages_per_slice)
            || self.records >= self.limits.max_records;

        if self.slices.is_empty() {
            self.slices.push(empty_slice());
        }

        StreamRead {
            logs: self.logs,
            slices: self.slices,
            test_read_limit_reached,
            inferred_schema: self.schema.inferred_schema(),
        }
    }

    fn close_page(&mut self) {
        if let Some(page) = self.current_page.take() {
            self.current_slice
                .get_or_insert_with(StreamReadSlice::default)
                .pages
                .push(page);
        }
    }

    fn close_slice(&mut self) {
        self.close_page();
        if let Some(slice) = self.current_slice.take() {
            if !slice.pages.is_empty() {
                self.slices.push(slice);
            }
        }
    }

    fn page(&mut self) -> &mut StreamReadPage {
        self.current_page.get_or_insert_with(StreamReadPage::default)
    }

    fn on_log(&mut self, log: LogMessage) {
        if let Some(json) = log.message.strip_prefix(REQUEST_PREFIX) {
            self.close_page();
            let request = parse_marker::<RequestSnapshot>(REQUEST_PREFIX, json).map(HttpRequest::from);
            self.current_page = Some(StreamReadPage {
                request,
                ..Default::default()
            });
        } else if let Some(json) = log.message.strip_prefix(RESPONSE_PREFIX) {
            let response =
                parse_marker::<ResponseSnapshot>(RESPONSE_PREFIX, json).map(HttpResponse::from);
            self.page().response = response;
        } else if let Some(json) = log.message.strip_prefix(SLICE_PREFIX) {
            self.close_slice();
            self.current_slice = Some(StreamReadSlice {
                slice_descriptor: parse_marker::<Value>(SLICE_PREFIX, json),
                ..Default::default()
            });
        } else {
            self.logs.push(log);
        }
    }

    fn on_record(&mut self, data: Value) -> ControlFlow<()> {
        if self.records >= self.limits.max_records {
            return ControlFlow::Break(());
        }

        self.schema.accumulate(&data);
        self.page().records.push(data);
        self.records += 1;

        if self.records >= self.limits.max_records {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

impl MessageSink for MessageGrouper {
    fn emit(&mut self, message: Message) -> ControlFlow<()> {
        if self.phase == Phase::Aborted {
            return ControlFlow::Break(());
        }

        match message {
            Message::Log { log } => self.on_log(log),
            Message::Record { record } => return self.on_record(record.data),
            Message::State { state } => {
                self.current_slice
                    .get_or_insert_with(StreamReadSlice::default)
                    .state = Some(state.data);
            }
            Message::Trace { trace } => {
                let text = format!("{} - {}", trace.error.message, trace.error.detail());
                self.logs.push(LogMessage::new(LogLevel::Error, text));
                self.phase = Phase::Aborted;
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}

/// Group a complete message sequence
pub fn group(messages: impl IntoIterator<Item = Message>, limits: TestReadLimits) -> StreamRead {
    let mut grouper = MessageGrouper::new(limits);
    for message in messages {
        if grouper.emit(message).is_break() {
            break;
        }
    }
    grouper.finish()
}

/// Group messages as a stream produces them
pub async fn group_stream<S>(messages: S, limits: TestReadLimits) -> StreamRead
where
    S: Stream<Item = Message>,
{
    let mut grouper = MessageGrouper::new(limits);
    let mut messages = std::pin::pin!(messages);
    while let Some(message) = messages.next().await {
        if grouper.emit(message).is_break() {
            break;
        }
    }
    grouper.finish()
}

impl StreamRead {
    /// Report for a read that failed before producing anything
    pub fn from_error(error: &Error) -> Self {
        Self::from_failure(&error.to_string(), &error.detail())
    }

    /// Report carrying a single error log `"{message} - {detail}"`
    pub fn from_failure(message: &str, detail: &str) -> Self {
        Self {
            logs: vec![LogMessage::new(
                LogLevel::Error,
                format!("{message} - {detail}"),
            )],
            slices: vec![empty_slice()],
            test_read_limit_reached: false,
            inferred_schema: None,
        }
    }
}

fn empty_slice() -> StreamReadSlice {
    StreamReadSlice {
        pages: vec![StreamReadPage::default()],
        ..Default::default()
    }
}

fn parse_marker<T: DeserializeOwned>(prefix: &str, json: &str) -> Option<T> {
    serde_json::from_str(json)
        .map_err(|e| warn!(marker = prefix, error = %e, "Ignoring malformed marker"))
        .ok()
}
