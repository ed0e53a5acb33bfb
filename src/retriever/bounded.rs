//! Bounded retrieval for test reads

use super::simple::SimpleRetriever;
use super::types::Retriever;
use crate::builder::TestReadLimits;
use crate::error::Result;
use crate::http::HttpRequester;
use crate::pagination::BoundedPaginator;
use crate::partition::{BoundedPartitionRouter, Slices, StreamSlice};
use crate::protocol::{Message, MessageSink};
use async_trait::async_trait;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// A [`SimpleRetriever`] capped for interactive testing.
///
/// Pages per slice and slices per stream are bounded by wrapping the
/// paginator and partition router, retries are disabled, and no more than
/// `max_records` records are emitted across all slices.
#[derive(Debug)]
pub struct TestReadRetriever {
    inner: SimpleRetriever,
    limits: TestReadLimits,
    emitted: AtomicUsize,
}

impl TestReadRetriever {
    /// Wrap `retriever` with `limits`
    pub fn new(retriever: SimpleRetriever, limits: TestReadLimits) -> Self {
        let SimpleRetriever {
            mut requester,
            paginator,
            partition_router,
            record_selector,
        } = retriever;

        requester.set_max_retries(0);
        let inner = SimpleRetriever::new(requester, record_selector)
            .with_paginator(Box::new(BoundedPaginator::new(
                paginator,
                limits.max_pages_per_slice,
            )))
            .with_partition_router(Box::new(BoundedPartitionRouter::new(
                partition_router,
                limits.max_slices,
            )));

        Self {
            inner,
            limits,
            emitted: AtomicUsize::new(0),
        }
    }

    /// Limits in force
    pub fn limits(&self) -> &TestReadLimits {
        &self.limits
    }

    /// Records emitted so far
    pub fn records_emitted(&self) -> usize {
        self.emitted.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for TestReadRetriever {
    fn stream_slices(&self) -> Slices<'_> {
        self.inner.stream_slices()
    }

    async fn read_records(
        &self,
        stream: &str,
        slice: &StreamSlice,
        sink: &mut dyn MessageSink,
    ) -> Result<ControlFlow<()>> {
        if self.records_emitted() >= self.limits.max_records {
            debug!(stream, "Record limit reached, skipping slice");
            return Ok(ControlFlow::Break(()));
        }

        let mut budget = RecordBudget {
            sink,
            emitted: &self.emitted,
            max_records: self.limits.max_records,
        };
        self.inner.read_records(stream, slice, &mut budget).await
    }

    fn requester(&self) -> Option<&HttpRequester> {
        self.inner.requester()
    }
}

/// Forwards messages, breaking once the record budget is spent
struct RecordBudget<'a> {
    sink: &'a mut dyn MessageSink,
    emitted: &'a AtomicUsize,
    max_records: usize,
}

impl MessageSink for RecordBudget<'_> {
    fn emit(&mut self, message: Message) -> ControlFlow<()> {
        if !message.is_record() {
            return self.sink.emit(message);
        }
        if self.emitted.load(Ordering::SeqCst) >= self.max_records {
            return ControlFlow::Break(());
        }

        let emitted = self.emitted.fetch_add(1, Ordering::SeqCst) + 1;
        let flow = self.sink.emit(message);
        if emitted >= self.max_records {
            ControlFlow::Break(())
        } else {
            flow
        }
    }
}
