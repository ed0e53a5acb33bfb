//! Page-by-page HTTP retrieval

use super::types::Retriever;
use crate::error::{Error, Result};
use crate::extractor::RecordSelector;
use crate::http::{HttpRequester, RequestConfig};
use crate::pagination::{NoPagination, PaginationState, Paginator};
use crate::partition::{PartitionRouter, SinglePartitionRouter, Slices, StreamSlice};
use crate::protocol::{Message, MessageSink};
use async_trait::async_trait;
use std::ops::ControlFlow;
use tracing::debug;

/// Requester + paginator + partition router + record selector
#[derive(Debug)]
pub struct SimpleRetriever {
    pub(crate) requester: HttpRequester,
    pub(crate) paginator: Box<dyn Paginator>,
    pub(crate) partition_router: Box<dyn PartitionRouter>,
    pub(crate) record_selector: RecordSelector,
}

impl SimpleRetriever {
    /// Single-slice, single-page retriever
    pub fn new(requester: HttpRequester, record_selector: RecordSelector) -> Self {
        Self {
            requester,
            paginator: Box::new(NoPagination),
            partition_router: Box::new(SinglePartitionRouter),
            record_selector,
        }
    }

    /// Set the paginator
    #[must_use]
    pub fn with_paginator(mut self, paginator: Box<dyn Paginator>) -> Self {
        self.paginator = paginator;
        self
    }

    /// Set the partition router
    #[must_use]
    pub fn with_partition_router(mut self, router: Box<dyn PartitionRouter>) -> Self {
        self.partition_router = router;
        self
    }
}

macro_rules! emit {
    ($sink:expr, $message:expr) => {
        if $sink.emit($message).is_break() {
            return Ok(ControlFlow::Break(()));
        }
    };
}

#[async_trait]
impl Retriever for SimpleRetriever {
    fn stream_slices(&self) -> Slices<'_> {
        self.partition_router.stream_slices()
    }

    async fn read_records(
        &self,
        stream: &str,
        slice: &StreamSlice,
        sink: &mut dyn MessageSink,
    ) -> Result<ControlFlow<()>> {
        let mut state = PaginationState::new(self.paginator.initial_token());

        while !state.done {
            let mut ctx = self.requester.context();
            ctx.set_stream_slice(slice.to_value())
                .set_next_page_token(state.token_value());

            let mut extra = RequestConfig::new();
            self.partition_router.request_options(slice, &mut extra)?;
            self.paginator.request_options(&state, &mut extra)?;
            let path = self.paginator.request_path(&state);

            let exchange = self.requester.send(&ctx, path.as_deref(), extra).await?;
            emit!(sink, exchange.request_log()?);
            emit!(sink, exchange.response_log()?);

            let response = &exchange.response;
            if !response.is_success() {
                return Err(Error::http_status(response.status, response.body.clone()));
            }

            let body = self.record_selector.decode(&response.body)?;
            ctx.set_response(body, response.headers_value());
            let records = self.record_selector.select(&ctx.response, &ctx)?;
            let count = records.len();

            for record in records {
                emit!(sink, Message::record(stream, record));
            }

            state.record_page(count);
            debug!(
                stream,
                page = state.pages_fetched,
                records = count,
                "Fetched page"
            );

            let next = self.paginator.process_response(&ctx, count, &state)?;
            state.advance(next);
        }

        Ok(ControlFlow::Continue(()))
    }

    fn requester(&self) -> Option<&HttpRequester> {
        Some(&self.requester)
    }
}
