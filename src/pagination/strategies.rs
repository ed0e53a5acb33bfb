//! Pagination strategy implementations
//!
//! Each strategy handles a specific pagination pattern.

use super::types::{NextPage, PaginationState, PaginationStrategy, Paginator};
use crate::error::Result;
use crate::http::{RequestConfig, RequestOption};
use crate::template::{evaluate, evaluate_condition, value_to_string, TemplateContext};
use serde_json::Value;

// ============================================================================
// No Pagination
// ============================================================================

/// Single page per slice
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPagination;

impl Paginator for NoPagination {
    fn request_options(&self, _state: &PaginationState, _request: &mut RequestConfig) -> Result<()> {
        Ok(())
    }

    fn process_response(
        &self,
        _ctx: &TemplateContext,
        _records_count: usize,
        _state: &PaginationState,
    ) -> Result<NextPage> {
        Ok(NextPage::Done)
    }
}

// ============================================================================
// Default Paginator
// ============================================================================

/// Where the next-page token goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTokenOption {
    /// Injected like any other request option
    RequestOption(RequestOption),
    /// Used as the request path (or full URL)
    RequestPath,
}

/// Strategy-driven paginator with configurable token placement
#[derive(Debug)]
pub struct DefaultPaginator {
    strategy: Box<dyn PaginationStrategy>,
    page_size_option: Option<RequestOption>,
    page_token_option: Option<PageTokenOption>,
}

impl DefaultPaginator {
    /// Create a paginator around `strategy`
    pub fn new(strategy: Box<dyn PaginationStrategy>) -> Self {
        Self {
            strategy,
            page_size_option: None,
            page_token_option: None,
        }
    }

    /// Set where the page size goes
    #[must_use]
    pub fn with_page_size_option(mut self, option: RequestOption) -> Self {
        self.page_size_option = Some(option);
        self
    }

    /// Set where the token goes
    #[must_use]
    pub fn with_page_token_option(mut self, option: PageTokenOption) -> Self {
        self.page_token_option = Some(option);
        self
    }
}

impl Paginator for DefaultPaginator {
    fn initial_token(&self) -> Option<Value> {
        self.strategy.initial_token()
    }

    fn request_options(&self, state: &PaginationState, request: &mut RequestConfig) -> Result<()> {
        if let (Some(option), Some(size)) = (&self.page_size_option, self.strategy.page_size()) {
            request.inject(option, &Value::from(size))?;
        }
        if let (Some(PageTokenOption::RequestOption(option)), Some(token)) =
            (&self.page_token_option, &state.token)
        {
            request.inject(option, token)?;
        }
        Ok(())
    }

    fn request_path(&self, state: &PaginationState) -> Option<String> {
        match (&self.page_token_option, &state.token) {
            (Some(PageTokenOption::RequestPath), Some(token)) => Some(value_to_string(token)),
            _ => None,
        }
    }

    fn process_response(
        &self,
        ctx: &TemplateContext,
        records_count: usize,
        state: &PaginationState,
    ) -> Result<NextPage> {
        Ok(match self.strategy.next_token(ctx, records_count, state)? {
            Some(token) => NextPage::Continue { token },
            None => NextPage::Done,
        })
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Next token read from the response (e.g. `{{ response.next_cursor }}`)
#[derive(Debug, Clone)]
pub struct CursorPagination {
    /// Template producing the next token
    pub cursor_value: String,
    /// Condition that ends pagination when true
    pub stop_condition: Option<String>,
    /// Page size to request
    pub page_size: Option<u64>,
}

impl CursorPagination {
    /// Create a cursor strategy
    pub fn new(cursor_value: impl Into<String>) -> Self {
        Self {
            cursor_value: cursor_value.into(),
            stop_condition: None,
            page_size: None,
        }
    }

    /// Set the stop condition
    #[must_use]
    pub fn with_stop_condition(mut self, condition: impl Into<String>) -> Self {
        self.stop_condition = Some(condition.into());
        self
    }

    /// Set the page size
    #[must_use]
    pub fn with_page_size(mut self, page_size: u64) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

impl PaginationStrategy for CursorPagination {
    fn next_token(
        &self,
        ctx: &TemplateContext,
        _records_count: usize,
        _state: &PaginationState,
    ) -> Result<Option<Value>> {
        if let Some(ref condition) = self.stop_condition {
            if evaluate_condition(condition, ctx)? {
                return Ok(None);
            }
        }

        Ok(evaluate(&self.cursor_value, ctx).filter(|token| match token {
            Value::String(s) => !s.is_empty(),
            _ => true,
        }))
    }

    fn page_size(&self) -> Option<u64> {
        self.page_size
    }
}

// ============================================================================
// Offset Increment
// ============================================================================

/// Offset advanced by the number of records read
#[derive(Debug, Clone)]
pub struct OffsetIncrement {
    /// Page size to request; a shorter page ends pagination
    pub page_size: Option<u64>,
    /// Send `offset=0` on the first request
    pub inject_on_first_request: bool,
}

impl OffsetIncrement {
    /// Create an offset strategy
    pub fn new(page_size: Option<u64>) -> Self {
        Self {
            page_size,
            inject_on_first_request: false,
        }
    }
}

impl PaginationStrategy for OffsetIncrement {
    fn initial_token(&self) -> Option<Value> {
        self.inject_on_first_request.then(|| Value::from(0))
    }

    fn next_token(
        &self,
        _ctx: &TemplateContext,
        records_count: usize,
        state: &PaginationState,
    ) -> Result<Option<Value>> {
        if is_last_page(self.page_size, records_count) {
            return Ok(None);
        }
        let offset = state.token.as_ref().and_then(Value::as_u64).unwrap_or(0);
        Ok(Some(Value::from(offset + records_count as u64)))
    }

    fn page_size(&self) -> Option<u64> {
        self.page_size
    }
}

// ============================================================================
// Page Increment
// ============================================================================

/// Page number advanced by one per page
#[derive(Debug, Clone)]
pub struct PageIncrement {
    /// Page size to request; a shorter page ends pagination
    pub page_size: Option<u64>,
    /// Number of the first page
    pub start_from_page: u64,
    /// Send the first page number on the first request
    pub inject_on_first_request: bool,
}

impl PageIncrement {
    /// Create a page number strategy
    pub fn new(page_size: Option<u64>, start_from_page: u64) -> Self {
        Self {
            page_size,
            start_from_page,
            inject_on_first_request: false,
        }
    }
}

impl PaginationStrategy for PageIncrement {
    fn initial_token(&self) -> Option<Value> {
        self.inject_on_first_request
            .then(|| Value::from(self.start_from_page))
    }

    fn next_token(
        &self,
        _ctx: &TemplateContext,
        records_count: usize,
        state: &PaginationState,
    ) -> Result<Option<Value>> {
        if is_last_page(self.page_size, records_count) {
            return Ok(None);
        }
        let page = state
            .token
            .as_ref()
            .and_then(Value::as_u64)
            .unwrap_or(self.start_from_page);
        Ok(Some(Value::from(page + 1)))
    }

    fn page_size(&self) -> Option<u64> {
        self.page_size
    }
}

fn is_last_page(page_size: Option<u64>, records_count: usize) -> bool {
    match page_size {
        Some(size) => (records_count as u64) < size,
        None => records_count == 0,
    }
}

// ============================================================================
// Bounded Paginator
// ============================================================================

/// Stops any paginator after a fixed number of pages per slice
#[derive(Debug)]
pub struct BoundedPaginator {
    inner: Box<dyn Paginator>,
    max_pages: usize,
}

impl BoundedPaginator {
    /// Limit `inner` to `max_pages` pages per slice
    pub fn new(inner: Box<dyn Paginator>, max_pages: usize) -> Self {
        Self { inner, max_pages }
    }

    /// Page limit per slice
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}

impl Paginator for BoundedPaginator {
    fn initial_token(&self) -> Option<Value> {
        self.inner.initial_token()
    }

    fn request_options(&self, state: &PaginationState, request: &mut RequestConfig) -> Result<()> {
        self.inner.request_options(state, request)
    }

    fn request_path(&self, state: &PaginationState) -> Option<String> {
        self.inner.request_path(state)
    }

    fn process_response(
        &self,
        ctx: &TemplateContext,
        records_count: usize,
        state: &PaginationState,
    ) -> Result<NextPage> {
        if state.pages_fetched >= self.max_pages {
            return Ok(NextPage::Done);
        }
        self.inner.process_response(ctx, records_count, state)
    }
}
