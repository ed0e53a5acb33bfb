//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by all strategies.

use crate::error::Result;
use crate::http::RequestConfig;
use crate::template::TemplateContext;
use serde_json::Value;

/// Result of inspecting a page
#[derive(Debug, Clone, PartialEq)]
pub enum NextPage {
    /// Fetch another page with this token
    Continue {
        /// Token identifying the next page
        token: Value,
    },
    /// No more pages
    Done,
}

impl NextPage {
    /// Continue with `token`
    pub fn with_token(token: impl Into<Value>) -> Self {
        Self::Continue {
            token: token.into(),
        }
    }

    /// Check if pagination is done
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }
}

/// Pagination progress within one slice
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaginationState {
    /// Pages fetched so far
    pub pages_fetched: usize,
    /// Token for the next request; `None` before the first
    pub token: Option<Value>,
    /// Records seen so far
    pub total_fetched: u64,
    /// Whether pagination has finished
    pub done: bool,
}

impl PaginationState {
    /// Start a slice from `initial_token`
    pub fn new(initial_token: Option<Value>) -> Self {
        Self {
            token: initial_token,
            ..Default::default()
        }
    }

    /// Count a fetched page
    pub fn record_page(&mut self, records: usize) {
        self.pages_fetched += 1;
        self.total_fetched += records as u64;
    }

    /// Apply the paginator's decision
    pub fn advance(&mut self, next: NextPage) {
        match next {
            NextPage::Continue { token } => self.token = Some(token),
            NextPage::Done => self.done = true,
        }
    }

    /// Next-page token as templates see it
    pub fn token_value(&self) -> Value {
        match self.token {
            Some(ref token) => serde_json::json!({ "next_page_token": token }),
            None => Value::Object(serde_json::Map::new()),
        }
    }
}

/// Decides how pages follow each other
pub trait Paginator: Send + Sync + std::fmt::Debug {
    /// Token for the first request of a slice
    fn initial_token(&self) -> Option<Value> {
        None
    }

    /// Add page size and token options to a request
    fn request_options(&self, state: &PaginationState, request: &mut RequestConfig) -> Result<()>;

    /// Path that replaces the requester's path for this request
    fn request_path(&self, _state: &PaginationState) -> Option<String> {
        None
    }

    /// Inspect a page and decide what comes next.
    ///
    /// `ctx` has the response body and headers set; `state` already counts
    /// the page being inspected.
    fn process_response(
        &self,
        ctx: &TemplateContext,
        records_count: usize,
        state: &PaginationState,
    ) -> Result<NextPage>;
}

/// Computes next-page tokens for a [`DefaultPaginator`](super::DefaultPaginator)
pub trait PaginationStrategy: Send + Sync + std::fmt::Debug {
    /// Token for the first request, if one is sent
    fn initial_token(&self) -> Option<Value> {
        None
    }

    /// Token for the next page, or `None` when done
    fn next_token(
        &self,
        ctx: &TemplateContext,
        records_count: usize,
        state: &PaginationState,
    ) -> Result<Option<Value>>;

    /// Page size to request, if fixed
    fn page_size(&self) -> Option<u64>;
}
