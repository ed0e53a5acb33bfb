//! Partition router implementations

use super::types::{PartitionRouter, Slices, StreamSlice};
use crate::error::Result;
use crate::http::{RequestConfig, RequestOption};
use serde_json::Value;

// ============================================================================
// Single Partition
// ============================================================================

/// A stream read as one slice
#[derive(Debug, Clone, Copy, Default)]
pub struct SinglePartitionRouter;

impl PartitionRouter for SinglePartitionRouter {
    fn stream_slices(&self) -> Slices<'_> {
        Box::new(std::iter::once(Ok(StreamSlice::new())))
    }
}

// ============================================================================
// List Partition
// ============================================================================

/// One slice per value of a fixed list
///
/// Each slice is `{cursor_field: value}`.
#[derive(Debug, Clone)]
pub struct ListPartitionRouter {
    values: Vec<Value>,
    cursor_field: String,
    request_option: Option<RequestOption>,
}

impl ListPartitionRouter {
    /// Create a new list router
    pub fn new(values: Vec<Value>, cursor_field: impl Into<String>) -> Self {
        Self {
            values,
            cursor_field: cursor_field.into(),
            request_option: None,
        }
    }

    /// Send each slice's value on its requests
    #[must_use]
    pub fn with_request_option(mut self, option: RequestOption) -> Self {
        self.request_option = Some(option);
        self
    }

    /// Slice key
    pub fn cursor_field(&self) -> &str {
        &self.cursor_field
    }
}

impl PartitionRouter for ListPartitionRouter {
    fn stream_slices(&self) -> Slices<'_> {
        Box::new(self.values.iter().map(|value| {
            Ok(StreamSlice::new().with_value(self.cursor_field.clone(), value.clone()))
        }))
    }

    fn request_options(&self, slice: &StreamSlice, request: &mut RequestConfig) -> Result<()> {
        if let (Some(option), Some(value)) = (&self.request_option, slice.get(&self.cursor_field)) {
            request.inject(option, value)?;
        }
        Ok(())
    }
}

// ============================================================================
// Bounded Partition
// ============================================================================

/// Keeps only the first slices of another router
#[derive(Debug)]
pub struct BoundedPartitionRouter {
    inner: Box<dyn PartitionRouter>,
    max_slices: usize,
}

impl BoundedPartitionRouter {
    /// Limit `inner` to `max_slices` slices
    pub fn new(inner: Box<dyn PartitionRouter>, max_slices: usize) -> Self {
        Self { inner, max_slices }
    }

    /// Slice limit
    pub fn max_slices(&self) -> usize {
        self.max_slices
    }
}

impl PartitionRouter for BoundedPartitionRouter {
    fn stream_slices(&self) -> Slices<'_> {
        Box::new(self.inner.stream_slices().take(self.max_slices))
    }

    fn request_options(&self, slice: &StreamSlice, request: &mut RequestConfig) -> Result<()> {
        self.inner.request_options(slice, request)
    }
}
