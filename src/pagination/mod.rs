//! Pagination module
//!
//! Supports: Cursor, Offset Increment, Page Increment, No Pagination
//!
//! # Overview
//!
//! A [`Paginator`] decides, after each response, whether there is another
//! page and which token fetches it. [`DefaultPaginator`] splits that job in
//! two: a [`PaginationStrategy`] computes the token, and request options
//! say where the token and page size go on the next request.

mod strategies;
mod types;

pub use strategies::{
    BoundedPaginator, CursorPagination, DefaultPaginator, NoPagination, OffsetIncrement,
    PageIncrement, PageTokenOption,
};
pub use types::{NextPage, PaginationState, PaginationStrategy, Paginator};
