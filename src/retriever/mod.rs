//! Record retrieval
//!
//! # Overview
//!
//! - [`Retriever`] - reads one stream slice at a time into a message sink
//! - [`SimpleRetriever`] - requester, paginator, partition router and record
//!   selector driven page by page
//! - [`TestReadRetriever`] - the same retriever capped by [`TestReadLimits`]
//!
//! [`TestReadLimits`]: crate::builder::TestReadLimits

mod bounded;
mod simple;
mod types;

pub use bounded::TestReadRetriever;
pub use simple::SimpleRetriever;
pub use types::Retriever;

#[cfg(test)]
mod tests;
