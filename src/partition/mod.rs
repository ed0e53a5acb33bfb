//! Partition module
//!
//! Supports: Single partition, List, Datetime windows, Bounded
//!
//! # Overview
//!
//! A partition router splits a stream into slices. Each slice is read
//! separately, with its own pagination, and may add options to the
//! requests made for it.

mod datetime;
mod routers;
mod types;

pub use datetime::{
    parse_datetime, parse_granularity, DatetimePartitionRouter, Step, PARTITION_END, PARTITION_START,
};
pub use routers::{BoundedPartitionRouter, ListPartitionRouter, SinglePartitionRouter};
pub use types::{PartitionRouter, Slices, StreamSlice};
