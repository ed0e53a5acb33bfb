//! Protocol messages
//!
//! The message vocabulary a read produces and the command dispatcher returns:
//! `RECORD`, `LOG`, `TRACE` and `STATE`, serialized one JSON document per line.
//!
//! # Overview
//!
//! - `Message` - the tagged union, with constructors mirroring each variant
//! - `ConfiguredCatalog` - which streams a read should cover
//! - `MessageSink` - where a read pushes its messages as they are produced

mod catalog;
mod messages;
mod sink;

pub use catalog::{AirbyteStream, ConfiguredCatalog, ConfiguredStream};
pub use messages::{
    ErrorDetails, FailureType, LogMessage, Message, RecordMessage, StateMessage, TraceMessage,
};
pub use sink::MessageSink;

#[cfg(test)]
mod tests;
