//! Protocol message types

use crate::error::Error;
use crate::types::LogLevel;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message emitted by a read or returned by a command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Message {
    /// A single record
    Record {
        /// The record envelope
        record: RecordMessage,
    },
    /// Log line
    Log {
        /// The log payload
        log: LogMessage,
    },
    /// Error signal
    Trace {
        /// The trace payload
        trace: TraceMessage,
    },
    /// State checkpoint
    State {
        /// The checkpoint payload
        state: StateMessage,
    },
}

/// A record emitted on a stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMessage {
    /// Stream name
    pub stream: String,
    /// Record payload
    pub data: Value,
    /// Emission time, milliseconds since the epoch
    pub emitted_at: i64,
}

/// A leveled log line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMessage {
    /// Log level
    pub level: LogLevel,
    /// Log text
    pub message: String,
}

impl LogMessage {
    /// Create a log message
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// An error trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceMessage {
    /// Trace type; always `ERROR` here
    #[serde(rename = "type", default = "default_trace_type")]
    pub trace_type: String,
    /// Emission time, milliseconds since the epoch
    pub emitted_at: i64,
    /// Error details
    pub error: ErrorDetails,
}

fn default_trace_type() -> String {
    "ERROR".to_string()
}

/// Human and technical description of a failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Short human-readable message
    pub message: String,
    /// The underlying error text
    #[serde(default)]
    pub internal_message: Option<String>,
    /// Technical detail
    #[serde(default)]
    pub stack_trace: Option<String>,
    /// Failure classification
    #[serde(default)]
    pub failure_type: FailureType,
}

impl ErrorDetails {
    /// The text a report shows for this failure: the technical detail, or
    /// the internal message when no detail was captured
    pub fn detail(&self) -> &str {
        self.stack_trace
            .as_deref()
            .or(self.internal_message.as_deref())
            .unwrap_or_default()
    }
}

/// Failure classification carried by traces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureType {
    /// A bug or unexpected condition on our side
    #[default]
    SystemError,
    /// A problem with the user's configuration or manifest
    ConfigError,
}

/// A state checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMessage {
    /// Checkpoint payload
    pub data: Value,
}

impl Message {
    /// Create a record message stamped with the current time
    pub fn record(stream: impl Into<String>, data: Value) -> Self {
        Self::Record {
            record: RecordMessage {
                stream: stream.into(),
                data,
                emitted_at: now_millis(),
            },
        }
    }

    /// Create a state message
    pub fn state(data: Value) -> Self {
        Self::State {
            state: StateMessage { data },
        }
    }

    /// Create a log message
    pub fn log(level: LogLevel, message: impl Into<String>) -> Self {
        Self::Log {
            log: LogMessage::new(level, message),
        }
    }

    /// Create an info log
    pub fn info(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Info, message)
    }

    /// Create a debug log
    pub fn debug(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Debug, message)
    }

    /// Create a warning log
    pub fn warn(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Warn, message)
    }

    /// Create an error log
    pub fn error(message: impl Into<String>) -> Self {
        Self::log(LogLevel::Error, message)
    }

    /// Create an error trace from explicit parts
    pub fn trace(
        message: impl Into<String>,
        internal_message: Option<String>,
        stack_trace: Option<String>,
    ) -> Self {
        Self::Trace {
            trace: TraceMessage {
                trace_type: default_trace_type(),
                emitted_at: now_millis(),
                error: ErrorDetails {
                    message: message.into(),
                    internal_message,
                    stack_trace,
                    failure_type: FailureType::SystemError,
                },
            },
        }
    }

    /// Create an error trace describing `error`
    pub fn trace_from_error(message: impl Into<String>, error: &Error) -> Self {
        Self::trace(message, Some(error.to_string()), Some(error.detail()))
    }

    /// Check if this is a record message
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record { .. })
    }

    /// Check if this is a state message
    pub fn is_state(&self) -> bool {
        matches!(self, Self::State { .. })
    }

    /// Check if this is a log message
    pub fn is_log(&self) -> bool {
        matches!(self, Self::Log { .. })
    }

    /// Check if this is a trace message
    pub fn is_trace(&self) -> bool {
        matches!(self, Self::Trace { .. })
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
