//! Error types for the connector builder
//!
//! This module defines the error hierarchy for the entire crate.
//! All public APIs return `Result<T, Error>` where Error is defined here.
//!
//! Errors fall into two tiers. Invocation errors (a malformed request, an
//! unknown command, an unreadable config file) are returned to the caller
//! untouched. Everything else is a domain error and is turned into a `TRACE`
//! message or a StreamRead log line at the command boundary.

use thiserror::Error;

/// The main error type for the connector builder
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Invocation Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required config field: {field}")]
    MissingConfigField { field: String },

    #[error("Invalid config value for '{field}': {message}")]
    InvalidConfigValue { field: String, message: String },

    #[error("Unrecognized command: {command}")]
    InvalidCommand { command: String },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ============================================================================
    // Manifest Errors
    // ============================================================================
    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Manifest resolution failed at '{path}': {message}")]
    ManifestResolution { path: String, message: String },

    #[error("Unsupported component type '{component_type}'")]
    UnsupportedComponent { component_type: String },

    #[error("Invalid {component} component: {message}")]
    InvalidComponent { component: String, message: String },

    #[error("Stream '{stream}' not found in manifest")]
    StreamNotFound { stream: String },

    #[error("{message}")]
    StreamListing { message: String },

    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Data Processing Errors
    // ============================================================================
    #[error("JSONPath error: {message}")]
    JsonPath { message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // Template Errors
    // ============================================================================
    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Undefined variable in template: {variable}")]
    UndefinedVariable { variable: String },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    /// Create an invalid config value error
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfigValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an unrecognized command error
    pub fn invalid_command(command: impl Into<String>) -> Self {
        Self::InvalidCommand {
            command: command.into(),
        }
    }

    /// Create a manifest resolution error
    pub fn resolution(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ManifestResolution {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an undefined reference error
    pub fn undefined_reference(path: impl Into<String>, reference: &str) -> Self {
        Self::resolution(path, format!("undefined reference '{reference}'"))
    }

    /// Create a circular reference error
    pub fn circular_reference(path: impl Into<String>, reference: &str) -> Self {
        Self::resolution(path, format!("circular reference '{reference}'"))
    }

    /// Create an unsupported component error
    pub fn unsupported_component(component_type: impl Into<String>) -> Self {
        Self::UnsupportedComponent {
            component_type: component_type.into(),
        }
    }

    /// Create an invalid component error
    pub fn invalid_component(component: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidComponent {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a stream listing error
    pub fn stream_listing(message: impl Into<String>) -> Self {
        Self::StreamListing {
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// Create a JSONPath error
    pub fn json_path(message: impl Into<String>) -> Self {
        Self::JsonPath {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::Template {
            message: message.into(),
        }
    }

    /// Create an undefined variable error
    pub fn undefined_var(variable: impl Into<String>) -> Self {
        Self::UndefinedVariable {
            variable: variable.into(),
        }
    }

    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(_) | Error::Timeout { .. } => true,
            Error::HttpStatus { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }

    /// Check if this error means the caller invoked us incorrectly.
    ///
    /// Invocation errors are never turned into protocol messages.
    pub fn is_invocation_error(&self) -> bool {
        matches!(
            self,
            Error::Config { .. }
                | Error::MissingConfigField { .. }
                | Error::InvalidConfigValue { .. }
                | Error::InvalidCommand { .. }
                | Error::FileNotFound { .. }
                | Error::Io(_)
        )
    }

    /// Technical detail attached to soft failures: the debug rendering of
    /// the error, including every `Caused by` for contextual errors.
    pub fn detail(&self) -> String {
        format!("{self:?}")
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the connector builder
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors.
///
/// The context becomes the error's message; the original error is kept as
/// its cause.
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, message: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Anyhow(anyhow::Error::new(e.into()).context(message.into())))
    }

    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| Error::Anyhow(anyhow::Error::new(e.into()).context(f())))
    }
}
