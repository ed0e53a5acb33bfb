//! Component models
//!
//! Serde views of resolved manifest components. Fields holding other
//! components stay as raw values so the factory can dispatch on their type.

use crate::http::RequestOption;
use crate::types::Method;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

// ============================================================================
// Stream / Retriever
// ============================================================================

/// `DeclarativeStream`
#[derive(Debug, Clone, Deserialize)]
pub struct DeclarativeStreamModel {
    /// Stream name; falls back to `$parameters.name`
    #[serde(default)]
    pub name: Option<String>,
    /// Primary key, a field, a path or a list of paths
    #[serde(default)]
    pub primary_key: Value,
    /// The retriever component
    pub retriever: Value,
    /// Datetime slicing component
    #[serde(default)]
    pub incremental_sync: Option<Value>,
    /// Record transformations
    #[serde(default)]
    pub transformations: Vec<Value>,
    /// Resolved parameters
    #[serde(rename = "$parameters", default)]
    pub parameters: Map<String, Value>,
}

/// `SimpleRetriever`
#[derive(Debug, Clone, Deserialize)]
pub struct SimpleRetrieverModel {
    /// The requester component
    pub requester: Value,
    /// The record selector component
    pub record_selector: Value,
    /// The paginator component
    #[serde(default)]
    pub paginator: Option<Value>,
    /// One partition router, or a list with at most one element
    #[serde(default)]
    pub partition_router: Option<Value>,
    /// Body decoder component
    #[serde(default)]
    pub decoder: Option<Value>,
}

// ============================================================================
// Requester / Auth
// ============================================================================

/// `HttpRequester`
#[derive(Debug, Clone, Deserialize)]
pub struct HttpRequesterModel {
    /// URL base template
    pub url_base: String,
    /// Path template
    #[serde(default)]
    pub path: String,
    /// Request method
    #[serde(default)]
    pub http_method: Method,
    /// Query parameter templates
    #[serde(default)]
    pub request_parameters: BTreeMap<String, Value>,
    /// Header templates
    #[serde(default)]
    pub request_headers: BTreeMap<String, Value>,
    /// JSON body template
    #[serde(default)]
    pub request_body_json: Option<Value>,
    /// The authenticator component
    #[serde(default)]
    pub authenticator: Option<Value>,
    /// Resolved parameters
    #[serde(rename = "$parameters", default)]
    pub parameters: Map<String, Value>,
}

/// `ApiKeyAuthenticator`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyAuthenticatorModel {
    /// Key template
    pub api_token: String,
    /// Header name (legacy form)
    #[serde(default)]
    pub header: Option<String>,
    /// Where the key goes
    #[serde(default)]
    pub inject_into: Option<RequestOption>,
}

/// `BearerAuthenticator`
#[derive(Debug, Clone, Deserialize)]
pub struct BearerAuthenticatorModel {
    /// Token template
    pub api_token: String,
}

/// `BasicHttpAuthenticator`
#[derive(Debug, Clone, Deserialize)]
pub struct BasicHttpAuthenticatorModel {
    /// Username template
    pub username: String,
    /// Password template
    #[serde(default)]
    pub password: String,
}

// ============================================================================
// Pagination
// ============================================================================

/// `DefaultPaginator`
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultPaginatorModel {
    /// The pagination strategy component
    pub pagination_strategy: Value,
    /// Where the page size goes
    #[serde(default)]
    pub page_size_option: Option<RequestOption>,
    /// `RequestOption` or `RequestPath` component
    #[serde(default)]
    pub page_token_option: Option<Value>,
}

/// `CursorPagination`
#[derive(Debug, Clone, Deserialize)]
pub struct CursorPaginationModel {
    /// Next-token template
    pub cursor_value: String,
    /// Stop condition template
    #[serde(default)]
    pub stop_condition: Option<String>,
    /// Page size, a number or a template
    #[serde(default)]
    pub page_size: Option<Value>,
}

/// `OffsetIncrement`
#[derive(Debug, Clone, Deserialize)]
pub struct OffsetIncrementModel {
    /// Page size, a number or a template
    #[serde(default)]
    pub page_size: Option<Value>,
    /// Send the initial offset on the first request
    #[serde(default)]
    pub inject_on_first_request: bool,
}

/// `PageIncrement`
#[derive(Debug, Clone, Deserialize)]
pub struct PageIncrementModel {
    /// Page size, a number or a template
    #[serde(default)]
    pub page_size: Option<Value>,
    /// First page number
    #[serde(default)]
    pub start_from_page: u64,
    /// Send the first page number on the first request
    #[serde(default)]
    pub inject_on_first_request: bool,
}

// ============================================================================
// Partitioning
// ============================================================================

/// `ListPartitionRouter`
#[derive(Debug, Clone, Deserialize)]
pub struct ListPartitionRouterModel {
    /// A list, or a template evaluating to one
    pub values: Value,
    /// Slice key
    pub cursor_field: String,
    /// Where the slice value goes
    #[serde(default)]
    pub request_option: Option<RequestOption>,
}

/// `DatetimeBasedCursor`
#[derive(Debug, Clone, Deserialize)]
pub struct DatetimeBasedCursorModel {
    /// Start bound: template string or `MinMaxDatetime`
    pub start_datetime: Value,
    /// End bound; defaults to now
    #[serde(default)]
    pub end_datetime: Option<Value>,
    /// Format of the bounds and of emitted slice values
    pub datetime_format: String,
    /// Window size as an ISO 8601 duration
    #[serde(default)]
    pub step: Option<String>,
    /// Smallest cursor increment
    #[serde(default)]
    pub cursor_granularity: Option<String>,
    /// Where the window start goes
    #[serde(default)]
    pub start_time_option: Option<RequestOption>,
    /// Where the window end goes
    #[serde(default)]
    pub end_time_option: Option<RequestOption>,
}

/// `MinMaxDatetime`
#[derive(Debug, Clone, Deserialize)]
pub struct MinMaxDatetimeModel {
    /// Datetime template
    pub datetime: String,
    /// Format override for this bound
    #[serde(default)]
    pub datetime_format: Option<String>,
}

// ============================================================================
// Selection
// ============================================================================

/// `RecordSelector`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordSelectorModel {
    /// The extractor component
    pub extractor: Value,
    /// The record filter component
    #[serde(default)]
    pub record_filter: Option<Value>,
}

/// `DpathExtractor`
#[derive(Debug, Clone, Deserialize)]
pub struct DpathExtractorModel {
    /// Path to the records
    #[serde(default)]
    pub field_path: Vec<String>,
}

/// `RecordFilter`
#[derive(Debug, Clone, Deserialize)]
pub struct RecordFilterModel {
    /// Condition template
    pub condition: String,
}

/// `AddFields`
#[derive(Debug, Clone, Deserialize)]
pub struct AddFieldsModel {
    /// Fields to add
    pub fields: Vec<AddedFieldModel>,
}

/// `AddedFieldDefinition`
#[derive(Debug, Clone, Deserialize)]
pub struct AddedFieldModel {
    /// Destination path
    pub path: Vec<String>,
    /// Value template
    pub value: Value,
}

/// `RemoveFields`
#[derive(Debug, Clone, Deserialize)]
pub struct RemoveFieldsModel {
    /// Paths to remove
    pub field_pointers: Vec<Vec<String>>,
}
