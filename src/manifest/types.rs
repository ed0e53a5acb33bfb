//! Manifest keys and implicit component types

use serde_json::{Map, Value};

/// Key holding a component's inheritable parameters
pub const PARAMETERS_KEY: &str = "$parameters";

/// Key holding an explicit reference inside a mapping
pub const REF_KEY: &str = "$ref";

/// Key naming a component's type
pub const TYPE_KEY: &str = "type";

/// Type assigned to the manifest root
pub const ROOT_TYPE: &str = "DeclarativeSource";

/// Parameters inherited down the component tree
pub type Parameters = Map<String, Value>;

/// Implicit type of a field, keyed by `"{ParentType}.{field}"`.
///
/// Components may omit `type` when their parent's field only ever holds one
/// kind of component.
pub fn default_type(identifier: &str) -> Option<&'static str> {
    let ty = match identifier {
        "CompositeErrorHandler.error_handlers" => "DefaultErrorHandler",
        "CursorPagination.decoder" => "JsonDecoder",
        "DatetimeBasedCursor.end_datetime" | "DatetimeBasedCursor.start_datetime" => {
            "MinMaxDatetime"
        }
        "DatetimeBasedCursor.end_time_option" | "DatetimeBasedCursor.start_time_option" => {
            "RequestOption"
        }
        "DeclarativeSource.check" => "CheckStream",
        "DeclarativeSource.spec" => "Spec",
        "DeclarativeSource.streams" => "DeclarativeStream",
        "DeclarativeStream.retriever" => "SimpleRetriever",
        "DeclarativeStream.schema_loader" => "JsonFileSchemaLoader",
        "DefaultErrorHandler.response_filters" => "HttpResponseFilter",
        "DefaultPaginator.decoder" => "JsonDecoder",
        "DefaultPaginator.page_size_option" => "RequestOption",
        "DpathExtractor.decoder" => "JsonDecoder",
        "HttpRequester.error_handler" => "DefaultErrorHandler",
        "ListPartitionRouter.request_option" => "RequestOption",
        "ParentStreamConfig.request_option" => "RequestOption",
        "ParentStreamConfig.stream" => "DeclarativeStream",
        "RecordSelector.extractor" => "DpathExtractor",
        "RecordSelector.record_filter" => "RecordFilter",
        "SimpleRetriever.paginator" => "NoPagination",
        "SimpleRetriever.record_selector" => "RecordSelector",
        "SimpleRetriever.requester" => "HttpRequester",
        "SubstreamPartitionRouter.parent_stream_configs" => "ParentStreamConfig",
        "AddFields.fields" => "AddedFieldDefinition",
        _ => return None,
    };
    Some(ty)
}

/// Whether a `type` value marks a JSON schema rather than a component.
///
/// Schemas carry `type: object` (or a list containing it) and their
/// contents are never treated as components.
pub fn is_schema_type(ty: &Value) -> bool {
    match ty {
        Value::String(s) => s == "object",
        Value::Array(items) => items.iter().any(|v| v.as_str() == Some("object")),
        _ => false,
    }
}
