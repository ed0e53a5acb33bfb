//! Test-read report types

use crate::http::{RequestSnapshot, ResponseSnapshot};
use crate::protocol::LogMessage;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Everything a test read produced, grouped by slice and page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamRead {
    /// Log lines that are not request/response/slice markers
    pub logs: Vec<LogMessage>,
    /// Slices in read order
    pub slices: Vec<StreamReadSlice>,
    /// Whether any limit cut the read short
    pub test_read_limit_reached: bool,
    /// Schema of the records read, or `null` when none were
    pub inferred_schema: Option<Value>,
}

/// One slice of a test read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamReadSlice {
    /// Pages in fetch order
    pub pages: Vec<StreamReadPage>,
    /// The partition this slice covers
    pub slice_descriptor: Option<Value>,
    /// Last state checkpoint seen in the slice
    pub state: Option<Value>,
}

/// One request/response round trip
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamReadPage {
    /// Records selected from the response
    pub records: Vec<Value>,
    /// The request sent
    pub request: Option<HttpRequest>,
    /// The response received
    pub response: Option<HttpResponse>,
}

/// A request as shown in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpRequest {
    /// URL without the query string
    pub url: String,
    /// Query parameters, each with every value it was given
    pub parameters: Option<Map<String, Value>>,
    /// Body, parsed as JSON when possible
    pub body: Option<Value>,
    /// Request headers
    pub headers: Option<BTreeMap<String, String>>,
    /// Upper-case method
    pub http_method: String,
}

impl From<RequestSnapshot> for HttpRequest {
    fn from(snapshot: RequestSnapshot) -> Self {
        let (url, parameters) = match url::Url::parse(&snapshot.url) {
            Ok(mut parsed) => {
                let mut parameters = Map::new();
                for (key, value) in parsed.query_pairs() {
                    let entry = parameters
                        .entry(key.into_owned())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if let Value::Array(values) = entry {
                        values.push(Value::String(value.into_owned()));
                    }
                }
                parsed.set_query(None);
                (
                    parsed.to_string(),
                    (!parameters.is_empty()).then_some(parameters),
                )
            }
            Err(_) => (snapshot.url, None),
        };

        let body = snapshot.body.map(|body| {
            serde_json::from_str(&body).unwrap_or(Value::String(body))
        });

        Self {
            url,
            parameters,
            body,
            headers: (!snapshot.headers.is_empty()).then_some(snapshot.headers),
            http_method: snapshot.http_method,
        }
    }
}

/// A response as shown in the report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    /// Status code
    pub status: u16,
    /// Body text
    pub body: Option<String>,
    /// Response headers
    pub headers: Option<BTreeMap<String, String>>,
}

impl From<ResponseSnapshot> for HttpResponse {
    fn from(snapshot: ResponseSnapshot) -> Self {
        Self {
            status: snapshot.status,
            body: Some(snapshot.body),
            headers: (!snapshot.headers.is_empty()).then_some(snapshot.headers),
        }
    }
}
