//! Snapshots of what went over the wire

use crate::error::Result;
use crate::protocol::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Log prefix marking a serialized request
pub const REQUEST_PREFIX: &str = "request:";

/// Log prefix marking a serialized response
pub const RESPONSE_PREFIX: &str = "response:";

/// The request as it was sent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSnapshot {
    /// Full URL including the query string
    pub url: String,
    /// Upper-case method name
    pub http_method: String,
    /// Request headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Body text, if any
    #[serde(default)]
    pub body: Option<String>,
}

impl RequestSnapshot {
    /// Capture a built request
    pub fn capture(request: &reqwest::Request) -> Self {
        Self {
            url: request.url().to_string(),
            http_method: request.method().as_str().to_string(),
            headers: header_map(request.headers()),
            body: request
                .body()
                .and_then(reqwest::Body::as_bytes)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned()),
        }
    }
}

/// The response as it was received
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Body text
    #[serde(default)]
    pub body: String,
}

impl ResponseSnapshot {
    /// Drain a response into a snapshot
    pub async fn capture(response: reqwest::Response) -> Result<Self> {
        let status = response.status().as_u16();
        let headers = header_map(response.headers());
        let body = response.text().await?;
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Whether the status is 2xx
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Headers as a JSON object, for templates
    pub fn headers_value(&self) -> Value {
        Value::Object(
            self.headers
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
        )
    }
}

/// One request and the response it got
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    /// What was sent
    pub request: RequestSnapshot,
    /// What came back
    pub response: ResponseSnapshot,
}

impl Exchange {
    /// Log message carrying the serialized request
    pub fn request_log(&self) -> Result<Message> {
        Ok(Message::info(format!(
            "{REQUEST_PREFIX}{}",
            serde_json::to_string(&self.request)?
        )))
    }

    /// Log message carrying the serialized response
    pub fn response_log(&self) -> Result<Message> {
        Ok(Message::info(format!(
            "{RESPONSE_PREFIX}{}",
            serde_json::to_string(&self.response)?
        )))
    }
}

fn header_map(headers: &reqwest::header::HeaderMap) -> BTreeMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect()
}
