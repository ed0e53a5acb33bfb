//! Per-request options
//!
//! Components that contribute to an outgoing request (paginators, partition
//! routers, authenticators, the requester itself) all write into a
//! [`RequestConfig`], which the client turns into the actual request.

use crate::error::{Error, Result};
use crate::template::value_to_string;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::time::Duration;

/// Part of a request a value can be placed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectInto {
    /// Query string parameter
    RequestParameter,
    /// HTTP header
    Header,
    /// Field of a JSON body
    BodyJson,
    /// Field of a form-encoded body
    BodyData,
}

/// Where to place a single value on a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOption {
    /// Request part
    pub inject_into: InjectInto,
    /// Parameter, header or body field name
    pub field_name: String,
}

impl RequestOption {
    /// Create a request option
    pub fn new(inject_into: InjectInto, field_name: impl Into<String>) -> Self {
        Self {
            inject_into,
            field_name: field_name.into(),
        }
    }
}

/// Everything that varies between requests to the same endpoint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestConfig {
    /// Query parameters
    pub query: BTreeMap<String, String>,
    /// Request headers
    pub headers: BTreeMap<String, String>,
    /// JSON body
    pub body: Option<Value>,
    /// Form-encoded body, used when no JSON body is set
    pub form: BTreeMap<String, String>,
    /// Override timeout for this request
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    /// Create an empty request config
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query parameter
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a header
    #[must_use]
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    /// Set the JSON body
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Set timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Place `value` where `option` says
    pub fn inject(&mut self, option: &RequestOption, value: &Value) -> Result<()> {
        let key = option.field_name.clone();
        match option.inject_into {
            InjectInto::RequestParameter => {
                self.query.insert(key, value_to_string(value));
            }
            InjectInto::Header => {
                self.headers.insert(key, value_to_string(value));
            }
            InjectInto::BodyData => {
                self.form.insert(key, value_to_string(value));
            }
            InjectInto::BodyJson => {
                let body = self.body.get_or_insert_with(|| Value::Object(Map::new()));
                let Value::Object(fields) = body else {
                    return Err(Error::config(format!(
                        "cannot inject '{key}' into a non-object JSON body"
                    )));
                };
                fields.insert(key, value.clone());
            }
        }
        Ok(())
    }

    /// Merge `other` into this config; values from `other` win
    pub fn merge(&mut self, other: RequestConfig) -> Result<()> {
        self.query.extend(other.query);
        self.headers.extend(other.headers);
        self.form.extend(other.form);

        match (self.body.as_mut(), other.body) {
            (_, None) => {}
            (Some(Value::Object(ours)), Some(Value::Object(theirs))) => ours.extend(theirs),
            (None, Some(theirs)) => self.body = Some(theirs),
            (Some(_), Some(_)) => {
                return Err(Error::config("cannot merge non-object JSON request bodies"));
            }
        }

        if other.timeout.is_some() {
            self.timeout = other.timeout;
        }
        Ok(())
    }
}
