//! The `HttpRequester` component
//!
//! Knows the endpoint (URL base, path, method) and the static request
//! options of a stream. Per-request options from paginators and partition
//! routers are merged in by the caller.

use super::client::{HttpClient, HttpClientConfig};
use super::exchange::Exchange;
use super::request::RequestConfig;
use crate::auth::Authenticator;
use crate::error::Result;
use crate::template::{render, render_optional, render_value, TemplateContext};
use crate::types::Method;
use serde_json::Value;
use std::collections::BTreeMap;

/// Sends requests to one endpoint
#[derive(Debug)]
pub struct HttpRequester {
    url_base: String,
    path: String,
    http_method: Method,
    request_parameters: BTreeMap<String, String>,
    request_headers: BTreeMap<String, String>,
    request_body_json: Option<Value>,
    config: Value,
    parameters: Value,
    client: HttpClient,
}

impl HttpRequester {
    /// Create a requester for `url_base` + `path`; both may be templates
    pub fn new(
        url_base: impl Into<String>,
        path: impl Into<String>,
        config: Value,
        client_config: HttpClientConfig,
    ) -> Result<Self> {
        Ok(Self {
            url_base: url_base.into(),
            path: path.into(),
            http_method: Method::GET,
            request_parameters: BTreeMap::new(),
            request_headers: BTreeMap::new(),
            request_body_json: None,
            config,
            parameters: Value::Object(serde_json::Map::new()),
            client: HttpClient::try_new(client_config)?,
        })
    }

    /// Set the HTTP method
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.http_method = method;
        self
    }

    /// Set templated query parameters
    #[must_use]
    pub fn with_request_parameters(mut self, params: BTreeMap<String, String>) -> Self {
        self.request_parameters = params;
        self
    }

    /// Set templated headers
    #[must_use]
    pub fn with_request_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.request_headers = headers;
        self
    }

    /// Set a templated JSON body
    #[must_use]
    pub fn with_request_body_json(mut self, body: Value) -> Self {
        self.request_body_json = Some(body);
        self
    }

    /// Set the component parameters visible to templates
    #[must_use]
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the authenticator
    #[must_use]
    pub fn with_authenticator(mut self, authenticator: Authenticator) -> Self {
        self.client.set_authenticator(authenticator);
        self
    }

    /// Set the retry budget
    pub fn set_max_retries(&mut self, retries: u32) -> &mut Self {
        self.client.set_max_retries(retries);
        self
    }

    /// Current retry budget
    pub fn max_retries(&self) -> u32 {
        self.client.max_retries()
    }

    /// HTTP method used for every request
    pub fn http_method(&self) -> Method {
        self.http_method
    }

    /// Template context holding the config and component parameters
    pub fn context(&self) -> TemplateContext {
        let mut ctx = TemplateContext::with_config(self.config.clone());
        ctx.set_parameters(self.parameters.clone());
        ctx
    }

    /// URL base rendered without request state
    pub fn url_base(&self) -> String {
        render_optional(&self.url_base, &self.context())
    }

    /// Path rendered without request state
    pub fn path(&self) -> String {
        render_optional(&self.path, &self.context())
    }

    /// Full URL for a request. `path_override` replaces the configured path;
    /// absolute overrides replace the whole URL.
    pub fn url(&self, ctx: &TemplateContext, path_override: Option<&str>) -> String {
        let base = render_optional(&self.url_base, ctx);
        match path_override {
            Some(p) if p.starts_with("http://") || p.starts_with("https://") => p.to_string(),
            Some(p) => join_url(&base, p),
            None => join_url(&base, &render_optional(&self.path, ctx)),
        }
    }

    /// Static request options rendered against `ctx`.
    ///
    /// Parameters and headers whose templates render empty or reference
    /// missing values are left out.
    pub fn request_config(&self, ctx: &TemplateContext) -> Result<RequestConfig> {
        let mut request = RequestConfig::new();
        for (key, template) in &self.request_parameters {
            if let Some(value) = render(template, ctx).ok().filter(|v| !v.is_empty()) {
                request.query.insert(key.clone(), value);
            }
        }
        for (key, template) in &self.request_headers {
            if let Some(value) = render(template, ctx).ok().filter(|v| !v.is_empty()) {
                request.headers.insert(key.clone(), value);
            }
        }
        if let Some(ref body) = self.request_body_json {
            request.body = Some(render_value(body, ctx)?);
        }
        Ok(request)
    }

    /// Send one request; `extra` options override the static ones
    pub async fn send(
        &self,
        ctx: &TemplateContext,
        path_override: Option<&str>,
        extra: RequestConfig,
    ) -> Result<Exchange> {
        let url = self.url(ctx, path_override);
        let mut request = self.request_config(ctx)?;
        request.merge(extra)?;
        self.client.send(self.http_method, &url, &request).await
    }
}

/// Join a URL base and a path with exactly one slash between them
pub fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
