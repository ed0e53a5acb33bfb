//! Component factory
//!
//! Turns resolved manifest nodes into runtime components. Every node is
//! dispatched on its `type`; unknown types fail with
//! [`Error::UnsupportedComponent`].

use super::models::{
    AddFieldsModel, ApiKeyAuthenticatorModel, BasicHttpAuthenticatorModel,
    BearerAuthenticatorModel, CursorPaginationModel, DatetimeBasedCursorModel,
    DeclarativeStreamModel, DefaultPaginatorModel, DpathExtractorModel, HttpRequesterModel,
    ListPartitionRouterModel, MinMaxDatetimeModel, OffsetIncrementModel, PageIncrementModel,
    RecordFilterModel, RecordSelectorModel, RemoveFieldsModel, SimpleRetrieverModel,
};
use super::stream::DeclarativeStream;
use crate::auth::{AuthConfig, Authenticator, Location};
use crate::builder::TestReadLimits;
use crate::error::{Error, Result};
use crate::extractor::{
    AddFields, AddedField, Decoder, DpathExtractor, JsonDecoder, JsonlDecoder, RecordFilter,
    RecordSelector, RecordTransformation, RemoveFields,
};
use crate::http::{HttpClientConfig, HttpRequester, InjectInto};
use crate::manifest::{PARAMETERS_KEY, TYPE_KEY};
use crate::pagination::{
    CursorPagination, DefaultPaginator, NoPagination, OffsetIncrement, PageIncrement,
    PageTokenOption, PaginationStrategy, Paginator,
};
use crate::partition::{
    parse_datetime, parse_granularity, DatetimePartitionRouter, ListPartitionRouter,
    PartitionRouter, SinglePartitionRouter, Step,
};
use crate::retriever::{Retriever, SimpleRetriever, TestReadRetriever};
use crate::template::{evaluate, render, render_optional, value_to_string, TemplateContext};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

/// Builds streams from resolved components
#[derive(Debug, Clone)]
pub struct ComponentFactory {
    config: Value,
    limits: Option<TestReadLimits>,
    client_config: HttpClientConfig,
}

impl ComponentFactory {
    /// Create a factory rendering templates against `config`
    pub fn new(config: Value) -> Self {
        Self {
            config,
            limits: None,
            client_config: HttpClientConfig::default(),
        }
    }

    /// Cap every retriever built from now on
    #[must_use]
    pub fn with_limits(mut self, limits: TestReadLimits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set the HTTP client settings for requesters
    #[must_use]
    pub fn with_client_config(mut self, client_config: HttpClientConfig) -> Self {
        self.client_config = client_config;
        self
    }

    /// Limits applied to retrievers, if any
    pub fn limits(&self) -> Option<&TestReadLimits> {
        self.limits.as_ref()
    }

    /// Connector config templates see
    pub fn config(&self) -> &Value {
        &self.config
    }

    /// Template context for a component: the config plus its `$parameters`
    fn context(&self, node: &Value) -> TemplateContext {
        let mut ctx = TemplateContext::with_config(self.config.clone());
        if let Some(parameters) = node.get(PARAMETERS_KEY) {
            ctx.set_parameters(parameters.clone());
        }
        ctx
    }

    // ========================================================================
    // Stream / Retriever
    // ========================================================================

    /// Build a `DeclarativeStream`
    pub fn create_stream(&self, node: &Value) -> Result<DeclarativeStream> {
        expect_type(node, &["DeclarativeStream"])?;
        let model: DeclarativeStreamModel = model(node, "DeclarativeStream")?;

        let name = model
            .name
            .clone()
            .or_else(|| {
                model
                    .parameters
                    .get("name")
                    .and_then(Value::as_str)
                    .map(String::from)
            })
            .ok_or_else(|| Error::invalid_component("DeclarativeStream", "missing name"))?;

        let retriever = self.create_retriever(&model)?;
        debug!(stream = %name, "Built stream");
        Ok(DeclarativeStream::new(name, retriever).with_primary_key(model.primary_key))
    }

    fn create_retriever(&self, stream: &DeclarativeStreamModel) -> Result<Box<dyn Retriever>> {
        let node = &stream.retriever;
        match component_type(node)? {
            "SimpleRetriever" => {
                let retriever = self.create_simple_retriever(node, stream)?;
                let retriever: Box<dyn Retriever> = match self.limits {
                    Some(limits) => Box::new(TestReadRetriever::new(retriever, limits)),
                    None => Box::new(retriever),
                };
                Ok(retriever)
            }
            other => Err(Error::unsupported_component(other)),
        }
    }

    /// Build a `SimpleRetriever` for `stream`
    fn create_simple_retriever(
        &self,
        node: &Value,
        stream: &DeclarativeStreamModel,
    ) -> Result<SimpleRetriever> {
        let model: SimpleRetrieverModel = model(node, "SimpleRetriever")?;

        let requester = self.create_requester(&model.requester)?;
        let decoder: Box<dyn Decoder> = match model.decoder {
            Some(ref decoder) => self.create_decoder(decoder)?,
            None => Box::new(JsonDecoder),
        };
        let mut selector = self
            .create_record_selector(&model.record_selector)?
            .with_decoder(decoder);
        for transformation in &stream.transformations {
            selector = selector.with_transformation(self.create_transformation(transformation)?);
        }

        let mut retriever = SimpleRetriever::new(requester, selector);
        if let Some(ref paginator) = model.paginator {
            retriever = retriever.with_paginator(self.create_paginator(paginator)?);
        }

        let router = match (&model.partition_router, &stream.incremental_sync) {
            (Some(router), incremental) => {
                if incremental.is_some() {
                    warn!("Partition router and incremental_sync both set; slicing by the router");
                }
                Some(self.create_partition_router(router)?)
            }
            (None, Some(cursor)) => Some(self.create_datetime_router(cursor)?),
            (None, None) => None,
        };
        if let Some(router) = router {
            retriever = retriever.with_partition_router(router);
        }

        Ok(retriever)
    }

    // ========================================================================
    // Requester / Auth
    // ========================================================================

    /// Build an `HttpRequester`
    pub fn create_requester(&self, node: &Value) -> Result<HttpRequester> {
        expect_type(node, &["HttpRequester"])?;
        let model: HttpRequesterModel = model(node, "HttpRequester")?;

        let mut requester = HttpRequester::new(
            model.url_base,
            model.path,
            self.config.clone(),
            self.client_config.clone(),
        )?
        .with_method(model.http_method)
        .with_parameters(Value::Object(model.parameters))
        .with_request_parameters(template_map(model.request_parameters))
        .with_request_headers(template_map(model.request_headers));

        if let Some(body) = model.request_body_json {
            requester = requester.with_request_body_json(body);
        }
        if let Some(ref auth) = model.authenticator {
            requester = requester.with_authenticator(self.create_authenticator(auth)?);
        }
        Ok(requester)
    }

    /// Build an authenticator, rendering its secrets once
    pub fn create_authenticator(&self, node: &Value) -> Result<Authenticator> {
        let ctx = &self.context(node);
        let config = match component_type(node)? {
            "NoAuth" => AuthConfig::None,
            "BearerAuthenticator" => {
                let model: BearerAuthenticatorModel = model(node, "BearerAuthenticator")?;
                AuthConfig::Bearer {
                    token: interpolate(&model.api_token, ctx),
                }
            }
            "ApiKeyAuthenticator" => {
                let model: ApiKeyAuthenticatorModel = model(node, "ApiKeyAuthenticator")?;
                let (location, name) = match (model.inject_into, model.header) {
                    (Some(option), _) => {
                        let location = match option.inject_into {
                            InjectInto::Header => Location::Header,
                            InjectInto::RequestParameter => Location::Query,
                            other => {
                                return Err(Error::invalid_component(
                                    "ApiKeyAuthenticator",
                                    format!("cannot inject an API key into {other:?}"),
                                ))
                            }
                        };
                        (location, render_optional(&option.field_name, ctx))
                    }
                    (None, Some(header)) => (Location::Header, render_optional(&header, ctx)),
                    (None, None) => {
                        return Err(Error::invalid_component(
                            "ApiKeyAuthenticator",
                            "one of inject_into or header is required",
                        ))
                    }
                };
                AuthConfig::ApiKey {
                    location,
                    name,
                    value: interpolate(&model.api_token, ctx),
                }
            }
            "BasicHttpAuthenticator" => {
                let model: BasicHttpAuthenticatorModel = model(node, "BasicHttpAuthenticator")?;
                AuthConfig::Basic {
                    username: interpolate(&model.username, ctx),
                    password: interpolate(&model.password, ctx),
                }
            }
            other => return Err(Error::unsupported_component(other)),
        };
        Ok(Authenticator::new(config))
    }

    // ========================================================================
    // Pagination
    // ========================================================================

    /// Build a paginator
    pub fn create_paginator(&self, node: &Value) -> Result<Box<dyn Paginator>> {
        match component_type(node)? {
            "NoPagination" => Ok(Box::new(NoPagination)),
            "DefaultPaginator" => {
                let model: DefaultPaginatorModel = model(node, "DefaultPaginator")?;
                let strategy = self.create_strategy(&model.pagination_strategy)?;
                let mut paginator = DefaultPaginator::new(strategy);
                if let Some(option) = model.page_size_option {
                    paginator = paginator.with_page_size_option(option);
                }
                if let Some(ref option) = model.page_token_option {
                    let option = match component_type(option)? {
                        "RequestPath" => PageTokenOption::RequestPath,
                        "RequestOption" => {
                            PageTokenOption::RequestOption(self::model(option, "RequestOption")?)
                        }
                        other => return Err(Error::unsupported_component(other)),
                    };
                    paginator = paginator.with_page_token_option(option);
                }
                Ok(Box::new(paginator))
            }
            other => Err(Error::unsupported_component(other)),
        }
    }

    fn create_strategy(&self, node: &Value) -> Result<Box<dyn PaginationStrategy>> {
        let ctx = self.context(node);
        match component_type(node)? {
            "CursorPagination" => {
                let model: CursorPaginationModel = model(node, "CursorPagination")?;
                let mut strategy = CursorPagination::new(model.cursor_value);
                if let Some(condition) = model.stop_condition {
                    strategy = strategy.with_stop_condition(condition);
                }
                if let Some(size) = page_size(model.page_size.as_ref(), &ctx)? {
                    strategy = strategy.with_page_size(size);
                }
                Ok(Box::new(strategy))
            }
            "OffsetIncrement" => {
                let model: OffsetIncrementModel = model(node, "OffsetIncrement")?;
                let mut strategy = OffsetIncrement::new(page_size(model.page_size.as_ref(), &ctx)?);
                strategy.inject_on_first_request = model.inject_on_first_request;
                Ok(Box::new(strategy))
            }
            "PageIncrement" => {
                let model: PageIncrementModel = model(node, "PageIncrement")?;
                let mut strategy = PageIncrement::new(
                    page_size(model.page_size.as_ref(), &ctx)?,
                    model.start_from_page,
                );
                strategy.inject_on_first_request = model.inject_on_first_request;
                Ok(Box::new(strategy))
            }
            other => Err(Error::unsupported_component(other)),
        }
    }

    // ========================================================================
    // Partitioning
    // ========================================================================

    /// Build a partition router; a list may hold at most one router
    pub fn create_partition_router(&self, node: &Value) -> Result<Box<dyn PartitionRouter>> {
        if let Value::Array(routers) = node {
            return match routers.as_slice() {
                [] => Ok(Box::new(SinglePartitionRouter)),
                [router] => self.create_partition_router(router),
                _ => Err(Error::invalid_component(
                    "SimpleRetriever",
                    "only one partition router is supported",
                )),
            };
        }

        let ctx = self.context(node);
        match component_type(node)? {
            "ListPartitionRouter" => {
                let model: ListPartitionRouterModel = model(node, "ListPartitionRouter")?;
                let values = match model.values {
                    Value::Array(values) => values,
                    Value::String(ref template) => match evaluate(template, &ctx) {
                        Some(Value::Array(values)) => values,
                        _ => {
                            return Err(Error::invalid_component(
                                "ListPartitionRouter",
                                format!("values '{template}' did not evaluate to a list"),
                            ))
                        }
                    },
                    _ => {
                        return Err(Error::invalid_component(
                            "ListPartitionRouter",
                            "values must be a list or a template",
                        ))
                    }
                };

                let mut router =
                    ListPartitionRouter::new(values, render_optional(&model.cursor_field, &ctx));
                if let Some(option) = model.request_option {
                    router = router.with_request_option(option);
                }
                Ok(Box::new(router))
            }
            other => Err(Error::unsupported_component(other)),
        }
    }

    /// Build the window slicer of a `DatetimeBasedCursor`
    pub fn create_datetime_router(&self, node: &Value) -> Result<Box<dyn PartitionRouter>> {
        expect_type(node, &["DatetimeBasedCursor"])?;
        let model: DatetimeBasedCursorModel = model(node, "DatetimeBasedCursor")?;
        let ctx = self.context(node);

        let start = self.datetime_bound(&model.start_datetime, &model.datetime_format, &ctx)?;
        let end = match model.end_datetime {
            Some(ref end) => self.datetime_bound(end, &model.datetime_format, &ctx)?,
            None => chrono::Utc::now(),
        };

        let mut router = DatetimePartitionRouter::new(start, end, &model.datetime_format)
            .with_request_options(model.start_time_option, model.end_time_option);
        if let Some(ref step) = model.step {
            router = router.with_step(Step::parse(&render_optional(step, &ctx))?);
        }
        if let Some(ref granularity) = model.cursor_granularity {
            router = router.with_granularity(parse_granularity(granularity)?);
        }
        Ok(Box::new(router))
    }

    fn datetime_bound(
        &self,
        node: &Value,
        default_format: &str,
        ctx: &TemplateContext,
    ) -> Result<chrono::DateTime<chrono::Utc>> {
        let (template, format) = match node {
            Value::String(template) => (template.clone(), default_format.to_string()),
            Value::Object(_) => {
                let model: MinMaxDatetimeModel = model(node, "MinMaxDatetime")?;
                let format = model
                    .datetime_format
                    .filter(|f| !f.is_empty())
                    .unwrap_or_else(|| default_format.to_string());
                (model.datetime, format)
            }
            _ => {
                return Err(Error::invalid_component(
                    "DatetimeBasedCursor",
                    "datetime bounds must be strings or MinMaxDatetime",
                ))
            }
        };
        let rendered = render(&template, ctx)?;
        parse_datetime(&rendered, Some(&format))
    }

    // ========================================================================
    // Selection
    // ========================================================================

    /// Build a `RecordSelector` with a JSON decoder
    pub fn create_record_selector(&self, node: &Value) -> Result<RecordSelector> {
        expect_type(node, &["RecordSelector"])?;
        let model: RecordSelectorModel = model(node, "RecordSelector")?;

        let extractor = match component_type(&model.extractor)? {
            "DpathExtractor" => {
                let extractor: DpathExtractorModel = self::model(&model.extractor, "DpathExtractor")?;
                DpathExtractor::new(extractor.field_path)
            }
            other => return Err(Error::unsupported_component(other)),
        };

        let mut selector = RecordSelector::new(extractor);
        if let Some(ref filter) = model.record_filter {
            expect_type(filter, &["RecordFilter"])?;
            let filter: RecordFilterModel = self::model(filter, "RecordFilter")?;
            selector = selector.with_filter(RecordFilter::new(filter.condition));
        }
        Ok(selector)
    }

    /// Build a body decoder
    pub fn create_decoder(&self, node: &Value) -> Result<Box<dyn Decoder>> {
        match component_type(node)? {
            "JsonDecoder" => Ok(Box::new(JsonDecoder)),
            "JsonlDecoder" => Ok(Box::new(JsonlDecoder)),
            other => Err(Error::unsupported_component(other)),
        }
    }

    /// Build a record transformation
    pub fn create_transformation(&self, node: &Value) -> Result<Box<dyn RecordTransformation>> {
        match component_type(node)? {
            "AddFields" => {
                let model: AddFieldsModel = model(node, "AddFields")?;
                let fields = model
                    .fields
                    .into_iter()
                    .map(|field| AddedField {
                        path: field.path,
                        value: value_to_string(&field.value),
                    })
                    .collect();
                Ok(Box::new(AddFields::new(fields)))
            }
            "RemoveFields" => {
                let model: RemoveFieldsModel = model(node, "RemoveFields")?;
                Ok(Box::new(RemoveFields::new(model.field_pointers)))
            }
            other => Err(Error::unsupported_component(other)),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// The `type` of a component node
fn component_type(node: &Value) -> Result<&str> {
    node.get(TYPE_KEY)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::invalid_component("component", format!("missing type in {node}")))
}

/// Fail unless the node has one of `allowed` types
fn expect_type(node: &Value, allowed: &[&str]) -> Result<()> {
    let ty = component_type(node)?;
    if allowed.contains(&ty) {
        Ok(())
    } else {
        Err(Error::unsupported_component(ty))
    }
}

/// Deserialize a component model
fn model<T: DeserializeOwned>(node: &Value, component: &str) -> Result<T> {
    serde_json::from_value(node.clone())
        .map_err(|e| Error::invalid_component(component, e.to_string()))
}

/// Render a template; undefined variables render empty
fn interpolate(template: &str, ctx: &TemplateContext) -> String {
    render(template, ctx).unwrap_or_else(|e| {
        debug!(error = %e, "Template rendered empty");
        String::new()
    })
}

/// Request option templates keyed by name; non-string values are stringified
fn template_map(
    values: std::collections::BTreeMap<String, Value>,
) -> std::collections::BTreeMap<String, String> {
    values
        .into_iter()
        .map(|(key, value)| (key, value_to_string(&value)))
        .collect()
}

/// A page size given as a number or a template
fn page_size(value: Option<&Value>, ctx: &TemplateContext) -> Result<Option<u64>> {
    let invalid = |v: &dyn std::fmt::Display| {
        Error::invalid_component("pagination strategy", format!("invalid page_size {v}"))
    };
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid(n)),
        Some(Value::String(template)) => match evaluate(template, ctx) {
            Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| invalid(&n)),
            Some(Value::String(s)) => s.trim().parse().map(Some).map_err(|_| invalid(&s)),
            _ => Err(invalid(template)),
        },
        Some(other) => Err(invalid(other)),
    }
}
