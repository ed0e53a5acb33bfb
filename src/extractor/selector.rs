//! Record selection

use super::decoders::{Decoder, JsonDecoder};
use super::dpath::DpathExtractor;
use super::transformations::RecordTransformation;
use crate::error::Result;
use crate::template::{evaluate_condition, TemplateContext};
use serde_json::Value;

/// Keeps records for which a condition holds
#[derive(Debug, Clone)]
pub struct RecordFilter {
    condition: String,
}

impl RecordFilter {
    /// Filter on `condition`, e.g. `{{ record.active }}`
    pub fn new(condition: impl Into<String>) -> Self {
        Self {
            condition: condition.into(),
        }
    }

    /// Whether `record` passes
    pub fn matches(&self, record: &Value, ctx: &TemplateContext) -> Result<bool> {
        let mut ctx = ctx.clone();
        ctx.set_record(record.clone());
        evaluate_condition(&self.condition, &ctx)
    }
}

/// Decodes a response body into the records of a page
#[derive(Debug)]
pub struct RecordSelector {
    decoder: Box<dyn Decoder>,
    extractor: DpathExtractor,
    record_filter: Option<RecordFilter>,
    transformations: Vec<Box<dyn RecordTransformation>>,
}

impl RecordSelector {
    /// Create a selector using `extractor` on JSON bodies
    pub fn new(extractor: DpathExtractor) -> Self {
        Self {
            decoder: Box::new(JsonDecoder),
            extractor,
            record_filter: None,
            transformations: Vec::new(),
        }
    }

    /// Set the body decoder
    #[must_use]
    pub fn with_decoder(mut self, decoder: Box<dyn Decoder>) -> Self {
        self.decoder = decoder;
        self
    }

    /// Set the record filter
    #[must_use]
    pub fn with_filter(mut self, filter: RecordFilter) -> Self {
        self.record_filter = Some(filter);
        self
    }

    /// Append a transformation
    #[must_use]
    pub fn with_transformation(mut self, transformation: Box<dyn RecordTransformation>) -> Self {
        self.transformations.push(transformation);
        self
    }

    /// Decode a body without selecting records
    pub fn decode(&self, body: &str) -> Result<Value> {
        self.decoder.decode(body)
    }

    /// Select the records of an already decoded body
    pub fn select(&self, body: &Value, ctx: &TemplateContext) -> Result<Vec<Value>> {
        let mut records = Vec::new();
        for record in self.extractor.extract(body, ctx)? {
            if let Some(ref filter) = self.record_filter {
                if !filter.matches(&record, ctx)? {
                    continue;
                }
            }

            let mut record = record;
            for transformation in &self.transformations {
                transformation.transform(&mut record, ctx)?;
            }
            records.push(record);
        }
        Ok(records)
    }
}
