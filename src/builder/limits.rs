//! Test-read limits

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default cap on records across the whole read
pub const DEFAULT_MAX_RECORDS: usize = 100;

/// Default cap on slices per stream
pub const DEFAULT_MAX_SLICES: usize = 5;

/// Default cap on pages per slice
pub const DEFAULT_MAX_PAGES_PER_SLICE: usize = 10;

/// Config keys holding the limits, canonical name first
const LIMITS_KEYS: [&str; 2] = ["__test_read_config", "test_read_config"];

/// Caps applied to a test read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestReadLimits {
    /// Records kept across all slices and pages
    pub max_records: usize,
    /// Slices read per stream
    pub max_slices: usize,
    /// Pages fetched per slice
    pub max_pages_per_slice: usize,
}

impl Default for TestReadLimits {
    fn default() -> Self {
        Self {
            max_records: DEFAULT_MAX_RECORDS,
            max_slices: DEFAULT_MAX_SLICES,
            max_pages_per_slice: DEFAULT_MAX_PAGES_PER_SLICE,
        }
    }
}

impl TestReadLimits {
    /// Create limits, rejecting zeros
    pub fn new(max_records: usize, max_slices: usize, max_pages_per_slice: usize) -> Result<Self> {
        let limits = Self {
            max_records,
            max_slices,
            max_pages_per_slice,
        };
        limits.validate()?;
        Ok(limits)
    }

    /// Set the record cap
    #[must_use]
    pub fn with_max_records(mut self, max_records: usize) -> Self {
        self.max_records = max_records;
        self
    }

    /// Set the slice cap
    #[must_use]
    pub fn with_max_slices(mut self, max_slices: usize) -> Self {
        self.max_slices = max_slices;
        self
    }

    /// Set the page cap
    #[must_use]
    pub fn with_max_pages_per_slice(mut self, max_pages_per_slice: usize) -> Self {
        self.max_pages_per_slice = max_pages_per_slice;
        self
    }

    /// Check every limit is strictly positive
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("max_records", self.max_records),
            ("max_slices", self.max_slices),
            ("max_pages_per_slice", self.max_pages_per_slice),
        ] {
            if value == 0 {
                return Err(Error::invalid_value(field, "must be a positive integer"));
            }
        }
        Ok(())
    }
}

/// Read limits from a request config, filling defaults for absent fields
pub fn get_limits(config: &Value) -> Result<TestReadLimits> {
    let Some(section) = LIMITS_KEYS
        .iter()
        .find_map(|key| config.get(key))
        .filter(|v| !v.is_null())
    else {
        return Ok(TestReadLimits::default());
    };

    let Value::Object(section) = section else {
        return Err(Error::invalid_value(LIMITS_KEYS[0], "must be an object"));
    };

    let field = |name: &str, default: usize| -> Result<usize> {
        match section.get(name) {
            None | Some(Value::Null) => Ok(default),
            Some(value) => value
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .filter(|n| *n > 0)
                .ok_or_else(|| Error::invalid_value(name, "must be a positive integer")),
        }
    };

    TestReadLimits::new(
        field("max_records", DEFAULT_MAX_RECORDS)?,
        field("max_slices", DEFAULT_MAX_SLICES)?,
        field("max_pages_per_slice", DEFAULT_MAX_PAGES_PER_SLICE)?,
    )
}
